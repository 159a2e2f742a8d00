//! Audit logging middleware.
//!
//! Logs every API request with method, path, response status and the
//! caller's user id. Runs innermost (after auth has injected UserContext).

use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;

use crate::api::types::UserContext;

pub async fn log_access(req: Request<axum::body::Body>, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let user_id = req.extensions().get::<UserContext>().map(UserContext::user_id);

    let response = next.run(req).await;

    tracing::info!(
        %method,
        path,
        status = response.status().as_u16(),
        user_id,
        "API access"
    );
    response
}
