//! Service request endpoints (adjustments, check-ups, repairs).

use axum::extract::State;
use axum::{Extension, Json};
use serde::Deserialize;

use crate::api::error::ApiError;
use crate::api::extract::{required_text, ApiJson};
use crate::api::types::{ApiContext, UserContext};
use crate::db::repository;
use crate::models::enums::ServiceRequestType;
use crate::models::ServiceRequest;

pub const MAX_DESCRIPTION_LEN: usize = 2000;

#[derive(Debug, Deserialize)]
pub struct CreateServiceRequest {
    pub request_type: ServiceRequestType,
    pub description: String,
}

/// `GET /api/service/requests`
pub async fn requests(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<UserContext>,
) -> Result<Json<Vec<ServiceRequest>>, ApiError> {
    let requests = ctx
        .core
        .with_db(|conn| repository::get_service_requests(conn, user.user_id()))?;
    Ok(Json(requests))
}

/// `POST /api/service/requests`: always created as `pending`.
pub async fn create_request(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<UserContext>,
    ApiJson(body): ApiJson<CreateServiceRequest>,
) -> Result<Json<Option<ServiceRequest>>, ApiError> {
    let description = required_text("description", &body.description, MAX_DESCRIPTION_LEN)?;
    let request = ctx.core.with_db(|conn| {
        repository::create_service_request(conn, user.user_id(), body.request_type, &description)
    })?;
    if let Some(request) = &request {
        tracing::info!(
            user_id = user.user_id(),
            request_id = request.id,
            request_type = request.request_type.as_str(),
            "Service request created"
        );
    }
    Ok(Json(request))
}
