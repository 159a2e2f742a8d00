//! Session authentication middleware.
//!
//! Tokens are read from `Authorization: Bearer <token>` or the
//! `portal_session` cookie. `identify` resolves them into a
//! `UserContext`; the gates reject requests that lack one (401) or whose
//! user is not an admin (403).

use axum::http::{header, HeaderMap, HeaderValue, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, UserContext, SESSION_COOKIE};
use crate::db::repository;
use crate::models::User;

/// Session token from the bearer header, falling back to the cookie.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

/// Stored user behind the request's session, if any.
pub fn resolve_user(ctx: &ApiContext, headers: &HeaderMap) -> Result<Option<User>, ApiError> {
    let Some(token) = session_token(headers) else {
        return Ok(None);
    };
    let Some(user_id) = ctx.sessions()?.resolve(&token) else {
        return Ok(None);
    };
    Ok(ctx
        .core
        .with_db(|conn| repository::get_user_by_id(conn, user_id))?)
}

fn api_context(req: &Request<axum::body::Body>) -> Result<ApiContext, ApiError> {
    req.extensions()
        .get::<ApiContext>()
        .cloned()
        .ok_or(ApiError::Internal("missing API context".into()))
}

/// Attach `UserContext` when the request carries a live session.
/// Never rejects; used on public routes.
pub async fn identify(mut req: Request<axum::body::Body>, next: Next) -> Response {
    let resolved = api_context(&req).and_then(|ctx| resolve_user(&ctx, req.headers()));
    match resolved {
        Ok(Some(user)) => {
            req.extensions_mut().insert(UserContext { user });
        }
        Ok(None) => {}
        Err(err) => return err.into_response(),
    }
    next.run(req).await
}

/// Require an authenticated user.
///
/// Accesses `ApiContext` from request extensions (injected by Extension layer).
/// On success: injects `UserContext` and marks the response `no-store`.
pub async fn require_auth(req: Request<axum::body::Body>, next: Next) -> Response {
    match gate(req, next, false).await {
        Ok(resp) => resp,
        Err(err) => err.into_response(),
    }
}

/// Require an authenticated user with role `admin`.
pub async fn require_admin(req: Request<axum::body::Body>, next: Next) -> Response {
    match gate(req, next, true).await {
        Ok(resp) => resp,
        Err(err) => err.into_response(),
    }
}

async fn gate(
    mut req: Request<axum::body::Body>,
    next: Next,
    admin_only: bool,
) -> Result<Response, ApiError> {
    let ctx = api_context(&req)?;
    let user = resolve_user(&ctx, req.headers())?.ok_or(ApiError::Unauthorized)?;
    if admin_only && !user.is_admin() {
        tracing::warn!(user_id = user.id, path = %req.uri().path(), "Admin route refused");
        return Err(ApiError::Forbidden);
    }

    req.extensions_mut().insert(UserContext { user });

    let mut response = next.run(req).await;
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(header::HeaderName, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(name.clone(), HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn bearer_token_is_preferred() {
        let h = headers(&[
            (header::AUTHORIZATION, "Bearer abc"),
            (header::COOKIE, "portal_session=xyz"),
        ]);
        assert_eq!(session_token(&h).as_deref(), Some("abc"));
    }

    #[test]
    fn cookie_token_among_others() {
        let h = headers(&[(header::COOKIE, "theme=dark; portal_session=xyz; lang=ar")]);
        assert_eq!(session_token(&h).as_deref(), Some("xyz"));
    }

    #[test]
    fn missing_or_empty_tokens() {
        assert_eq!(session_token(&HeaderMap::new()), None);
        let h = headers(&[
            (header::AUTHORIZATION, "Bearer "),
            (header::COOKIE, "portal_session="),
        ]);
        assert_eq!(session_token(&h), None);
        let h = headers(&[(header::AUTHORIZATION, "Basic dXNlcjpwYXNz")]);
        assert_eq!(session_token(&h), None);
    }
}
