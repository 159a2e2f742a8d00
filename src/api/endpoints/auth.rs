//! Session endpoints.
//!
//! `POST /api/auth/login` is called by the identity bridge after the
//! external OAuth round-trip, so it trusts the identity it is given only
//! when the request carries the shared bridge secret.

use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderValue};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::extract::{optional_text, required_text, ApiJson};
use crate::api::middleware::auth::session_token;
use crate::api::types::{hash_token, ApiContext, UserContext, SESSION_COOKIE};
use crate::db::repository;
use crate::models::enums::Role;
use crate::models::{User, UserUpsert};

pub const BRIDGE_SECRET_HEADER: &str = "X-Auth-Bridge-Secret";

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub open_id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub login_method: Option<String>,
    pub role: Option<Role>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub success: bool,
}

/// `GET /api/auth/me`: the signed-in user, or `null`.
pub async fn me(user: Option<Extension<UserContext>>) -> Json<Option<User>> {
    Json(user.map(|Extension(ctx)| ctx.user))
}

/// `POST /api/auth/login`
pub async fn login(
    State(ctx): State<ApiContext>,
    headers: HeaderMap,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<Response, ApiError> {
    verify_bridge_secret(&ctx, &headers)?;

    let upsert = UserUpsert {
        open_id: required_text("open_id", &req.open_id, 128)?,
        name: optional_text("name", req.name, 200)?,
        email: optional_text("email", req.email, 320)?,
        login_method: optional_text("login_method", req.login_method, 64)?,
        role: req.role,
        last_signed_in: Some(ctx.core.now()),
    };
    let owner = ctx.core.config.owner_open_id.as_deref();
    let user = ctx
        .core
        .require_db(|conn| repository::upsert_user(conn, &upsert, owner))?;

    let token = ctx.sessions()?.create(user.id);
    tracing::info!(user_id = user.id, role = user.role.as_str(), "User signed in");

    let max_age = ctx.sessions()?.ttl().as_secs();
    let cookie = format!(
        "{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age}"
    );
    let mut response = Json(LoginResponse { token, user }).into_response();
    set_cookie(&mut response, &cookie)?;
    Ok(response)
}

/// `POST /api/auth/logout`: drops the session (if any) and clears the cookie.
pub async fn logout(
    State(ctx): State<ApiContext>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    if let Some(token) = session_token(&headers) {
        if ctx.sessions()?.revoke(&token) {
            tracing::info!("User signed out");
        }
    }
    let cookie = format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0");
    let mut response = Json(LogoutResponse { success: true }).into_response();
    set_cookie(&mut response, &cookie)?;
    Ok(response)
}

fn verify_bridge_secret(ctx: &ApiContext, headers: &HeaderMap) -> Result<(), ApiError> {
    let Some(expected) = ctx.core.config.auth_bridge_secret.as_deref() else {
        tracing::warn!("Login attempted but AUTH_BRIDGE_SECRET is not configured");
        return Err(ApiError::Unauthorized);
    };
    let presented = headers
        .get(BRIDGE_SECRET_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(ApiError::Unauthorized)?;
    // Digests are compared so both sides have the same length.
    if hash_token(presented) != hash_token(expected) {
        tracing::warn!("Login refused: bridge secret mismatch");
        return Err(ApiError::Unauthorized);
    }
    Ok(())
}

fn set_cookie(response: &mut Response, cookie: &str) -> Result<(), ApiError> {
    let value = HeaderValue::from_str(cookie)
        .map_err(|e| ApiError::Internal(format!("invalid cookie header: {e}")))?;
    response.headers_mut().insert(header::SET_COOKIE, value);
    Ok(())
}
