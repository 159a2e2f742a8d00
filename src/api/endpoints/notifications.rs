//! Notification inbox and preference endpoints.

use axum::extract::State;
use axum::{Extension, Json};
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::extract::{ApiJson, ApiPath};
use crate::api::types::{ApiContext, UserContext};
use crate::db::repository;
use crate::models::{Notification, NotificationPreferences, NotificationPreferencesUpdate};

#[derive(Debug, Default, Serialize)]
pub struct MarkReadResponse {
    pub success: bool,
}

#[derive(Debug, Default, Serialize)]
pub struct MarkAllReadResponse {
    pub updated: usize,
}

/// `GET /api/notifications`: newest fifty.
pub async fn all(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<UserContext>,
) -> Result<Json<Vec<Notification>>, ApiError> {
    let notifications = ctx
        .core
        .with_db(|conn| repository::get_notifications(conn, user.user_id()))?;
    Ok(Json(notifications))
}

/// `POST /api/notifications/:id/read`
pub async fn mark_as_read(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<UserContext>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<MarkReadResponse>, ApiError> {
    let now = ctx.core.now();
    let success = ctx
        .core
        .with_db(|conn| repository::mark_notification_as_read(conn, user.user_id(), id, now))?;
    Ok(Json(MarkReadResponse { success }))
}

/// `POST /api/notifications/read-all`
pub async fn mark_all_as_read(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<UserContext>,
) -> Result<Json<MarkAllReadResponse>, ApiError> {
    let now = ctx.core.now();
    let updated = ctx
        .core
        .with_db(|conn| repository::mark_all_notifications_as_read(conn, user.user_id(), now))?;
    Ok(Json(MarkAllReadResponse { updated }))
}

/// `GET /api/notifications/preferences`
pub async fn preferences(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<UserContext>,
) -> Result<Json<NotificationPreferences>, ApiError> {
    let preferences = ctx
        .core
        .with_db(|conn| repository::get_notification_preferences(conn, user.user_id()))?;
    Ok(Json(preferences))
}

/// `POST /api/notifications/preferences`: omitted switches keep their value.
pub async fn update_preferences(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<UserContext>,
    ApiJson(update): ApiJson<NotificationPreferencesUpdate>,
) -> Result<Json<NotificationPreferences>, ApiError> {
    let preferences = ctx.core.with_db(|conn| {
        repository::update_notification_preferences(conn, user.user_id(), &update)
    })?;
    Ok(Json(preferences))
}
