//! Achievement endpoint.

use axum::extract::State;
use axum::{Extension, Json};

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, UserContext};
use crate::db::repository;
use crate::models::Achievement;

/// `GET /api/achievements`
pub async fn all(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<UserContext>,
) -> Result<Json<Vec<Achievement>>, ApiError> {
    let achievements = ctx
        .core
        .with_db(|conn| repository::get_achievements(conn, user.user_id()))?;
    Ok(Json(achievements))
}
