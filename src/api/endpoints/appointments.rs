//! Patient appointment endpoints.

use axum::extract::State;
use axum::{Extension, Json};

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, UserContext};
use crate::db::repository;
use crate::models::Appointment;

/// `GET /api/appointments/upcoming`: next five scheduled.
pub async fn upcoming(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<UserContext>,
) -> Result<Json<Vec<Appointment>>, ApiError> {
    let now = ctx.core.now();
    let appointments = ctx
        .core
        .with_db(|conn| repository::get_upcoming_appointments(conn, user.user_id(), now))?;
    Ok(Json(appointments))
}

/// `GET /api/appointments`: full history, latest first.
pub async fn all(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<UserContext>,
) -> Result<Json<Vec<Appointment>>, ApiError> {
    let appointments = ctx
        .core
        .with_db(|conn| repository::get_all_appointments(conn, user.user_id()))?;
    Ok(Json(appointments))
}
