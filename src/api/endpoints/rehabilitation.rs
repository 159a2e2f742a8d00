//! Rehabilitation plan and daily task endpoints.

use axum::extract::State;
use axum::{Extension, Json};

use crate::api::error::ApiError;
use crate::api::extract::ApiPath;
use crate::api::types::{ApiContext, UserContext};
use crate::db::repository;
use crate::models::{RehabilitationPhase, RehabilitationPlan, Task};

/// `GET /api/rehabilitation/plan`
pub async fn plan(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<UserContext>,
) -> Result<Json<Option<RehabilitationPlan>>, ApiError> {
    let plan = ctx
        .core
        .with_db(|conn| repository::get_patient_rehab_plan(conn, user.user_id()))?;
    Ok(Json(plan))
}

/// `GET /api/rehabilitation/plans/:plan_id/phases`
pub async fn phases(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<UserContext>,
    ApiPath(plan_id): ApiPath<i64>,
) -> Result<Json<Vec<RehabilitationPhase>>, ApiError> {
    let phases = ctx
        .core
        .with_db(|conn| repository::get_rehab_phases(conn, user.user_id(), plan_id))?;
    Ok(Json(phases))
}

/// `GET /api/rehabilitation/tasks/today`
pub async fn todays_tasks(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<UserContext>,
) -> Result<Json<Vec<Task>>, ApiError> {
    let today = ctx.core.today();
    let tasks = ctx
        .core
        .with_db(|conn| repository::get_todays_tasks(conn, user.user_id(), today))?;
    Ok(Json(tasks))
}

/// `POST /api/rehabilitation/tasks/:task_id/complete`
pub async fn complete_task(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<UserContext>,
    ApiPath(task_id): ApiPath<i64>,
) -> Result<Json<Option<Task>>, ApiError> {
    let now = ctx.core.now();
    let task = ctx
        .core
        .with_db(|conn| repository::complete_task(conn, user.user_id(), task_id, now))?;
    if let Some(task) = &task {
        tracing::debug!(user_id = user.user_id(), task_id = task.id, "Task completed");
    }
    Ok(Json(task))
}
