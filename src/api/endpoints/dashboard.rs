//! Dashboard summary endpoint.

use axum::extract::State;
use axum::{Extension, Json};

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, UserContext};
use crate::dashboard::{get_dashboard_summary, DashboardSummary};

/// `GET /api/dashboard/summary`
pub async fn summary(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<UserContext>,
) -> Result<Json<DashboardSummary>, ApiError> {
    let now = ctx.core.now();
    let summary = ctx
        .core
        .with_db(|conn| get_dashboard_summary(conn, user.user_id(), now))?;
    Ok(Json(summary))
}
