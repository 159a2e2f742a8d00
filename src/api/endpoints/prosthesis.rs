//! Implant record endpoints.

use axum::extract::State;
use axum::{Extension, Json};

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, UserContext};
use crate::db::repository;
use crate::models::{Prosthesis, ProsthesisDocument};

/// `GET /api/prosthesis`
pub async fn get(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<UserContext>,
) -> Result<Json<Option<Prosthesis>>, ApiError> {
    let prosthesis = ctx
        .core
        .with_db(|conn| repository::get_patient_prosthesis(conn, user.user_id()))?;
    Ok(Json(prosthesis))
}

/// `GET /api/prosthesis/documents`: empty when no implant is on record.
pub async fn documents(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<UserContext>,
) -> Result<Json<Vec<ProsthesisDocument>>, ApiError> {
    let prosthesis = ctx
        .core
        .with_db(|conn| repository::get_patient_prosthesis(conn, user.user_id()))?;
    Ok(Json(
        prosthesis
            .as_ref()
            .map(repository::prosthesis_documents)
            .unwrap_or_default(),
    ))
}
