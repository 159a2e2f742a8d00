//! Patient profile endpoints.

use axum::extract::State;
use axum::{Extension, Json};

use crate::api::error::ApiError;
use crate::api::extract::{optional_text, ApiJson};
use crate::api::types::{ApiContext, UserContext};
use crate::db::repository;
use crate::models::{Patient, PatientProfileUpdate};

const MAX_FIELD_LEN: usize = 255;

/// `GET /api/patient/profile`
pub async fn get_profile(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<UserContext>,
) -> Result<Json<Option<Patient>>, ApiError> {
    let patient = ctx
        .core
        .with_db(|conn| repository::get_patient_by_user_id(conn, user.user_id()))?;
    Ok(Json(patient))
}

/// `POST /api/patient/profile`: contact fields only; omitted fields stay.
pub async fn update_profile(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<UserContext>,
    ApiJson(body): ApiJson<PatientProfileUpdate>,
) -> Result<Json<Option<Patient>>, ApiError> {
    let update = PatientProfileUpdate {
        phone: optional_text("phone", body.phone, MAX_FIELD_LEN)?,
        address: optional_text("address", body.address, MAX_FIELD_LEN)?,
        emergency_contact_name: optional_text(
            "emergency_contact_name",
            body.emergency_contact_name,
            MAX_FIELD_LEN,
        )?,
        emergency_contact_phone: optional_text(
            "emergency_contact_phone",
            body.emergency_contact_phone,
            MAX_FIELD_LEN,
        )?,
    };
    let patient = ctx
        .core
        .with_db(|conn| repository::update_patient_profile(conn, user.user_id(), &update))?;
    Ok(Json(patient))
}
