//! Calendar endpoints: subscription link, sync status, single-appointment
//! export and the public ICS feed.

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::extract::ApiPath;
use crate::api::types::{ApiContext, UserContext};
use crate::calendar::{export, subscription, sync, CalendarSubscription, CalendarSyncStatus};
use crate::db::repository;

const ICS_CONTENT_TYPE: &str = "text/calendar; charset=utf-8";

#[derive(Debug, Serialize)]
pub struct GoogleLinkResponse {
    pub url: String,
}

/// `GET /api/calendar/subscription`: `null` when no patient is linked.
pub async fn get_subscription(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<UserContext>,
) -> Result<Json<Option<CalendarSubscription>>, ApiError> {
    let patient = ctx
        .core
        .with_db(|conn| repository::get_patient_by_user_id(conn, user.user_id()))?;
    let app_url = &ctx.core.config.app_url;
    Ok(Json(patient.map(|p| {
        subscription::subscription_for(app_url, user.user_id(), p.id)
    })))
}

/// `GET /api/calendar/status`
pub async fn sync_status(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<UserContext>,
) -> Result<Json<CalendarSyncStatus>, ApiError> {
    let status = ctx.core.with_db(|conn| {
        match repository::get_patient_by_user_id(conn, user.user_id())? {
            Some(patient) => sync::sync_status(conn, patient.id),
            None => Ok(CalendarSyncStatus::default()),
        }
    })?;
    Ok(Json(status))
}

/// `GET /api/calendar/appointments/:id/ics`: the appointment as an
/// `.ics` attachment, or JSON `null` when it is not the caller's.
pub async fn export_appointment(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<UserContext>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Response, ApiError> {
    let appointment = ctx
        .core
        .with_db(|conn| repository::get_user_appointment(conn, user.user_id(), id))?;
    let Some(appointment) = appointment else {
        return Ok(Json(None::<()>).into_response());
    };

    let body = export::appointment_ics(&appointment, &ctx.core.config, ctx.core.now());
    let disposition = format!(
        "attachment; filename=\"{}\"",
        export::appointment_filename(&appointment)
    );
    Ok((
        [
            (header::CONTENT_TYPE, ICS_CONTENT_TYPE.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}

/// `GET /api/calendar/appointments/:id/google`
pub async fn google_link(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<UserContext>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Option<GoogleLinkResponse>>, ApiError> {
    let appointment = ctx
        .core
        .with_db(|conn| repository::get_user_appointment(conn, user.user_id(), id))?;
    Ok(Json(appointment.map(|a| GoogleLinkResponse {
        url: export::google_calendar_url(&a, &ctx.core.config),
    })))
}

/// `GET /calendar/feed/:token`: public subscription feed.
///
/// Unknown, malformed or mismatched tokens get a plain 404.
pub async fn feed(
    State(ctx): State<ApiContext>,
    axum::extract::Path(token): axum::extract::Path<String>,
) -> Result<Response, ApiError> {
    let now = ctx.core.now();
    let config = &ctx.core.config;
    let feed = ctx.core.with_db(|conn| {
        match subscription::resolve_feed_owner(conn, &token)? {
            Some(patient_id) => sync::ensure_feed(conn, patient_id, config, now).map(Some),
            None => Ok(None),
        }
    })?;

    let Some(feed) = feed else {
        tracing::debug!("Calendar feed requested with unknown token");
        return Ok((StatusCode::NOT_FOUND, "Calendar not found").into_response());
    };
    Ok((
        [
            (header::CONTENT_TYPE, ICS_CONTENT_TYPE),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        feed,
    )
        .into_response())
}
