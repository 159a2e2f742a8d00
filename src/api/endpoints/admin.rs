//! Admin endpoints: patient onboarding and lookup, scheduling, service
//! request workflow and notifications. Every schedule mutation refreshes
//! the patient's calendar feed.

use std::str::FromStr;

use axum::extract::State;
use axum::Json;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;

use crate::api::error::ApiError;
use crate::api::extract::{optional_text, required_text, ApiJson, ApiPath, ApiQuery};
use crate::api::types::ApiContext;
use crate::calendar::sync_after_change;
use crate::db::repository;
use crate::models::enums::{
    AppointmentStatus, NotificationType, PatientStatus, ScheduleChangeKind, ServiceRequestStatus,
    TaskType,
};
use crate::models::*;

const MAX_TEXT_LEN: usize = 255;
const MAX_BODY_LEN: usize = 2000;
const MAX_APPOINTMENT_MINUTES: i64 = 8 * 60;

// ═══════════════════════════════════════════════════════════
// Request bodies
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Default, Deserialize)]
pub struct PatientListQuery {
    pub search: Option<String>,
    /// A patient status, or `all` for no filter.
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreatePatientRequest {
    pub user_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub status: Option<PatientStatus>,
}

#[derive(Debug, Deserialize)]
pub struct CreateAppointmentRequest {
    pub patient_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub scheduled_at: DateTime<Utc>,
    pub duration: Option<i64>,
    pub doctor_name: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateAppointmentRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub duration: Option<i64>,
    pub status: Option<AppointmentStatus>,
}

#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    pub patient_id: i64,
    pub phase_id: Option<i64>,
    pub title: String,
    pub description: Option<String>,
    pub task_type: Option<TaskType>,
    pub duration: Option<String>,
    pub scheduled_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateServiceRequestStatus {
    pub status: ServiceRequestStatus,
    pub scheduled_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct SendNotificationRequest {
    pub user_id: i64,
    pub notification_type: Option<NotificationType>,
    pub title: String,
    pub message: String,
}

fn check_duration(duration: Option<i64>) -> Result<Option<i64>, ApiError> {
    match duration {
        Some(minutes) if !(1..=MAX_APPOINTMENT_MINUTES).contains(&minutes) => Err(
            ApiError::BadRequest(format!(
                "duration must be between 1 and {MAX_APPOINTMENT_MINUTES} minutes"
            )),
        ),
        other => Ok(other),
    }
}

pub fn parse_patient_status(raw: Option<&str>) -> Result<Option<PatientStatus>, ApiError> {
    match raw.map(str::trim) {
        None | Some("") | Some("all") => Ok(None),
        Some(name) => PatientStatus::from_str(name)
            .map(Some)
            .map_err(|_| ApiError::BadRequest(format!("Unknown patient status: {name}"))),
    }
}

// ═══════════════════════════════════════════════════════════
// Patients
// ═══════════════════════════════════════════════════════════

/// `GET /api/admin/stats`
pub async fn stats(State(ctx): State<ApiContext>) -> Result<Json<AdminStats>, ApiError> {
    let (now, today) = (ctx.core.now(), ctx.core.today());
    let stats = ctx
        .core
        .with_db(|conn| repository::admin_stats(conn, now, today))?;
    Ok(Json(stats))
}

/// `GET /api/admin/patients`
pub async fn patients(
    State(ctx): State<ApiContext>,
    ApiQuery(query): ApiQuery<PatientListQuery>,
) -> Result<Json<Vec<PatientSummary>>, ApiError> {
    let status = parse_patient_status(query.status.as_deref())?;
    let search = optional_text("search", query.search, MAX_TEXT_LEN)?;
    let patients = ctx
        .core
        .with_db(|conn| repository::list_patients(conn, search.as_deref(), status))?;
    Ok(Json(patients))
}

/// `POST /api/admin/patients`: `null` when the user does not exist.
pub async fn create_patient(
    State(ctx): State<ApiContext>,
    ApiJson(body): ApiJson<CreatePatientRequest>,
) -> Result<Json<Option<Patient>>, ApiError> {
    let new = NewPatient {
        user_id: body.user_id,
        first_name: required_text("first_name", &body.first_name, MAX_TEXT_LEN)?,
        last_name: required_text("last_name", &body.last_name, MAX_TEXT_LEN)?,
        date_of_birth: body.date_of_birth,
        phone: optional_text("phone", body.phone, MAX_TEXT_LEN)?,
        address: optional_text("address", body.address, MAX_TEXT_LEN)?,
        status: body.status,
    };
    let patient = ctx.core.with_db(|conn| repository::create_patient(conn, &new))?;
    if let Some(patient) = &patient {
        tracing::info!(patient_id = patient.id, user_id = patient.user_id, "Patient onboarded");
    }
    Ok(Json(patient))
}

/// `GET /api/admin/patients/:id`
pub async fn patient(
    State(ctx): State<ApiContext>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Option<PatientDetail>>, ApiError> {
    let detail = ctx.core.with_db(|conn| repository::get_patient_detail(conn, id))?;
    Ok(Json(detail))
}

/// `GET /api/admin/patients/:id/service-requests`
pub async fn patient_orders(
    State(ctx): State<ApiContext>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Vec<ServiceRequest>>, ApiError> {
    let requests = ctx
        .core
        .with_db(|conn| repository::get_patient_service_requests(conn, id))?;
    Ok(Json(requests))
}

/// `GET /api/admin/patients/:id/rehab-plans`
pub async fn patient_rehab_plans(
    State(ctx): State<ApiContext>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Vec<PlanWithPhases>>, ApiError> {
    let plans = ctx
        .core
        .with_db(|conn| repository::get_patient_rehab_plans(conn, id))?;
    Ok(Json(plans))
}

// ═══════════════════════════════════════════════════════════
// Scheduling
// ═══════════════════════════════════════════════════════════

/// `POST /api/admin/appointments`
pub async fn create_appointment(
    State(ctx): State<ApiContext>,
    ApiJson(body): ApiJson<CreateAppointmentRequest>,
) -> Result<Json<Option<Appointment>>, ApiError> {
    let new = NewAppointment {
        patient_id: body.patient_id,
        title: required_text("title", &body.title, MAX_TEXT_LEN)?,
        description: optional_text("description", body.description, MAX_BODY_LEN)?,
        scheduled_at: body.scheduled_at.naive_utc(),
        duration: check_duration(body.duration)?,
        doctor_name: optional_text("doctor_name", body.doctor_name, MAX_TEXT_LEN)?,
        location: optional_text("location", body.location, MAX_TEXT_LEN)?,
    };
    let now = ctx.core.now();
    let config = &ctx.core.config;
    let appointment = ctx.core.with_db(|conn| {
        let created = repository::create_appointment(conn, &new)?;
        if let Some(a) = &created {
            sync_after_change(
                conn,
                a.patient_id,
                ScheduleChangeKind::AppointmentCreated,
                a.id,
                config,
                now,
            );
        }
        Ok(created)
    })?;
    Ok(Json(appointment))
}

/// `POST /api/admin/appointments/:id`: `null` for an empty update or an
/// unknown id.
pub async fn update_appointment(
    State(ctx): State<ApiContext>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(body): ApiJson<UpdateAppointmentRequest>,
) -> Result<Json<Option<Appointment>>, ApiError> {
    let update = AppointmentUpdate {
        title: match body.title {
            Some(title) => Some(required_text("title", &title, MAX_TEXT_LEN)?),
            None => None,
        },
        description: optional_text("description", body.description, MAX_BODY_LEN)?,
        scheduled_at: body.scheduled_at.map(|at| at.naive_utc()),
        duration: check_duration(body.duration)?,
        status: body.status,
    };
    let now = ctx.core.now();
    let config = &ctx.core.config;
    let appointment = ctx.core.with_db(|conn| {
        let updated = repository::update_appointment(conn, id, &update)?;
        if let Some(a) = &updated {
            sync_after_change(
                conn,
                a.patient_id,
                ScheduleChangeKind::AppointmentUpdated,
                a.id,
                config,
                now,
            );
        }
        Ok(updated)
    })?;
    Ok(Json(appointment))
}

/// `POST /api/admin/tasks`
pub async fn create_task(
    State(ctx): State<ApiContext>,
    ApiJson(body): ApiJson<CreateTaskRequest>,
) -> Result<Json<Option<Task>>, ApiError> {
    let new = NewTask {
        patient_id: body.patient_id,
        phase_id: body.phase_id,
        title: required_text("title", &body.title, MAX_TEXT_LEN)?,
        description: optional_text("description", body.description, MAX_BODY_LEN)?,
        task_type: body.task_type,
        duration: optional_text("duration", body.duration, 64)?,
        scheduled_date: body.scheduled_date.map(|at| at.naive_utc()),
    };
    let now = ctx.core.now();
    let config = &ctx.core.config;
    let task = ctx.core.with_db(|conn| {
        let created = repository::create_task(conn, &new)?;
        if let Some(t) = &created {
            sync_after_change(
                conn,
                t.patient_id,
                ScheduleChangeKind::TaskCreated,
                t.id,
                config,
                now,
            );
        }
        Ok(created)
    })?;
    Ok(Json(task))
}

// ═══════════════════════════════════════════════════════════
// Service requests & notifications
// ═══════════════════════════════════════════════════════════

/// `POST /api/admin/service-requests/:id/status`: illegal transitions are 400.
pub async fn update_service_request_status(
    State(ctx): State<ApiContext>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(body): ApiJson<UpdateServiceRequestStatus>,
) -> Result<Json<Option<ServiceRequest>>, ApiError> {
    let scheduled_at = body.scheduled_at.map(|at| at.naive_utc());
    let request = ctx.core.with_db(|conn| {
        repository::update_service_request_status(conn, id, body.status, scheduled_at)
    })?;
    if let Some(request) = &request {
        tracing::info!(
            request_id = request.id,
            status = request.status.as_str(),
            "Service request status updated"
        );
    }
    Ok(Json(request))
}

/// `POST /api/admin/notifications`: `null` when the user does not exist.
pub async fn send_notification(
    State(ctx): State<ApiContext>,
    ApiJson(body): ApiJson<SendNotificationRequest>,
) -> Result<Json<Option<Notification>>, ApiError> {
    let title = required_text("title", &body.title, MAX_TEXT_LEN)?;
    let message = required_text("message", &body.message, MAX_BODY_LEN)?;
    let kind = body.notification_type.unwrap_or(NotificationType::System);
    let notification = ctx.core.with_db(|conn| {
        if repository::get_user_by_id(conn, body.user_id)?.is_none() {
            return Ok(None);
        }
        repository::create_notification(conn, body.user_id, kind, &title, &message).map(Some)
    })?;
    Ok(Json(notification))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_bounds() {
        assert_eq!(check_duration(None).unwrap(), None);
        assert_eq!(check_duration(Some(45)).unwrap(), Some(45));
        assert!(check_duration(Some(0)).is_err());
        assert!(check_duration(Some(9 * 60)).is_err());
    }

    #[test]
    fn patient_status_filter() {
        assert_eq!(parse_patient_status(Some("all")).unwrap(), None);
        assert_eq!(
            parse_patient_status(Some("pending")).unwrap(),
            Some(PatientStatus::Pending)
        );
        assert!(parse_patient_status(Some("archived")).is_err());
    }
}
