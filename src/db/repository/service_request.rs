use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::{now_utc, DatabaseError};
use crate::models::enums::{ServiceRequestStatus, ServiceRequestType};
use crate::models::*;

const REQUEST_COLUMNS: &str =
    "id, patient_id, request_type, description, status, scheduled_at, created_at, updated_at";

fn row_to_request(row: &Row<'_>) -> rusqlite::Result<ServiceRequest> {
    Ok(ServiceRequest {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        request_type: row.get(2)?,
        description: row.get(3)?,
        status: row.get(4)?,
        scheduled_at: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

pub fn get_service_request(
    conn: &Connection,
    request_id: i64,
) -> Result<Option<ServiceRequest>, DatabaseError> {
    let request = conn
        .query_row(
            &format!("SELECT {REQUEST_COLUMNS} FROM service_requests WHERE id = ?1"),
            params![request_id],
            row_to_request,
        )
        .optional()?;
    Ok(request)
}

/// Requests of one patient, newest first.
pub fn get_patient_service_requests(
    conn: &Connection,
    patient_id: i64,
) -> Result<Vec<ServiceRequest>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {REQUEST_COLUMNS} FROM service_requests WHERE patient_id = ?1
         ORDER BY created_at DESC, id DESC"
    ))?;
    let rows = stmt.query_map(params![patient_id], row_to_request)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

/// The caller's requests, newest first.
pub fn get_service_requests(
    conn: &Connection,
    user_id: i64,
) -> Result<Vec<ServiceRequest>, DatabaseError> {
    match super::get_patient_by_user_id(conn, user_id)? {
        Some(patient) => get_patient_service_requests(conn, patient.id),
        None => Ok(Vec::new()),
    }
}

/// File a new request for the caller. Always starts out `pending`.
pub fn create_service_request(
    conn: &Connection,
    user_id: i64,
    request_type: ServiceRequestType,
    description: &str,
) -> Result<Option<ServiceRequest>, DatabaseError> {
    let Some(patient) = super::get_patient_by_user_id(conn, user_id)? else {
        return Ok(None);
    };
    let now = now_utc();
    conn.execute(
        "INSERT INTO service_requests (patient_id, request_type, description, status,
                                       created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
        params![
            patient.id,
            request_type,
            description,
            ServiceRequestStatus::Pending,
            now
        ],
    )?;
    get_service_request(conn, conn.last_insert_rowid())
}

/// Move a request along its lifecycle. Illegal transitions are rejected;
/// setting the current status again is a no-op.
pub fn update_service_request_status(
    conn: &Connection,
    request_id: i64,
    status: ServiceRequestStatus,
    scheduled_at: Option<NaiveDateTime>,
) -> Result<Option<ServiceRequest>, DatabaseError> {
    let Some(current) = get_service_request(conn, request_id)? else {
        return Ok(None);
    };
    if current.status == status && scheduled_at.is_none() {
        return Ok(Some(current));
    }
    if current.status != status && !current.status.can_transition_to(status) {
        return Err(DatabaseError::ConstraintViolation(format!(
            "service request cannot move from {} to {}",
            current.status, status
        )));
    }

    conn.execute(
        "UPDATE service_requests SET status = ?1, scheduled_at = COALESCE(?2, scheduled_at),
                updated_at = ?3
         WHERE id = ?4",
        params![status, scheduled_at, now_utc(), request_id],
    )?;
    get_service_request(conn, request_id)
}
