use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::{now_utc, DatabaseError};
use crate::models::enums::AppointmentStatus;
use crate::models::*;

const APPOINTMENT_COLUMNS: &str = "id, patient_id, title, description, scheduled_at, duration,
     doctor_name, location, status, created_at, updated_at";

/// Upper bound of the dashboard's upcoming list.
pub const UPCOMING_APPOINTMENT_LIMIT: i64 = 5;

fn row_to_appointment(row: &Row<'_>) -> rusqlite::Result<Appointment> {
    Ok(Appointment {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        scheduled_at: row.get(4)?,
        duration: row.get(5)?,
        doctor_name: row.get(6)?,
        location: row.get(7)?,
        status: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

pub fn get_appointment(
    conn: &Connection,
    appointment_id: i64,
) -> Result<Option<Appointment>, DatabaseError> {
    let appointment = conn
        .query_row(
            &format!("SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE id = ?1"),
            params![appointment_id],
            row_to_appointment,
        )
        .optional()?;
    Ok(appointment)
}

/// An appointment only if it belongs to the caller's patient record.
pub fn get_user_appointment(
    conn: &Connection,
    user_id: i64,
    appointment_id: i64,
) -> Result<Option<Appointment>, DatabaseError> {
    let Some(patient) = super::get_patient_by_user_id(conn, user_id)? else {
        return Ok(None);
    };
    Ok(get_appointment(conn, appointment_id)?.filter(|a| a.patient_id == patient.id))
}

/// Next scheduled appointments at or after `now`, soonest first.
pub fn get_upcoming_appointments(
    conn: &Connection,
    user_id: i64,
    now: NaiveDateTime,
) -> Result<Vec<Appointment>, DatabaseError> {
    let Some(patient) = super::get_patient_by_user_id(conn, user_id)? else {
        return Ok(Vec::new());
    };
    let mut stmt = conn.prepare(&format!(
        "SELECT {APPOINTMENT_COLUMNS} FROM appointments
         WHERE patient_id = ?1 AND status = 'scheduled' AND scheduled_at >= ?2
         ORDER BY scheduled_at, id
         LIMIT ?3"
    ))?;
    let rows = stmt.query_map(
        params![patient.id, now, UPCOMING_APPOINTMENT_LIMIT],
        row_to_appointment,
    )?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

/// Full appointment history of the caller, latest first.
pub fn get_all_appointments(
    conn: &Connection,
    user_id: i64,
) -> Result<Vec<Appointment>, DatabaseError> {
    match super::get_patient_by_user_id(conn, user_id)? {
        Some(patient) => {
            let mut all = get_patient_appointments(conn, patient.id)?;
            all.reverse();
            Ok(all)
        }
        None => Ok(Vec::new()),
    }
}

/// Every appointment of a patient in chronological order, any status.
pub fn get_patient_appointments(
    conn: &Connection,
    patient_id: i64,
) -> Result<Vec<Appointment>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE patient_id = ?1
         ORDER BY scheduled_at, id"
    ))?;
    let rows = stmt.query_map(params![patient_id], row_to_appointment)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

/// Book an appointment. Returns `None` when the patient does not exist.
pub fn create_appointment(
    conn: &Connection,
    new: &NewAppointment,
) -> Result<Option<Appointment>, DatabaseError> {
    if super::get_patient_by_id(conn, new.patient_id)?.is_none() {
        return Ok(None);
    }
    let now = now_utc();
    conn.execute(
        "INSERT INTO appointments (patient_id, title, description, scheduled_at, duration,
                                   doctor_name, location, status, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)",
        params![
            new.patient_id,
            new.title,
            new.description,
            new.scheduled_at,
            new.duration.unwrap_or(DEFAULT_APPOINTMENT_MINUTES),
            new.doctor_name,
            new.location,
            AppointmentStatus::Scheduled,
            now,
        ],
    )?;
    get_appointment(conn, conn.last_insert_rowid())
}

/// Apply the supplied fields. Returns `None` when there is nothing to
/// change or the appointment does not exist.
///
/// Moving `scheduled_at` clears the appointment's reminder log so every
/// reminder window opens again for the new date.
pub fn update_appointment(
    conn: &Connection,
    appointment_id: i64,
    update: &AppointmentUpdate,
) -> Result<Option<Appointment>, DatabaseError> {
    if update.is_empty() {
        return Ok(None);
    }
    let tx = conn.unchecked_transaction()?;
    let Some(before) = get_appointment(&tx, appointment_id)? else {
        return Ok(None);
    };
    tx.execute(
        "UPDATE appointments SET
            title = COALESCE(?1, title),
            description = COALESCE(?2, description),
            scheduled_at = COALESCE(?3, scheduled_at),
            duration = COALESCE(?4, duration),
            status = COALESCE(?5, status),
            updated_at = ?6
         WHERE id = ?7",
        params![
            update.title,
            update.description,
            update.scheduled_at,
            update.duration,
            update.status,
            now_utc(),
            appointment_id,
        ],
    )?;
    if update.scheduled_at.is_some_and(|at| at != before.scheduled_at) {
        let cleared = super::clear_reminder_log(&tx, appointment_id)?;
        tracing::debug!(appointment_id, cleared, "Appointment moved, reminder log reset");
    }
    let updated = get_appointment(&tx, appointment_id)?;
    tx.commit()?;
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::fixtures::*;
    use crate::db::sqlite::open_memory_database;

    #[test]
    fn upcoming_is_future_scheduled_and_capped() {
        let conn = open_memory_database().unwrap();
        let (user_id, patient_id) = seed_patient(&conn, "u-1");
        let now = dt("2026-03-10 12:00:00");

        seed_appointment(&conn, patient_id, "past", "2026-03-09 12:00:00");
        let cancelled = seed_appointment(&conn, patient_id, "cancelled", "2026-03-11 09:00:00");
        conn.execute(
            "UPDATE appointments SET status = 'cancelled' WHERE id = ?1",
            params![cancelled],
        )
        .unwrap();
        for day in 11..=17 {
            seed_appointment(&conn, patient_id, &format!("d{day}"), &format!("2026-03-{day} 10:00:00"));
        }
        seed_appointment(&conn, patient_id, "boundary", "2026-03-10 12:00:00");

        let upcoming = get_upcoming_appointments(&conn, user_id, now).unwrap();
        assert_eq!(upcoming.len(), 5);
        assert_eq!(upcoming[0].title, "boundary");
        assert!(upcoming.iter().all(|a| a.status == AppointmentStatus::Scheduled));
        assert!(upcoming.windows(2).all(|w| w[0].scheduled_at <= w[1].scheduled_at));
    }

    #[test]
    fn history_is_latest_first() {
        let conn = open_memory_database().unwrap();
        let (user_id, patient_id) = seed_patient(&conn, "u-1");
        seed_appointment(&conn, patient_id, "first", "2025-01-01 09:00:00");
        seed_appointment(&conn, patient_id, "second", "2025-06-01 09:00:00");

        let all = get_all_appointments(&conn, user_id).unwrap();
        assert_eq!(all[0].title, "second");
        assert_eq!(all[1].title, "first");
    }

    #[test]
    fn create_defaults_duration_and_status() {
        let conn = open_memory_database().unwrap();
        let (_, patient_id) = seed_patient(&conn, "u-1");
        let new = NewAppointment {
            patient_id,
            title: "Follow-up".into(),
            description: None,
            scheduled_at: dt("2026-04-01 09:30:00"),
            duration: None,
            doctor_name: Some("Dr. Hassan".into()),
            location: None,
        };
        let appointment = create_appointment(&conn, &new).unwrap().unwrap();
        assert_eq!(appointment.duration, DEFAULT_APPOINTMENT_MINUTES);
        assert_eq!(appointment.status, AppointmentStatus::Scheduled);
        assert_eq!(appointment.ends_at(), dt("2026-04-01 10:30:00"));

        let missing = NewAppointment { patient_id: 404, ..new };
        assert!(create_appointment(&conn, &missing).unwrap().is_none());
    }

    #[test]
    fn update_applies_only_given_fields() {
        let conn = open_memory_database().unwrap();
        let (_, patient_id) = seed_patient(&conn, "u-1");
        let id = seed_appointment(&conn, patient_id, "Check", "2026-04-01 09:00:00");

        assert!(update_appointment(&conn, id, &AppointmentUpdate::default())
            .unwrap()
            .is_none());

        let update = AppointmentUpdate {
            status: Some(AppointmentStatus::Cancelled),
            ..Default::default()
        };
        let updated = update_appointment(&conn, id, &update).unwrap().unwrap();
        assert_eq!(updated.status, AppointmentStatus::Cancelled);
        assert_eq!(updated.title, "Check");

        assert!(update_appointment(&conn, 999, &update).unwrap().is_none());
    }

    #[test]
    fn foreign_appointment_is_hidden() {
        let conn = open_memory_database().unwrap();
        let (owner_user, owner) = seed_patient(&conn, "u-1");
        let (intruder, _) = seed_patient(&conn, "u-2");
        let id = seed_appointment(&conn, owner, "Check", "2026-04-01 09:00:00");

        assert!(get_user_appointment(&conn, owner_user, id).unwrap().is_some());
        assert!(get_user_appointment(&conn, intruder, id).unwrap().is_none());
    }
}
