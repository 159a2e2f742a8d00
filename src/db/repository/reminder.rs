use chrono::NaiveDateTime;
use rusqlite::{params, Connection};

use crate::db::DatabaseError;
use crate::models::*;

/// A future appointment together with the user to remind and whether
/// that user wants reminders.
#[derive(Debug, Clone)]
pub struct ReminderCandidate {
    pub appointment: Appointment,
    pub user_id: i64,
    pub reminders_enabled: bool,
}

/// Scheduled appointments starting in `(now, horizon]`.
pub fn get_reminder_candidates(
    conn: &Connection,
    now: NaiveDateTime,
    horizon: NaiveDateTime,
) -> Result<Vec<ReminderCandidate>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT a.id, a.patient_id, a.title, a.description, a.scheduled_at, a.duration,
                a.doctor_name, a.location, a.status, a.created_at, a.updated_at,
                p.user_id, COALESCE(np.reminders, 1)
         FROM appointments a
         JOIN patients p ON p.id = a.patient_id
         LEFT JOIN notification_preferences np ON np.user_id = p.user_id
         WHERE a.status = 'scheduled' AND a.scheduled_at > ?1 AND a.scheduled_at <= ?2
         ORDER BY a.scheduled_at, a.id",
    )?;
    let rows = stmt.query_map(params![now, horizon], |row| {
        Ok(ReminderCandidate {
            appointment: Appointment {
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
            },
            user_id: row.get(11)?,
            reminders_enabled: row.get(12)?,
        })
    })?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

pub fn is_reminder_logged(
    conn: &Connection,
    appointment_id: i64,
    interval_key: &str,
) -> Result<bool, DatabaseError> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM reminder_log WHERE appointment_id = ?1 AND interval_key = ?2)",
        params![appointment_id, interval_key],
        |row| row.get(0),
    )
    .map_err(DatabaseError::from)
}

/// Record a reminder interval as handled. Returns `false` when it was
/// already logged.
pub fn log_reminder(
    conn: &Connection,
    appointment_id: i64,
    interval_key: &str,
    notification_id: Option<i64>,
    now: NaiveDateTime,
) -> Result<bool, DatabaseError> {
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO reminder_log (appointment_id, interval_key, notification_id, logged_at)
         VALUES (?1, ?2, ?3, ?4)",
        params![appointment_id, interval_key, notification_id, now],
    )?;
    Ok(inserted > 0)
}

/// Forget every logged interval of an appointment. Returns the number of
/// rows removed.
pub fn clear_reminder_log(conn: &Connection, appointment_id: i64) -> Result<usize, DatabaseError> {
    conn.execute(
        "DELETE FROM reminder_log WHERE appointment_id = ?1",
        params![appointment_id],
    )
    .map_err(DatabaseError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::fixtures::*;
    use crate::db::sqlite::open_memory_database;

    #[test]
    fn candidates_respect_window_and_preferences() {
        let conn = open_memory_database().unwrap();
        let (user_id, patient_id) = seed_patient(&conn, "u-1");
        let soon = seed_appointment(&conn, patient_id, "soon", "2026-03-10 13:00:00");
        seed_appointment(&conn, patient_id, "far", "2026-05-01 13:00:00");
        seed_appointment(&conn, patient_id, "past", "2026-03-09 13:00:00");
        conn.execute(
            "INSERT INTO notification_preferences (user_id, reminders) VALUES (?1, 0)",
            params![user_id],
        )
        .unwrap();

        let now = dt("2026-03-10 12:00:00");
        let candidates = get_reminder_candidates(&conn, now, dt("2026-03-17 12:00:00")).unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].appointment.id, soon);
        assert_eq!(candidates[0].user_id, user_id);
        assert!(!candidates[0].reminders_enabled);
    }

    #[test]
    fn log_is_unique_per_interval() {
        let conn = open_memory_database().unwrap();
        let (_, patient_id) = seed_patient(&conn, "u-1");
        let id = seed_appointment(&conn, patient_id, "soon", "2026-03-10 13:00:00");
        let now = dt("2026-03-10 12:00:00");

        assert!(!is_reminder_logged(&conn, id, "1h").unwrap());
        assert!(log_reminder(&conn, id, "1h", None, now).unwrap());
        assert!(!log_reminder(&conn, id, "1h", None, now).unwrap());
        assert!(log_reminder(&conn, id, "1d", None, now).unwrap());
        assert!(is_reminder_logged(&conn, id, "1h").unwrap());
    }

    #[test]
    fn clearing_removes_only_that_appointment() {
        let conn = open_memory_database().unwrap();
        let (_, patient_id) = seed_patient(&conn, "u-1");
        let a = seed_appointment(&conn, patient_id, "a", "2026-03-10 13:00:00");
        let b = seed_appointment(&conn, patient_id, "b", "2026-03-10 14:00:00");
        let now = dt("2026-03-10 12:00:00");
        log_reminder(&conn, a, "1h", None, now).unwrap();
        log_reminder(&conn, a, "1d", None, now).unwrap();
        log_reminder(&conn, b, "1h", None, now).unwrap();

        assert_eq!(clear_reminder_log(&conn, a).unwrap(), 2);
        assert!(!is_reminder_logged(&conn, a, "1h").unwrap());
        assert!(is_reminder_logged(&conn, b, "1h").unwrap());
    }
}
