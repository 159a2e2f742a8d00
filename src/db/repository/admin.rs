use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use rusqlite::{params, Connection};

use crate::db::DatabaseError;
use crate::models::*;

/// Counters for the admin dashboard.
pub fn admin_stats(
    conn: &Connection,
    now: NaiveDateTime,
    today: NaiveDate,
) -> Result<AdminStats, DatabaseError> {
    let day_start = today.and_time(NaiveTime::MIN);
    let day_end = day_start + Duration::days(1);

    conn.query_row(
        "SELECT
            (SELECT COUNT(*) FROM patients),
            (SELECT COUNT(*) FROM patients WHERE status = 'active'),
            (SELECT COUNT(*) FROM rehabilitation_plans WHERE status = 'active'),
            (SELECT COUNT(*) FROM service_requests WHERE status = 'pending'),
            (SELECT COUNT(*) FROM appointments WHERE status = 'scheduled' AND scheduled_at >= ?1),
            (SELECT COUNT(*) FROM tasks
             WHERE completed = 0 AND scheduled_date >= ?2 AND scheduled_date < ?3)",
        params![now, day_start, day_end],
        |row| {
            Ok(AdminStats {
                total_patients: row.get(0)?,
                active_patients: row.get(1)?,
                active_plans: row.get(2)?,
                pending_service_requests: row.get(3)?,
                upcoming_appointments: row.get(4)?,
                open_tasks_today: row.get(5)?,
            })
        },
    )
    .map_err(DatabaseError::from)
}
