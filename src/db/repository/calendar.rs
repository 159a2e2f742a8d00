use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension};

use crate::db::DatabaseError;
use crate::models::enums::ScheduleChangeKind;
use crate::models::*;

pub fn record_schedule_change(
    conn: &Connection,
    patient_id: i64,
    kind: ScheduleChangeKind,
    entity_id: i64,
    now: NaiveDateTime,
) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO schedule_changes (patient_id, change_kind, entity_id, recorded_at)
         VALUES (?1, ?2, ?3, ?4)",
        params![patient_id, kind, entity_id, now],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Changes recorded for a patient, newest first.
pub fn get_schedule_changes(
    conn: &Connection,
    patient_id: i64,
    limit: i64,
) -> Result<Vec<ScheduleChange>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, patient_id, change_kind, entity_id, recorded_at
         FROM schedule_changes WHERE patient_id = ?1
         ORDER BY recorded_at DESC, id DESC LIMIT ?2",
    )?;
    let rows = stmt.query_map(params![patient_id, limit], |row| {
        Ok(ScheduleChange {
            id: row.get(0)?,
            patient_id: row.get(1)?,
            change_kind: row.get(2)?,
            entity_id: row.get(3)?,
            recorded_at: row.get(4)?,
        })
    })?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

pub fn get_calendar_sync(
    conn: &Connection,
    patient_id: i64,
) -> Result<Option<CalendarSyncState>, DatabaseError> {
    let state = conn
        .query_row(
            "SELECT patient_id, feed_version, last_synced_at, feed_ics
             FROM calendar_sync WHERE patient_id = ?1",
            params![patient_id],
            |row| {
                Ok(CalendarSyncState {
                    patient_id: row.get(0)?,
                    feed_version: row.get(1)?,
                    last_synced_at: row.get(2)?,
                    feed_ics: row.get(3)?,
                })
            },
        )
        .optional()?;
    Ok(state)
}

/// Store a freshly rendered feed and bump its version.
pub fn store_calendar_feed(
    conn: &Connection,
    patient_id: i64,
    feed_ics: &str,
    now: NaiveDateTime,
) -> Result<CalendarSyncState, DatabaseError> {
    conn.execute(
        "INSERT INTO calendar_sync (patient_id, feed_version, last_synced_at, feed_ics)
         VALUES (?1, 1, ?2, ?3)
         ON CONFLICT(patient_id) DO UPDATE SET
            feed_version = calendar_sync.feed_version + 1,
            last_synced_at = excluded.last_synced_at,
            feed_ics = excluded.feed_ics",
        params![patient_id, now, feed_ics],
    )?;
    get_calendar_sync(conn, patient_id)?.ok_or_else(|| DatabaseError::NotFound {
        entity_type: "CalendarSync".into(),
        id: patient_id.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::fixtures::*;
    use crate::db::sqlite::open_memory_database;

    #[test]
    fn feed_version_increments_per_store() {
        let conn = open_memory_database().unwrap();
        let (_, patient_id) = seed_patient(&conn, "u-1");
        assert!(get_calendar_sync(&conn, patient_id).unwrap().is_none());

        let first = store_calendar_feed(&conn, patient_id, "A", dt("2026-01-01 10:00:00")).unwrap();
        let second = store_calendar_feed(&conn, patient_id, "B", dt("2026-01-01 11:00:00")).unwrap();
        assert_eq!(first.feed_version, 1);
        assert_eq!(second.feed_version, 2);
        assert_eq!(second.last_synced_at, Some(dt("2026-01-01 11:00:00")));
        assert_eq!(second.feed_ics.as_deref(), Some("B"));
    }

    #[test]
    fn changes_listed_newest_first() {
        let conn = open_memory_database().unwrap();
        let (_, patient_id) = seed_patient(&conn, "u-1");
        record_schedule_change(&conn, patient_id, ScheduleChangeKind::TaskCreated, 3, dt("2026-01-01 10:00:00"))
            .unwrap();
        record_schedule_change(
            &conn,
            patient_id,
            ScheduleChangeKind::AppointmentUpdated,
            7,
            dt("2026-01-02 10:00:00"),
        )
        .unwrap();

        let changes = get_schedule_changes(&conn, patient_id, 10).unwrap();
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].change_kind, ScheduleChangeKind::AppointmentUpdated);
        assert_eq!(changes[0].entity_id, 7);
    }
}
