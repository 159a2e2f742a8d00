use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::{now_utc, DatabaseError};
use crate::models::enums::NotificationType;
use crate::models::*;

const NOTIFICATION_COLUMNS: &str =
    "id, user_id, title, message, notification_type, read, read_at, created_at";

pub const NOTIFICATION_LIST_LIMIT: i64 = 50;

fn row_to_notification(row: &Row<'_>) -> rusqlite::Result<Notification> {
    Ok(Notification {
        id: row.get(0)?,
        user_id: row.get(1)?,
        title: row.get(2)?,
        message: row.get(3)?,
        notification_type: row.get(4)?,
        read: row.get(5)?,
        read_at: row.get(6)?,
        created_at: row.get(7)?,
    })
}

/// The caller's 50 most recent notifications.
pub fn get_notifications(conn: &Connection, user_id: i64) -> Result<Vec<Notification>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE user_id = ?1
         ORDER BY created_at DESC, id DESC
         LIMIT ?2"
    ))?;
    let rows = stmt.query_map(params![user_id, NOTIFICATION_LIST_LIMIT], row_to_notification)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

pub fn count_unread_notifications(conn: &Connection, user_id: i64) -> Result<i64, DatabaseError> {
    conn.query_row(
        "SELECT COUNT(*) FROM notifications WHERE user_id = ?1 AND read = 0",
        params![user_id],
        |row| row.get(0),
    )
    .map_err(DatabaseError::from)
}

/// Mark one of the caller's notifications read. Already-read rows keep
/// their original `read_at`. Returns whether a row changed.
pub fn mark_notification_as_read(
    conn: &Connection,
    user_id: i64,
    notification_id: i64,
    now: NaiveDateTime,
) -> Result<bool, DatabaseError> {
    let changed = conn.execute(
        "UPDATE notifications SET read = 1, read_at = ?1
         WHERE id = ?2 AND user_id = ?3 AND read = 0",
        params![now, notification_id, user_id],
    )?;
    Ok(changed > 0)
}

/// Mark every unread notification of the caller. Returns the count.
pub fn mark_all_notifications_as_read(
    conn: &Connection,
    user_id: i64,
    now: NaiveDateTime,
) -> Result<usize, DatabaseError> {
    let changed = conn.execute(
        "UPDATE notifications SET read = 1, read_at = ?1 WHERE user_id = ?2 AND read = 0",
        params![now, user_id],
    )?;
    Ok(changed)
}

pub fn create_notification(
    conn: &Connection,
    user_id: i64,
    notification_type: NotificationType,
    title: &str,
    message: &str,
) -> Result<Notification, DatabaseError> {
    conn.execute(
        "INSERT INTO notifications (user_id, title, message, notification_type, read, created_at)
         VALUES (?1, ?2, ?3, ?4, 0, ?5)",
        params![user_id, title, message, notification_type, now_utc()],
    )?;
    let id = conn.last_insert_rowid();
    conn.query_row(
        &format!("SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE id = ?1"),
        params![id],
        row_to_notification,
    )
    .optional()?
    .ok_or_else(|| DatabaseError::NotFound {
        entity_type: "Notification".into(),
        id: id.to_string(),
    })
}
