use rusqlite::{params, Connection, OptionalExtension};

use crate::db::{now_utc, DatabaseError};
use crate::models::*;

/// Stored preferences, or the defaults when the user never saved any.
pub fn get_notification_preferences(
    conn: &Connection,
    user_id: i64,
) -> Result<NotificationPreferences, DatabaseError> {
    let stored = conn
        .query_row(
            "SELECT email, push, reminders, updates FROM notification_preferences
             WHERE user_id = ?1",
            params![user_id],
            |row| {
                Ok(NotificationPreferences {
                    email: row.get(0)?,
                    push: row.get(1)?,
                    reminders: row.get(2)?,
                    updates: row.get(3)?,
                })
            },
        )
        .optional()?;
    Ok(stored.unwrap_or_default())
}

/// Merge the given switches into the stored (or default) preferences.
pub fn update_notification_preferences(
    conn: &Connection,
    user_id: i64,
    update: &NotificationPreferencesUpdate,
) -> Result<NotificationPreferences, DatabaseError> {
    let current = get_notification_preferences(conn, user_id)?;
    let merged = NotificationPreferences {
        email: update.email.unwrap_or(current.email),
        push: update.push.unwrap_or(current.push),
        reminders: update.reminders.unwrap_or(current.reminders),
        updates: update.updates.unwrap_or(current.updates),
    };

    conn.execute(
        "INSERT INTO notification_preferences (user_id, email, push, reminders, updates, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(user_id) DO UPDATE SET
            email = excluded.email,
            push = excluded.push,
            reminders = excluded.reminders,
            updates = excluded.updates,
            updated_at = excluded.updated_at",
        params![
            user_id,
            merged.email,
            merged.push,
            merged.reminders,
            merged.updates,
            now_utc()
        ],
    )?;
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::fixtures::*;
    use crate::db::sqlite::open_memory_database;

    #[test]
    fn defaults_until_saved() {
        let conn = open_memory_database().unwrap();
        let user_id = seed_user(&conn, "u-1");
        let prefs = get_notification_preferences(&conn, user_id).unwrap();
        assert_eq!(prefs, NotificationPreferences::default());
        assert!(prefs.reminders);
        assert!(!prefs.updates);
    }

    #[test]
    fn partial_update_merges() {
        let conn = open_memory_database().unwrap();
        let user_id = seed_user(&conn, "u-1");

        let update = NotificationPreferencesUpdate {
            reminders: Some(false),
            ..Default::default()
        };
        update_notification_preferences(&conn, user_id, &update).unwrap();
        let update = NotificationPreferencesUpdate {
            updates: Some(true),
            ..Default::default()
        };
        let prefs = update_notification_preferences(&conn, user_id, &update).unwrap();

        assert!(!prefs.reminders);
        assert!(prefs.updates);
        assert_eq!(get_notification_preferences(&conn, user_id).unwrap(), prefs);
    }
}
