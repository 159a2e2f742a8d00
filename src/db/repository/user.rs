use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::{now_utc, DatabaseError};
use crate::models::enums::Role;
use crate::models::*;

const USER_COLUMNS: &str =
    "id, open_id, name, email, login_method, role, created_at, updated_at, last_signed_in";

fn row_to_user(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        open_id: row.get(1)?,
        name: row.get(2)?,
        email: row.get(3)?,
        login_method: row.get(4)?,
        role: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
        last_signed_in: row.get(8)?,
    })
}

/// Insert or update a user keyed by `open_id`.
///
/// Fields left `None` keep their stored value. Without an explicit role the
/// owner open id is promoted to admin; everyone else keeps their role
/// (new users default to patient). When nothing but the key is supplied,
/// `last_signed_in` is refreshed.
pub fn upsert_user(
    conn: &Connection,
    user: &UserUpsert,
    owner_open_id: Option<&str>,
) -> Result<User, DatabaseError> {
    if user.open_id.trim().is_empty() {
        return Err(DatabaseError::ConstraintViolation(
            "User openId is required for upsert".into(),
        ));
    }

    let now = now_utc();
    let role = user.role.or_else(|| {
        (owner_open_id == Some(user.open_id.as_str())).then_some(Role::Admin)
    });
    let nothing_to_update = user.name.is_none()
        && user.email.is_none()
        && user.login_method.is_none()
        && user.last_signed_in.is_none()
        && role.is_none();
    let touched_sign_in = if nothing_to_update {
        Some(now)
    } else {
        user.last_signed_in
    };

    conn.execute(
        "INSERT INTO users (open_id, name, email, login_method, role, created_at, updated_at, last_signed_in)
         VALUES (?1, ?2, ?3, ?4, COALESCE(?5, 'patient'), ?6, ?6, ?7)
         ON CONFLICT(open_id) DO UPDATE SET
            name = COALESCE(?2, users.name),
            email = COALESCE(?3, users.email),
            login_method = COALESCE(?4, users.login_method),
            role = COALESCE(?5, users.role),
            last_signed_in = COALESCE(?8, users.last_signed_in),
            updated_at = ?6",
        params![
            user.open_id,
            user.name,
            user.email,
            user.login_method,
            role,
            now,
            user.last_signed_in.unwrap_or(now),
            touched_sign_in,
        ],
    )?;

    get_user_by_open_id(conn, &user.open_id)?.ok_or_else(|| DatabaseError::NotFound {
        entity_type: "user".into(),
        id: user.open_id.clone(),
    })
}

pub fn get_user_by_open_id(conn: &Connection, open_id: &str) -> Result<Option<User>, DatabaseError> {
    let user = conn
        .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE open_id = ?1"),
            params![open_id],
            row_to_user,
        )
        .optional()?;
    Ok(user)
}

pub fn get_user_by_id(conn: &Connection, user_id: i64) -> Result<Option<User>, DatabaseError> {
    let user = conn
        .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
            params![user_id],
            row_to_user,
        )
        .optional()?;
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;

    fn login(open_id: &str, name: &str) -> UserUpsert {
        UserUpsert {
            open_id: open_id.into(),
            name: Some(name.into()),
            login_method: Some("oauth".into()),
            last_signed_in: Some(now_utc()),
            ..Default::default()
        }
    }

    #[test]
    fn first_login_creates_patient_user() {
        let conn = open_memory_database().unwrap();
        let user = upsert_user(&conn, &login("u-1", "Ana"), None).unwrap();
        assert_eq!(user.open_id, "u-1");
        assert_eq!(user.name.as_deref(), Some("Ana"));
        assert_eq!(user.role, Role::Patient);
    }

    #[test]
    fn repeated_login_updates_same_row() {
        let conn = open_memory_database().unwrap();
        let first = upsert_user(&conn, &login("u-1", "Ana"), None).unwrap();
        let second = upsert_user(&conn, &login("u-1", "Ana Maria"), None).unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(second.name.as_deref(), Some("Ana Maria"));
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM users", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn missing_fields_keep_stored_values() {
        let conn = open_memory_database().unwrap();
        let mut upsert = login("u-1", "Ana");
        upsert.email = Some("ana@example.com".into());
        upsert_user(&conn, &upsert, None).unwrap();

        let bare = UserUpsert {
            open_id: "u-1".into(),
            ..Default::default()
        };
        let user = upsert_user(&conn, &bare, None).unwrap();
        assert_eq!(user.email.as_deref(), Some("ana@example.com"));
        assert_eq!(user.name.as_deref(), Some("Ana"));
    }

    #[test]
    fn owner_becomes_admin() {
        let conn = open_memory_database().unwrap();
        let user = upsert_user(&conn, &login("owner", "Dr. Owner"), Some("owner")).unwrap();
        assert!(user.is_admin());

        let other = upsert_user(&conn, &login("someone", "Someone"), Some("owner")).unwrap();
        assert!(!other.is_admin());
    }

    #[test]
    fn admin_role_survives_later_logins_without_role() {
        let conn = open_memory_database().unwrap();
        let mut upsert = login("u-1", "Ana");
        upsert.role = Some(Role::Admin);
        upsert_user(&conn, &upsert, None).unwrap();

        let user = upsert_user(&conn, &login("u-1", "Ana"), None).unwrap();
        assert_eq!(user.role, Role::Admin);
    }

    #[test]
    fn empty_open_id_rejected() {
        let conn = open_memory_database().unwrap();
        let result = upsert_user(&conn, &UserUpsert::default(), None);
        assert!(matches!(result, Err(DatabaseError::ConstraintViolation(_))));
    }

    #[test]
    fn unknown_user_is_none() {
        let conn = open_memory_database().unwrap();
        assert!(get_user_by_open_id(&conn, "nobody").unwrap().is_none());
        assert!(get_user_by_id(&conn, 42).unwrap().is_none());
    }
}
