//! Repository layer: entity-scoped database operations.
//!
//! Patient-facing functions take the caller's `user_id` and resolve the
//! patient record themselves, so a caller can never reach another
//! patient's rows by guessing ids. Admin functions take `patient_id`.

mod achievement;
mod admin;
mod appointment;
mod article;
mod calendar;
mod notification;
mod patient;
mod preference;
mod prosthesis;
mod rehabilitation;
mod reminder;
mod service_request;
mod task;
mod user;

pub use achievement::*;
pub use admin::*;
pub use appointment::*;
pub use article::*;
pub use calendar::*;
pub use notification::*;
pub use patient::*;
pub use preference::*;
pub use prosthesis::*;
pub use rehabilitation::*;
pub use reminder::*;
pub use service_request::*;
pub use task::*;
pub use user::*;

/// Escape `LIKE` metacharacters. Pair with `ESCAPE '\'`.
pub(crate) fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::NaiveDateTime;
    use rusqlite::{params, Connection};

    pub fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    pub fn seed_user(conn: &Connection, open_id: &str) -> i64 {
        conn.execute(
            "INSERT INTO users (open_id, name, email, login_method) VALUES (?1, ?2, ?3, 'oauth')",
            params![open_id, format!("User {open_id}"), format!("{open_id}@example.com")],
        )
        .unwrap();
        conn.last_insert_rowid()
    }

    /// Returns `(user_id, patient_id)`.
    pub fn seed_patient(conn: &Connection, open_id: &str) -> (i64, i64) {
        let user_id = seed_user(conn, open_id);
        conn.execute(
            "INSERT INTO patients (user_id, first_name, last_name, phone, address)
             VALUES (?1, 'Layla', ?2, '+971 4 000 0000', 'Dubai Healthcare City')",
            params![user_id, open_id],
        )
        .unwrap();
        (user_id, conn.last_insert_rowid())
    }

    pub fn seed_prosthesis(conn: &Connection, patient_id: i64) -> i64 {
        conn.execute(
            "INSERT INTO prostheses (patient_id, serial_number, model, manufacturer, side,
                                     implant_date, warranty_expires_at)
             VALUES (?1, 'SN-0001', 'Genesis II', 'Smith & Nephew', 'left',
                     '2024-10-15', '2034-10-15')",
            params![patient_id],
        )
        .unwrap();
        conn.last_insert_rowid()
    }

    pub fn seed_plan(conn: &Connection, patient_id: i64, status: &str) -> i64 {
        conn.execute(
            "INSERT INTO rehabilitation_plans (patient_id, title, status, start_date)
             VALUES (?1, 'Knee recovery', ?2, '2024-10-20')",
            params![patient_id, status],
        )
        .unwrap();
        conn.last_insert_rowid()
    }

    pub fn seed_phase(conn: &Connection, plan_id: i64, order: i64, progress: i64) -> i64 {
        conn.execute(
            "INSERT INTO rehabilitation_phases (plan_id, title, phase_order, status, progress)
             VALUES (?1, ?2, ?3, 'active', ?4)",
            params![plan_id, format!("Phase {order}"), order, progress],
        )
        .unwrap();
        conn.last_insert_rowid()
    }

    pub fn seed_task(conn: &Connection, patient_id: i64, title: &str, scheduled: &str) -> i64 {
        conn.execute(
            "INSERT INTO tasks (patient_id, title, task_type, duration, scheduled_date)
             VALUES (?1, ?2, 'exercise', '15 min', ?3)",
            params![patient_id, title, scheduled],
        )
        .unwrap();
        conn.last_insert_rowid()
    }

    pub fn seed_appointment(conn: &Connection, patient_id: i64, title: &str, at: &str) -> i64 {
        conn.execute(
            "INSERT INTO appointments (patient_id, title, scheduled_at, doctor_name, location)
             VALUES (?1, ?2, ?3, 'Dr. Hassan', 'Clinic, Room 2')",
            params![patient_id, title, at],
        )
        .unwrap();
        conn.last_insert_rowid()
    }

    pub fn seed_article(
        conn: &Connection,
        title: &str,
        category: &str,
        published: bool,
        featured: bool,
    ) -> i64 {
        conn.execute(
            "INSERT INTO articles (title, description, content, category, published, featured)
             VALUES (?1, 'Short summary', 'Body text', ?2, ?3, ?4)",
            params![title, category, published, featured],
        )
        .unwrap();
        conn.last_insert_rowid()
    }

    pub fn seed_notification(conn: &Connection, user_id: i64, title: &str) -> i64 {
        conn.execute(
            "INSERT INTO notifications (user_id, title, message, notification_type)
             VALUES (?1, ?2, 'Message body', 'system')",
            params![user_id, title],
        )
        .unwrap();
        conn.last_insert_rowid()
    }
}

#[cfg(test)]
mod tests {
    use super::escape_like;

    #[test]
    fn like_metacharacters_are_escaped() {
        assert_eq!(escape_like("50%_off"), "50\\%\\_off");
        assert_eq!(escape_like("a\\b"), "a\\\\b");
        assert_eq!(escape_like("plain"), "plain");
    }
}
