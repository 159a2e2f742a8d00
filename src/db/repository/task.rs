use chrono::{Duration, NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::{now_utc, DatabaseError};
use crate::models::enums::TaskType;
use crate::models::*;

const TASK_COLUMNS: &str = "id, patient_id, phase_id, title, description, task_type, duration,
     scheduled_date, completed, completed_at, created_at";

fn row_to_task(row: &Row<'_>) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        phase_id: row.get(2)?,
        title: row.get(3)?,
        description: row.get(4)?,
        task_type: row.get(5)?,
        duration: row.get(6)?,
        scheduled_date: row.get(7)?,
        completed: row.get(8)?,
        completed_at: row.get(9)?,
        created_at: row.get(10)?,
    })
}

fn get_task(conn: &Connection, task_id: i64) -> Result<Option<Task>, DatabaseError> {
    let task = conn
        .query_row(
            &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1"),
            params![task_id],
            row_to_task,
        )
        .optional()?;
    Ok(task)
}

/// Tasks scheduled within `[today 00:00, tomorrow 00:00)` for the caller.
pub fn get_todays_tasks(
    conn: &Connection,
    user_id: i64,
    today: NaiveDate,
) -> Result<Vec<Task>, DatabaseError> {
    let Some(patient) = super::get_patient_by_user_id(conn, user_id)? else {
        return Ok(Vec::new());
    };
    let start = today.and_time(chrono::NaiveTime::MIN);
    let end = start + Duration::days(1);

    let mut stmt = conn.prepare(&format!(
        "SELECT {TASK_COLUMNS} FROM tasks
         WHERE patient_id = ?1 AND scheduled_date >= ?2 AND scheduled_date < ?3
         ORDER BY scheduled_date, id"
    ))?;
    let rows = stmt.query_map(params![patient.id, start, end], row_to_task)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

/// Mark one of the caller's tasks as done.
///
/// Completing twice keeps the first `completed_at`. Returns `None` when
/// the task does not exist or belongs to someone else.
pub fn complete_task(
    conn: &Connection,
    user_id: i64,
    task_id: i64,
    now: NaiveDateTime,
) -> Result<Option<Task>, DatabaseError> {
    let Some(patient) = super::get_patient_by_user_id(conn, user_id)? else {
        return Ok(None);
    };
    let changed = conn.execute(
        "UPDATE tasks SET completed = 1, completed_at = COALESCE(completed_at, ?1)
         WHERE id = ?2 AND patient_id = ?3",
        params![now, task_id, patient.id],
    )?;
    if changed == 0 {
        return Ok(None);
    }
    get_task(conn, task_id)
}

/// Schedule a task for a patient. Returns `None` when the patient does
/// not exist; a phase from another patient's plan is rejected.
pub fn create_task(conn: &Connection, new: &NewTask) -> Result<Option<Task>, DatabaseError> {
    if super::get_patient_by_id(conn, new.patient_id)?.is_none() {
        return Ok(None);
    }
    if let Some(phase_id) = new.phase_id {
        if super::get_phase_owner(conn, phase_id)? != Some(new.patient_id) {
            return Err(DatabaseError::ConstraintViolation(format!(
                "phase {phase_id} is not part of patient {}'s plan",
                new.patient_id
            )));
        }
    }

    conn.execute(
        "INSERT INTO tasks (patient_id, phase_id, title, description, task_type, duration,
                            scheduled_date, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            new.patient_id,
            new.phase_id,
            new.title,
            new.description,
            new.task_type.unwrap_or(TaskType::Exercise),
            new.duration,
            new.scheduled_date,
            now_utc(),
        ],
    )?;
    get_task(conn, conn.last_insert_rowid())
}

/// Every dated task of a patient, oldest first. Feeds the calendar.
pub fn get_scheduled_tasks_for_patient(
    conn: &Connection,
    patient_id: i64,
) -> Result<Vec<Task>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {TASK_COLUMNS} FROM tasks
         WHERE patient_id = ?1 AND scheduled_date IS NOT NULL
         ORDER BY scheduled_date, id"
    ))?;
    let rows = stmt.query_map(params![patient_id], row_to_task)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::fixtures::*;
    use crate::db::sqlite::open_memory_database;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 10).unwrap()
    }

    #[test]
    fn todays_tasks_are_bounded_to_the_day() {
        let conn = open_memory_database().unwrap();
        let (user_id, patient_id) = seed_patient(&conn, "u-1");
        seed_task(&conn, patient_id, "late", "2026-03-10 18:00:00");
        seed_task(&conn, patient_id, "early", "2026-03-10 00:00:00");
        seed_task(&conn, patient_id, "yesterday", "2026-03-09 23:59:59");
        seed_task(&conn, patient_id, "tomorrow", "2026-03-11 00:00:00");

        let titles: Vec<String> = get_todays_tasks(&conn, user_id, today())
            .unwrap()
            .into_iter()
            .map(|t| t.title)
            .collect();
        assert_eq!(titles, vec!["early", "late"]);
    }

    #[test]
    fn completion_is_idempotent() {
        let conn = open_memory_database().unwrap();
        let (user_id, patient_id) = seed_patient(&conn, "u-1");
        let task_id = seed_task(&conn, patient_id, "walk", "2026-03-10 09:00:00");

        let first = complete_task(&conn, user_id, task_id, dt("2026-03-10 10:00:00"))
            .unwrap()
            .unwrap();
        let second = complete_task(&conn, user_id, task_id, dt("2026-03-10 11:00:00"))
            .unwrap()
            .unwrap();
        assert!(second.completed);
        assert_eq!(first.completed_at, second.completed_at);
        assert_eq!(second.completed_at, Some(dt("2026-03-10 10:00:00")));
    }

    #[test]
    fn cannot_complete_someone_elses_task() {
        let conn = open_memory_database().unwrap();
        let (_, owner) = seed_patient(&conn, "u-1");
        let (intruder, _) = seed_patient(&conn, "u-2");
        let task_id = seed_task(&conn, owner, "walk", "2026-03-10 09:00:00");

        assert!(complete_task(&conn, intruder, task_id, dt("2026-03-10 10:00:00"))
            .unwrap()
            .is_none());
        assert!(!get_task(&conn, task_id).unwrap().unwrap().completed);
    }

    #[test]
    fn create_task_checks_phase_ownership() {
        let conn = open_memory_database().unwrap();
        let (_, owner) = seed_patient(&conn, "u-1");
        let (_, other) = seed_patient(&conn, "u-2");
        let plan_id = seed_plan(&conn, other, "active");
        let phase_id = seed_phase(&conn, plan_id, 1, 0);

        let mut new = NewTask {
            patient_id: owner,
            phase_id: Some(phase_id),
            title: "Quad sets".into(),
            description: None,
            task_type: None,
            duration: Some("10 min".into()),
            scheduled_date: Some(dt("2026-03-10 08:00:00")),
        };
        assert!(matches!(
            create_task(&conn, &new),
            Err(DatabaseError::ConstraintViolation(_))
        ));

        new.phase_id = None;
        let task = create_task(&conn, &new).unwrap().unwrap();
        assert_eq!(task.task_type, TaskType::Exercise);
        assert!(!task.completed);

        new.patient_id = 404;
        assert!(create_task(&conn, &new).unwrap().is_none());
    }

    #[test]
    fn undated_tasks_stay_off_the_calendar() {
        let conn = open_memory_database().unwrap();
        let (_, patient_id) = seed_patient(&conn, "u-1");
        seed_task(&conn, patient_id, "dated", "2026-03-10 09:00:00");
        conn.execute(
            "INSERT INTO tasks (patient_id, title) VALUES (?1, 'undated')",
            params![patient_id],
        )
        .unwrap();

        let tasks = get_scheduled_tasks_for_patient(&conn, patient_id).unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].title, "dated");
    }
}
