//! Dashboard summary: the patient's profile, implant, active plan, today's
//! tasks and next appointment in one read.

use chrono::NaiveDateTime;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::db::{repository, DatabaseError};
use crate::models::{Appointment, Patient, Prosthesis, RehabilitationPlan, Task};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub patient: Option<Patient>,
    pub prosthesis: Option<Prosthesis>,
    pub plan: Option<RehabilitationPlan>,
    pub todays_tasks: Vec<Task>,
    pub next_appointment: Option<Appointment>,
    /// Share of today's tasks completed, 0..=100.
    pub daily_progress: i64,
    pub unread_notifications: i64,
}

// ---------------------------------------------------------------------------
// Functions
// ---------------------------------------------------------------------------

/// Rounded percentage; zero when there is nothing scheduled.
pub fn daily_progress(tasks: &[Task]) -> i64 {
    if tasks.is_empty() {
        return 0;
    }
    let completed = tasks.iter().filter(|t| t.completed).count() as f64;
    (completed / tasks.len() as f64 * 100.0).round() as i64
}

pub fn get_dashboard_summary(
    conn: &Connection,
    user_id: i64,
    now: NaiveDateTime,
) -> Result<DashboardSummary, DatabaseError> {
    let todays_tasks = repository::get_todays_tasks(conn, user_id, now.date())?;
    let next_appointment = repository::get_upcoming_appointments(conn, user_id, now)?
        .into_iter()
        .next();

    Ok(DashboardSummary {
        patient: repository::get_patient_by_user_id(conn, user_id)?,
        prosthesis: repository::get_patient_prosthesis(conn, user_id)?,
        plan: repository::get_patient_rehab_plan(conn, user_id)?,
        daily_progress: daily_progress(&todays_tasks),
        todays_tasks,
        next_appointment,
        unread_notifications: repository::count_unread_notifications(conn, user_id)?,
    })
}
