use chrono::NaiveDateTime;
use rusqlite::Connection;

use super::{reminder_horizon, ReminderInterval, REMINDER_INTERVALS};
use crate::db::repository::{self, ReminderCandidate};
use crate::db::DatabaseError;
use crate::models::enums::NotificationType;
use crate::models::Appointment;

/// Outcome of one reminder pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReminderReport {
    pub examined: usize,
    pub notified: usize,
    pub skipped_disabled: usize,
}

/// Intervals whose window has opened for an appointment at `now`.
pub fn due_intervals(appointment: &Appointment, now: NaiveDateTime) -> Vec<ReminderInterval> {
    let until = appointment.scheduled_at - now;
    REMINDER_INTERVALS
        .iter()
        .copied()
        .filter(|interval| until <= interval.lead())
        .collect()
}

/// Turn due reminder intervals into notifications.
///
/// For each upcoming scheduled appointment only the tightest due interval
/// produces a notification; every due interval is logged so wider ones
/// never fire late and reruns add nothing. Users who switched reminders
/// off are skipped and nothing is logged for them.
pub fn dispatch_due_reminders(
    conn: &Connection,
    now: NaiveDateTime,
) -> Result<ReminderReport, DatabaseError> {
    let candidates = repository::get_reminder_candidates(conn, now, now + reminder_horizon())?;
    let mut report = ReminderReport {
        examined: candidates.len(),
        ..Default::default()
    };

    for candidate in candidates {
        if !candidate.reminders_enabled {
            report.skipped_disabled += 1;
            continue;
        }
        if dispatch_one(conn, &candidate, now)? {
            report.notified += 1;
        }
    }

    if report.notified > 0 {
        tracing::info!(
            notified = report.notified,
            examined = report.examined,
            "Appointment reminders dispatched"
        );
    }
    Ok(report)
}

fn dispatch_one(
    conn: &Connection,
    candidate: &ReminderCandidate,
    now: NaiveDateTime,
) -> Result<bool, DatabaseError> {
    let appointment = &candidate.appointment;
    let due = due_intervals(appointment, now);
    let Some(tightest) = due.iter().min_by_key(|i| i.minutes_before).copied() else {
        return Ok(false);
    };

    let tx = conn.unchecked_transaction()?;
    let mut sent = false;
    if !repository::is_reminder_logged(&tx, appointment.id, tightest.key)? {
        let notification = repository::create_notification(
            &tx,
            candidate.user_id,
            NotificationType::Reminder,
            "Appointment reminder",
            &reminder_message(appointment, &tightest),
        )?;
        repository::log_reminder(&tx, appointment.id, tightest.key, Some(notification.id), now)?;
        sent = true;
    }
    for interval in due.iter().filter(|i| i.key != tightest.key) {
        repository::log_reminder(&tx, appointment.id, interval.key, None, now)?;
    }
    tx.commit()?;
    Ok(sent)
}

fn reminder_message(appointment: &Appointment, interval: &ReminderInterval) -> String {
    let when = appointment.scheduled_at.format("%Y-%m-%d at %H:%M UTC");
    match appointment.doctor_name.as_deref() {
        Some(doctor) => format!(
            "{} with {doctor} is {} ({when}).",
            appointment.title, interval.label
        ),
        None => format!("{} is {} ({when}).", appointment.title, interval.label),
    }
}
