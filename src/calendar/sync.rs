//! Per-patient feed regeneration.
//!
//! Every schedule mutation (appointment created or updated, task created)
//! is recorded and the patient's whole feed is rebuilt from current rows.
//! Events are keyed by entity id, so a rebuilt feed holds each appointment
//! and task exactly once.

use chrono::{Duration, NaiveDateTime};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use super::ics::{IcsAlarm, IcsCalendar, IcsEvent};
use crate::config::AppConfig;
use crate::db::{repository, DatabaseError};
use crate::models::enums::{AppointmentStatus, ScheduleChangeKind};
use crate::models::{Appointment, CalendarSyncState, Task};
use crate::notifications::REMINDER_INTERVALS;

const FEED_NAME: &str = "Ortho Portal";
const FEED_REFRESH: &str = "PT1H";
const DEFAULT_TASK_MINUTES: i64 = 30;
const MAX_TASK_MINUTES: i64 = 24 * 60;

/// What clients poll to learn whether their copy is stale.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarSyncStatus {
    pub feed_version: i64,
    pub last_synced_at: Option<NaiveDateTime>,
}

impl From<CalendarSyncState> for CalendarSyncStatus {
    fn from(state: CalendarSyncState) -> Self {
        Self {
            feed_version: state.feed_version,
            last_synced_at: state.last_synced_at,
        }
    }
}

pub fn appointment_uid(appointment_id: i64, host: &str) -> String {
    format!("appointment-{appointment_id}@{host}")
}

pub fn task_uid(task_id: i64, host: &str) -> String {
    format!("task-{task_id}@{host}")
}

pub fn appointment_event(
    appointment: &Appointment,
    config: &AppConfig,
    now: NaiveDateTime,
) -> IcsEvent {
    let mut description = appointment.description.clone().unwrap_or_default();
    if let Some(doctor) = &appointment.doctor_name {
        if !description.is_empty() {
            description.push('\n');
        }
        description.push_str(&format!("Doctor: {doctor}"));
    }

    IcsEvent {
        uid: appointment_uid(appointment.id, config.host()),
        stamp: now,
        start: appointment.scheduled_at,
        end: appointment.ends_at(),
        summary: appointment.title.clone(),
        description: (!description.is_empty()).then_some(description),
        location: Some(
            appointment
                .location
                .clone()
                .unwrap_or_else(|| config.clinic_location.clone()),
        ),
        cancelled: appointment.status == AppointmentStatus::Cancelled,
        last_modified: Some(appointment.updated_at),
        alarms: REMINDER_INTERVALS
            .iter()
            .map(|interval| IcsAlarm {
                trigger: interval.trigger,
                description: format!("{} {}", appointment.title, interval.label),
            })
            .collect(),
    }
}

/// Minutes encoded in a free-text duration such as `15 min` or `1 hour`.
/// Anything unparseable or outside one day falls back to the default.
pub fn task_minutes(duration: Option<&str>) -> i64 {
    let Some(text) = duration.map(str::trim) else {
        return DEFAULT_TASK_MINUTES;
    };
    let digits: String = text.chars().take_while(char::is_ascii_digit).collect();
    let Ok(amount) = digits.parse::<i64>() else {
        return DEFAULT_TASK_MINUTES;
    };
    let unit = text[digits.len()..].trim_start().to_ascii_lowercase();
    let minutes = if unit.starts_with('h') {
        amount.checked_mul(60)
    } else {
        Some(amount)
    };
    minutes
        .filter(|m| (1..=MAX_TASK_MINUTES).contains(m))
        .unwrap_or(DEFAULT_TASK_MINUTES)
}

/// `None` for tasks without a date.
pub fn task_event(task: &Task, config: &AppConfig, now: NaiveDateTime) -> Option<IcsEvent> {
    let start = task.scheduled_date?;
    let end = start
        .checked_add_signed(Duration::minutes(task_minutes(task.duration.as_deref())))
        .unwrap_or(start);
    Some(IcsEvent {
        uid: task_uid(task.id, config.host()),
        stamp: now,
        start,
        end,
        summary: task.title.clone(),
        description: task.description.clone(),
        location: None,
        cancelled: false,
        last_modified: task.completed_at,
        alarms: Vec::new(),
    })
}

/// Build a patient's feed from the current appointment and task rows.
pub fn build_patient_feed(
    conn: &Connection,
    patient_id: i64,
    config: &AppConfig,
    now: NaiveDateTime,
) -> Result<IcsCalendar, DatabaseError> {
    let mut calendar = IcsCalendar::new()
        .named(FEED_NAME)
        .refresh_every(FEED_REFRESH);
    for appointment in repository::get_patient_appointments(conn, patient_id)? {
        calendar.push(appointment_event(&appointment, config, now));
    }
    for task in repository::get_scheduled_tasks_for_patient(conn, patient_id)? {
        if let Some(event) = task_event(&task, config, now) {
            calendar.push(event);
        }
    }
    Ok(calendar)
}

/// Record a schedule change and regenerate the patient's stored feed.
pub fn on_schedule_change(
    conn: &Connection,
    patient_id: i64,
    kind: ScheduleChangeKind,
    entity_id: i64,
    config: &AppConfig,
    now: NaiveDateTime,
) -> Result<CalendarSyncState, DatabaseError> {
    repository::record_schedule_change(conn, patient_id, kind, entity_id, now)?;
    let feed = build_patient_feed(conn, patient_id, config, now)?.render();
    let state = repository::store_calendar_feed(conn, patient_id, &feed, now)?;
    tracing::debug!(
        patient_id,
        change = kind.as_str(),
        entity_id,
        feed_version = state.feed_version,
        "Calendar feed regenerated"
    );
    Ok(state)
}

/// [`on_schedule_change`] for callers whose own mutation already
/// succeeded: failures are logged, never returned.
pub fn sync_after_change(
    conn: &Connection,
    patient_id: i64,
    kind: ScheduleChangeKind,
    entity_id: i64,
    config: &AppConfig,
    now: NaiveDateTime,
) {
    if let Err(e) = on_schedule_change(conn, patient_id, kind, entity_id, config, now) {
        tracing::warn!(
            patient_id,
            change = kind.as_str(),
            entity_id,
            error = %e,
            "Calendar sync failed after schedule change"
        );
    }
}

/// The stored feed, generated and stored first if none exists yet.
pub fn ensure_feed(
    conn: &Connection,
    patient_id: i64,
    config: &AppConfig,
    now: NaiveDateTime,
) -> Result<String, DatabaseError> {
    if let Some(feed) = repository::get_calendar_sync(conn, patient_id)?.and_then(|s| s.feed_ics) {
        return Ok(feed);
    }
    let feed = build_patient_feed(conn, patient_id, config, now)?.render();
    repository::store_calendar_feed(conn, patient_id, &feed, now)?;
    Ok(feed)
}

/// Version and last sync time; zero/none before the first sync.
pub fn sync_status(conn: &Connection, patient_id: i64) -> Result<CalendarSyncStatus, DatabaseError> {
    Ok(repository::get_calendar_sync(conn, patient_id)?
        .map(CalendarSyncStatus::from)
        .unwrap_or_default())
}
