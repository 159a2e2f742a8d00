//! Appointment reminders: the fixed reminder intervals, the job that turns
//! due intervals into notifications, and the background task running it.

pub mod reminders;
pub mod scheduler;

use chrono::Duration;

/// How long before an appointment a reminder fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReminderInterval {
    /// Stable key stored in `reminder_log`.
    pub key: &'static str,
    pub minutes_before: i64,
    /// RFC 5545 `TRIGGER` value for calendar alarms.
    pub trigger: &'static str,
    pub label: &'static str,
}

impl ReminderInterval {
    pub fn lead(&self) -> Duration {
        Duration::minutes(self.minutes_before)
    }
}

pub const ONE_WEEK_BEFORE: ReminderInterval = ReminderInterval {
    key: "7d",
    minutes_before: 7 * 24 * 60,
    trigger: "-P7D",
    label: "in one week",
};

pub const ONE_DAY_BEFORE: ReminderInterval = ReminderInterval {
    key: "1d",
    minutes_before: 24 * 60,
    trigger: "-P1D",
    label: "tomorrow",
};

pub const ONE_HOUR_BEFORE: ReminderInterval = ReminderInterval {
    key: "1h",
    minutes_before: 60,
    trigger: "-PT1H",
    label: "in one hour",
};

/// Widest first.
pub const REMINDER_INTERVALS: [ReminderInterval; 3] =
    [ONE_WEEK_BEFORE, ONE_DAY_BEFORE, ONE_HOUR_BEFORE];

/// Furthest ahead the reminder job ever looks.
pub fn reminder_horizon() -> Duration {
    REMINDER_INTERVALS
        .iter()
        .map(ReminderInterval::lead)
        .max()
        .unwrap_or_else(Duration::zero)
}
