use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::enums::AppointmentStatus;

/// Appointment length used when none is given.
pub const DEFAULT_APPOINTMENT_MINUTES: i64 = 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: i64,
    pub patient_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub scheduled_at: NaiveDateTime,
    pub duration: i64,
    pub doctor_name: Option<String>,
    pub location: Option<String>,
    pub status: AppointmentStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Appointment {
    /// Start plus duration; a duration that cannot be represented
    /// collapses the appointment to its start time.
    pub fn ends_at(&self) -> NaiveDateTime {
        Duration::try_minutes(self.duration)
            .and_then(|d| self.scheduled_at.checked_add_signed(d))
            .unwrap_or(self.scheduled_at)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAppointment {
    pub patient_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub scheduled_at: NaiveDateTime,
    pub duration: Option<i64>,
    pub doctor_name: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppointmentUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub scheduled_at: Option<NaiveDateTime>,
    pub duration: Option<i64>,
    pub status: Option<AppointmentStatus>,
}

impl AppointmentUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.scheduled_at.is_none()
            && self.duration.is_none()
            && self.status.is_none()
    }
}
