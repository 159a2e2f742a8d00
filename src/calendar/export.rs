//! Single-appointment export: a standalone `.ics` file and a Google
//! Calendar template link.

use chrono::NaiveDateTime;

use super::ics::{format_utc, IcsAlarm, IcsCalendar, IcsEvent};
use super::sync::appointment_uid;
use crate::config::AppConfig;
use crate::models::enums::AppointmentStatus;
use crate::models::Appointment;
use crate::notifications::{ONE_DAY_BEFORE, ONE_WEEK_BEFORE};

const GOOGLE_TEMPLATE_URL: &str = "https://calendar.google.com/calendar/render";

fn location_of<'a>(appointment: &'a Appointment, config: &'a AppConfig) -> &'a str {
    appointment
        .location
        .as_deref()
        .unwrap_or(&config.clinic_location)
}

fn details_of(appointment: &Appointment) -> String {
    appointment.description.clone().unwrap_or_default()
}

/// A one-event calendar with week-ahead and day-ahead reminders.
pub fn appointment_ics(appointment: &Appointment, config: &AppConfig, now: NaiveDateTime) -> String {
    let alarms = [ONE_WEEK_BEFORE, ONE_DAY_BEFORE]
        .iter()
        .map(|interval| IcsAlarm {
            trigger: interval.trigger,
            description: format!("Reminder: {} {}", appointment.title, interval.label),
        })
        .collect();

    let details = details_of(appointment);
    let mut calendar = IcsCalendar::new();
    calendar.push(IcsEvent {
        uid: appointment_uid(appointment.id, config.host()),
        stamp: now,
        start: appointment.scheduled_at,
        end: appointment.ends_at(),
        summary: appointment.title.clone(),
        description: (!details.is_empty()).then_some(details),
        location: Some(location_of(appointment, config).to_string()),
        cancelled: appointment.status == AppointmentStatus::Cancelled,
        last_modified: Some(appointment.updated_at),
        alarms,
    });
    calendar.render()
}

/// Download name for [`appointment_ics`].
pub fn appointment_filename(appointment: &Appointment) -> String {
    format!("appointment-{}.ics", appointment.id)
}

/// Google Calendar "add event" link prefilled with the appointment.
pub fn google_calendar_url(appointment: &Appointment, config: &AppConfig) -> String {
    format!(
        "{GOOGLE_TEMPLATE_URL}?action=TEMPLATE&text={}&dates={}/{}&details={}&location={}",
        urlencoding::encode(&appointment.title),
        format_utc(appointment.scheduled_at),
        format_utc(appointment.ends_at()),
        urlencoding::encode(&details_of(appointment)),
        urlencoding::encode(location_of(appointment, config)),
    )
}
