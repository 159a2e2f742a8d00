use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::enums::NotificationType;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub message: String,
    pub notification_type: NotificationType,
    pub read: bool,
    pub read_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
}

/// Per-user delivery switches shown on the settings page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPreferences {
    pub email: bool,
    pub push: bool,
    pub reminders: bool,
    pub updates: bool,
}

impl Default for NotificationPreferences {
    fn default() -> Self {
        Self {
            email: true,
            push: true,
            reminders: true,
            updates: false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotificationPreferencesUpdate {
    pub email: Option<bool>,
    pub push: Option<bool>,
    pub reminders: Option<bool>,
    pub updates: Option<bool>,
}
