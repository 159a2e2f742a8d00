use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::enums::ScheduleChangeKind;

/// Stored feed state for one patient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarSyncState {
    pub patient_id: i64,
    pub feed_version: i64,
    pub last_synced_at: Option<NaiveDateTime>,
    #[serde(skip_serializing)]
    pub feed_ics: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleChange {
    pub id: i64,
    pub patient_id: i64,
    pub change_kind: ScheduleChangeKind,
    pub entity_id: i64,
    pub recorded_at: NaiveDateTime,
}
