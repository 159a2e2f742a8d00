use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Achievement {
    pub id: i64,
    pub patient_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub earned_at: NaiveDateTime,
}
