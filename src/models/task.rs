use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::enums::TaskType;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub patient_id: i64,
    pub phase_id: Option<i64>,
    pub title: String,
    pub description: Option<String>,
    pub task_type: TaskType,
    pub duration: Option<String>,
    pub scheduled_date: Option<NaiveDateTime>,
    pub completed: bool,
    pub completed_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTask {
    pub patient_id: i64,
    pub phase_id: Option<i64>,
    pub title: String,
    pub description: Option<String>,
    pub task_type: Option<TaskType>,
    pub duration: Option<String>,
    pub scheduled_date: Option<NaiveDateTime>,
}
