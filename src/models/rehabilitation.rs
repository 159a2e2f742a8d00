use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::enums::{PhaseStatus, PlanStatus};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RehabilitationPlan {
    pub id: i64,
    pub patient_id: i64,
    pub title: String,
    pub status: PlanStatus,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RehabilitationPhase {
    pub id: i64,
    pub plan_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub order: i64,
    pub status: PhaseStatus,
    pub progress: i64,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// Plan together with its ordered phases (admin patient view).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanWithPhases {
    #[serde(flatten)]
    pub plan: RehabilitationPlan,
    pub phases: Vec<RehabilitationPhase>,
}
