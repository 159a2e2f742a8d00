use serde::{Deserialize, Serialize};

/// Counters for the admin dashboard cards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminStats {
    pub total_patients: i64,
    pub active_patients: i64,
    pub active_plans: i64,
    pub pending_service_requests: i64,
    pub upcoming_appointments: i64,
    pub open_tasks_today: i64,
}
