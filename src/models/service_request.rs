use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::enums::{ServiceRequestStatus, ServiceRequestType};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceRequest {
    pub id: i64,
    pub patient_id: i64,
    pub request_type: ServiceRequestType,
    pub description: String,
    pub status: ServiceRequestStatus,
    pub scheduled_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}
