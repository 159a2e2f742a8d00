use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::enums::PatientStatus;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    pub id: i64,
    pub user_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
    pub status: PatientStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Contact fields a patient may change from the profile page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatientProfileUpdate {
    pub phone: Option<String>,
    pub address: Option<String>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
}

impl PatientProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.phone.is_none()
            && self.address.is_none()
            && self.emergency_contact_name.is_none()
            && self.emergency_contact_phone.is_none()
    }
}

/// Onboarding payload used by the admin panel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPatient {
    pub user_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub status: Option<PatientStatus>,
}

/// Row of the admin patient list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientSummary {
    pub id: i64,
    pub user_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub status: PatientStatus,
    pub prosthesis_model: Option<String>,
    /// Mean phase progress of the active plan, 0 when there is none.
    pub plan_progress: i64,
}

/// Admin view of a single patient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientDetail {
    #[serde(flatten)]
    pub patient: Patient,
    pub email: Option<String>,
    pub name: Option<String>,
    pub last_signed_in: NaiveDateTime,
    pub prosthesis: Option<super::Prosthesis>,
}
