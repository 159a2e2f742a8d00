use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prosthesis {
    pub id: i64,
    pub patient_id: i64,
    pub serial_number: String,
    pub model: String,
    pub manufacturer: Option<String>,
    pub side: Option<String>,
    pub implant_date: Option<NaiveDate>,
    pub warranty_expires_at: Option<NaiveDate>,
    pub created_at: NaiveDateTime,
}

/// A document attached to the implant record (certificate, warranty, reports).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProsthesisDocument {
    pub id: i64,
    pub name: String,
    pub date: Option<NaiveDate>,
    pub format: String,
}
