use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::enums::Role;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub open_id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub login_method: Option<String>,
    pub role: Role,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub last_signed_in: NaiveDateTime,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Identity fields presented at login. `None` leaves a stored value untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserUpsert {
    pub open_id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub login_method: Option<String>,
    pub role: Option<Role>,
    pub last_signed_in: Option<NaiveDateTime>,
}
