pub mod sqlite;
pub mod repository;

pub use sqlite::*;
pub use repository::*;

use chrono::{NaiveDateTime, Timelike, Utc};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: String, id: String },

    #[error("Invalid enum value for {field}: {value}")]
    InvalidEnum { field: String, value: String },

    #[error("Migration failed at version {version}: {reason}")]
    MigrationFailed { version: i64, reason: String },

    #[error("Constraint violated: {0}")]
    ConstraintViolation(String),
}

/// Current UTC time truncated to whole seconds.
///
/// Every timestamp column holds `YYYY-MM-DD HH:MM:SS` text, so values
/// written through this helper compare correctly against `datetime('now')`.
pub fn now_utc() -> NaiveDateTime {
    let now = Utc::now().naive_utc();
    now.with_nanosecond(0).unwrap_or(now)
}
