//! Shared application state handed to every HTTP handler and to the
//! reminder scheduler.
//!
//! `CoreState` owns the configuration and knows how to reach the
//! database. Handlers never open connections themselves; they go through
//! [`CoreState::with_db`], which turns "no database" into empty results.

use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};

use crate::config::AppConfig;
use crate::db::{self, DatabaseError};

pub struct CoreState {
    pub config: AppConfig,
}

impl CoreState {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn db_path(&self) -> Option<&Path> {
        self.config.database_path.as_deref()
    }

    /// Open a connection (migrations are applied on open).
    pub fn open_db(&self) -> Result<rusqlite::Connection, CoreError> {
        let path = self.db_path().ok_or(CoreError::DatabaseUnavailable)?;
        db::open_database(path).map_err(CoreError::Database)
    }

    /// Run `op` against a fresh connection.
    ///
    /// When the database is not configured or cannot be opened the
    /// failure is logged and `T::default()` is returned, so callers see
    /// `None` / empty lists. Errors raised by `op` itself propagate.
    pub fn with_db<T, F>(&self, op: F) -> Result<T, CoreError>
    where
        T: Default,
        F: FnOnce(&rusqlite::Connection) -> Result<T, DatabaseError>,
    {
        let conn = match self.open_db() {
            Ok(conn) => conn,
            Err(e) => {
                tracing::warn!(error = %e, "Database unavailable, returning empty result");
                return Ok(T::default());
            }
        };
        op(&conn).map_err(CoreError::Database)
    }

    /// Like [`with_db`](Self::with_db) but an unavailable database is an
    /// error. Used where an empty answer would be wrong (login).
    pub fn require_db<T, F>(&self, op: F) -> Result<T, CoreError>
    where
        F: FnOnce(&rusqlite::Connection) -> Result<T, DatabaseError>,
    {
        let conn = match self.open_db() {
            Ok(conn) => conn,
            Err(CoreError::Database(e)) => {
                tracing::warn!(error = %e, "Failed to open database");
                return Err(CoreError::DatabaseUnavailable);
            }
            Err(e) => return Err(e),
        };
        op(&conn).map_err(CoreError::Database)
    }

    pub fn now(&self) -> NaiveDateTime {
        db::now_utc()
    }

    pub fn today(&self) -> NaiveDate {
        self.now().date()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Database is not available")]
    DatabaseUnavailable,
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}
