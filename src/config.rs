use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

/// Application-level constants
pub const APP_NAME: &str = "Ortho Portal";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const DEFAULT_APP_URL: &str = "http://localhost:3000";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_SESSION_TTL_HOURS: u64 = 720;
pub const DEFAULT_REMINDER_INTERVAL_SECS: u64 = 300;
pub const MAX_SESSION_TTL_HOURS: u64 = 24 * 365;
pub const MAX_REMINDER_INTERVAL_SECS: u64 = 24 * 3600;
pub const DEFAULT_CLINIC_LOCATION: &str = "Dubai Healthcare City, Building 47, Dubai, UAE";

/// Tracing filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "ortho_portal=info,tower_http=warn"
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value:?} ({reason})")]
    InvalidValue {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Runtime configuration read from the environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// SQLite file. `None` runs the portal without a database.
    pub database_path: Option<PathBuf>,
    /// Public base URL, no trailing slash.
    pub app_url: String,
    pub owner_open_id: Option<String>,
    pub bind_addr: SocketAddr,
    /// Shared secret the identity bridge presents on login.
    pub auth_bridge_secret: Option<String>,
    pub session_ttl_hours: u64,
    pub reminder_interval_secs: u64,
    /// Location used for calendar events that do not name one.
    pub clinic_location: String,
}

impl AppConfig {
    /// Load `.env` (if present) and read the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let bind_raw = get("PORTAL_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.into());
        let bind_addr = bind_raw.parse().map_err(|e: std::net::AddrParseError| {
            ConfigError::InvalidValue {
                var: "PORTAL_BIND_ADDR",
                value: bind_raw.clone(),
                reason: e.to_string(),
            }
        })?;

        Ok(Self {
            database_path: get("DATABASE_URL").map(|url| database_path_from_url(&url)),
            app_url: get("APP_URL")
                .unwrap_or_else(|| DEFAULT_APP_URL.into())
                .trim_end_matches('/')
                .to_string(),
            owner_open_id: get("OWNER_OPEN_ID"),
            bind_addr,
            auth_bridge_secret: get("AUTH_BRIDGE_SECRET"),
            session_ttl_hours: parse_positive(
                "SESSION_TTL_HOURS",
                get("SESSION_TTL_HOURS"),
                DEFAULT_SESSION_TTL_HOURS,
                MAX_SESSION_TTL_HOURS,
            )?,
            reminder_interval_secs: parse_positive(
                "REMINDER_INTERVAL_SECS",
                get("REMINDER_INTERVAL_SECS"),
                DEFAULT_REMINDER_INTERVAL_SECS,
                MAX_REMINDER_INTERVAL_SECS,
            )?,
            clinic_location: get("CLINIC_LOCATION")
                .unwrap_or_else(|| DEFAULT_CLINIC_LOCATION.into()),
        })
    }

    /// Host part of `app_url`, used in calendar UIDs.
    pub fn host(&self) -> &str {
        let without_scheme = self
            .app_url
            .split_once("://")
            .map(|(_, rest)| rest)
            .unwrap_or(&self.app_url);
        without_scheme
            .split(['/', ':'])
            .next()
            .filter(|h| !h.is_empty())
            .unwrap_or("localhost")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            app_url: DEFAULT_APP_URL.into(),
            owner_open_id: None,
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            auth_bridge_secret: None,
            session_ttl_hours: DEFAULT_SESSION_TTL_HOURS,
            reminder_interval_secs: DEFAULT_REMINDER_INTERVAL_SECS,
            clinic_location: DEFAULT_CLINIC_LOCATION.into(),
        }
    }
}

/// Accepts a bare path or a `sqlite://` / `sqlite:` URL. A leading `~/`
/// is expanded against the home directory.
fn database_path_from_url(url: &str) -> PathBuf {
    let path = url
        .strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"))
        .unwrap_or(url);
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}

/// A value in `1..=max`, or `default` when unset.
fn parse_positive(
    var: &'static str,
    raw: Option<String>,
    default: u64,
    max: u64,
) -> Result<u64, ConfigError> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    match raw.parse::<u64>() {
        Ok(n) if (1..=max).contains(&n) => Ok(n),
        Ok(_) => Err(ConfigError::InvalidValue {
            var,
            value: raw,
            reason: format!("must be between 1 and {max}"),
        }),
        Err(e) => Err(ConfigError::InvalidValue {
            var,
            reason: e.to_string(),
            value: raw,
        }),
    }
}
