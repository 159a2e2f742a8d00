//! Calendar subscription tokens and feed URLs.
//!
//! A token is the URL-safe base64 (unpadded) form of `userId:patientId`.
//! It is not signed; the feed handler only serves it when the user still
//! owns the patient record it names.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::db::{repository, DatabaseError};

pub const FEED_PATH_PREFIX: &str = "/calendar/feed/";
pub const FEED_SUFFIX: &str = ".ics";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarSubscription {
    pub token: String,
    /// `https://` URL for clients that take a link.
    pub feed_url: String,
    /// Same feed with the `webcal://` scheme, which opens calendar apps.
    pub webcal_url: String,
}

pub fn encode_token(user_id: i64, patient_id: i64) -> String {
    URL_SAFE_NO_PAD.encode(format!("{user_id}:{patient_id}"))
}

/// Inverse of [`encode_token`]. Accepts an optional `.ics` suffix.
pub fn decode_token(token: &str) -> Option<(i64, i64)> {
    let token = token.strip_suffix(FEED_SUFFIX).unwrap_or(token);
    let bytes = URL_SAFE_NO_PAD.decode(token).ok()?;
    let text = String::from_utf8(bytes).ok()?;
    let (user, patient) = text.split_once(':')?;
    Some((user.parse().ok()?, patient.parse().ok()?))
}

pub fn feed_url(app_url: &str, token: &str) -> String {
    format!(
        "{}{FEED_PATH_PREFIX}{token}{FEED_SUFFIX}",
        app_url.trim_end_matches('/')
    )
}

pub fn subscription_for(app_url: &str, user_id: i64, patient_id: i64) -> CalendarSubscription {
    let token = encode_token(user_id, patient_id);
    let feed_url = feed_url(app_url, &token);
    let webcal_url = match feed_url.split_once("://") {
        Some((_, rest)) => format!("webcal://{rest}"),
        None => feed_url.clone(),
    };
    CalendarSubscription {
        token,
        feed_url,
        webcal_url,
    }
}

/// Patient id a feed token grants access to, if the token is well formed
/// and its user still owns that patient.
pub fn resolve_feed_owner(conn: &Connection, token: &str) -> Result<Option<i64>, DatabaseError> {
    let Some((user_id, patient_id)) = decode_token(token) else {
        return Ok(None);
    };
    let owned = repository::get_patient_by_id(conn, patient_id)?
        .is_some_and(|patient| patient.user_id == user_id);
    Ok(owned.then_some(patient_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::fixtures::*;
    use crate::db::sqlite::open_memory_database;

    #[test]
    fn token_round_trips() {
        let token = encode_token(12, 34);
        assert!(!token.contains('='));
        assert_eq!(decode_token(&token), Some((12, 34)));
        assert_eq!(decode_token(&format!("{token}.ics")), Some((12, 34)));
    }

    #[test]
    fn malformed_tokens_decode_to_none() {
        assert_eq!(decode_token("!!!"), None);
        assert_eq!(decode_token(&URL_SAFE_NO_PAD.encode("12-34")), None);
        assert_eq!(decode_token(&URL_SAFE_NO_PAD.encode("a:b")), None);
    }

    #[test]
    fn urls_follow_app_url() {
        let sub = subscription_for("https://portal.example.com/", 1, 2);
        assert_eq!(
            sub.feed_url,
            format!("https://portal.example.com/calendar/feed/{}.ics", sub.token)
        );
        assert!(sub.webcal_url.starts_with("webcal://portal.example.com/calendar/feed/"));
    }

    #[test]
    fn owner_check_rejects_mismatched_user() {
        let conn = open_memory_database().unwrap();
        let (user_id, patient_id) = seed_patient(&conn, "u-1");
        let (other_user, _) = seed_patient(&conn, "u-2");

        let good = encode_token(user_id, patient_id);
        assert_eq!(resolve_feed_owner(&conn, &good).unwrap(), Some(patient_id));

        let forged = encode_token(other_user, patient_id);
        assert_eq!(resolve_feed_owner(&conn, &forged).unwrap(), None);
        assert_eq!(resolve_feed_owner(&conn, &encode_token(user_id, 999)).unwrap(), None);
    }
}
