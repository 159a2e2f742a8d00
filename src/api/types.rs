//! Shared types for the portal API layer.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::config::MAX_SESSION_TTL_HOURS;
use crate::core_state::CoreState;
use crate::models::User;

use super::error::ApiError;

/// Cookie carrying the session token for browser clients.
pub const SESSION_COOKIE: &str = "portal_session";

// ═══════════════════════════════════════════════════════════
// API context
// ═══════════════════════════════════════════════════════════

/// Shared context for all API routes and middleware.
/// Wraps `CoreState` plus the in-memory session store.
#[derive(Clone)]
pub struct ApiContext {
    pub core: Arc<CoreState>,
    pub sessions: Arc<Mutex<SessionStore>>,
}

impl ApiContext {
    pub fn new(core: Arc<CoreState>) -> Self {
        let ttl = Duration::from_secs(core.config.session_ttl_hours.saturating_mul(3600));
        Self {
            core,
            sessions: Arc::new(Mutex::new(SessionStore::new(ttl))),
        }
    }

    pub fn sessions(&self) -> Result<MutexGuard<'_, SessionStore>, ApiError> {
        self.sessions
            .lock()
            .map_err(|_| ApiError::Internal("session store lock poisoned".into()))
    }
}

// ═══════════════════════════════════════════════════════════
// User context
// ═══════════════════════════════════════════════════════════

/// Authenticated caller, inserted into request extensions by the auth
/// middleware after the session token resolved to a stored user.
#[derive(Debug, Clone)]
pub struct UserContext {
    pub user: User,
}

impl UserContext {
    pub fn user_id(&self) -> i64 {
        self.user.id
    }
}

// ═══════════════════════════════════════════════════════════
// Session store
// ═══════════════════════════════════════════════════════════

struct Session {
    user_id: i64,
    expires_at: Instant,
}

/// Sessions keyed by the SHA-256 of their token. Raw tokens are never kept.
pub struct SessionStore {
    sessions: HashMap<[u8; 32], Session>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: HashMap::new(),
            ttl,
        }
    }

    /// Open a session for `user_id` and return its bearer token.
    pub fn create(&mut self, user_id: i64) -> String {
        self.cleanup();
        let token = generate_token();
        self.sessions.insert(
            hash_token(&token),
            Session {
                user_id,
                expires_at: self.expiry_from(Instant::now()),
            },
        );
        token
    }

    /// `now + ttl`, capped at the longest configurable lifetime.
    fn expiry_from(&self, now: Instant) -> Instant {
        let cap = Duration::from_secs(MAX_SESSION_TTL_HOURS * 3600);
        now.checked_add(self.ttl.min(cap)).unwrap_or(now)
    }

    /// User id behind a live token. Expired sessions are dropped on sight.
    pub fn resolve(&mut self, token: &str) -> Option<i64> {
        let key = hash_token(token);
        let session = self.sessions.get(&key)?;
        if Instant::now() >= session.expires_at {
            self.sessions.remove(&key);
            return None;
        }
        Some(session.user_id)
    }

    /// Returns `true` if a session was removed.
    pub fn revoke(&mut self, token: &str) -> bool {
        self.sessions.remove(&hash_token(token)).is_some()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn cleanup(&mut self) {
        let now = Instant::now();
        self.sessions.retain(|_, s| now < s.expires_at);
    }
}

/// Hash a bearer token string using SHA-256.
pub fn hash_token(token: &str) -> [u8; 32] {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hasher.finalize().into()
}

/// Generate a random bearer token (URL-safe base64, 32 bytes of entropy).
pub fn generate_token() -> String {
    use base64::Engine;
    let bytes: [u8; 32] = rand::random();
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    #[test]
    fn tokens_are_unique_and_url_safe() {
        let a = generate_token();
        let b = generate_token();
        assert_ne!(a, b);
        assert_eq!(a.len(), 43);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn hash_is_deterministic() {
        assert_eq!(hash_token("abc"), hash_token("abc"));
        assert_ne!(hash_token("abc"), hash_token("abd"));
    }

    #[test]
    fn session_lifecycle() {
        let mut store = SessionStore::new(Duration::from_secs(60));
        let token = store.create(7);
        assert_eq!(store.resolve(&token), Some(7));
        assert_eq!(store.resolve("not-a-token"), None);
        assert!(store.revoke(&token));
        assert!(!store.revoke(&token));
        assert_eq!(store.resolve(&token), None);
        assert!(store.is_empty());
    }

    #[test]
    fn huge_ttl_does_not_overflow() {
        let mut store = SessionStore::new(Duration::MAX);
        let token = store.create(7);
        assert_eq!(store.resolve(&token), Some(7));

        let mut config = AppConfig::default();
        config.session_ttl_hours = u64::MAX;
        let ctx = ApiContext::new(Arc::new(CoreState::new(config)));
        let token = ctx.sessions().unwrap().create(9);
        assert_eq!(ctx.sessions().unwrap().resolve(&token), Some(9));
    }

    #[test]
    fn expired_sessions_are_rejected_and_dropped() {
        let mut store = SessionStore::new(Duration::ZERO);
        let token = store.create(7);
        assert_eq!(store.resolve(&token), None);
        assert_eq!(store.len(), 0);
    }
}
