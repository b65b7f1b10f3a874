//! Bearer session tokens.
//!
//! Issued after a completed OAuth login and validated on every request. The
//! domain services only ever see the resolved user id.

use std::collections::HashMap;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use parking_lot::RwLock;
use sha2::{Digest, Sha256};

use crate::error::{Result, ServiceError, TokenFailure};

/// An issued session
#[derive(Clone, Debug)]
pub struct Session {
    pub token: String,
    pub user_id: i32,
    pub expires_at: SystemTime,
}

impl Session {
    fn new(user_id: i32, duration: Duration) -> Self {
        Self {
            token: generate_token(),
            user_id,
            expires_at: SystemTime::now() + duration,
        }
    }

    pub fn is_expired(&self) -> bool {
        SystemTime::now() > self.expires_at
    }
}

/// Generate a random-looking session token from process-local entropy.
fn generate_token() -> String {
    let mut hasher = Sha256::new();

    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    hasher.update(timestamp.to_le_bytes());

    let thread_id = std::thread::current().id();
    hasher.update(format!("{:?}", thread_id).as_bytes());

    let stack_addr = &timestamp as *const _ as usize;
    hasher.update(stack_addr.to_le_bytes());

    let result = hasher.finalize();
    BASE64.encode(&result[..24])
}

/// Session manager
pub struct SessionManager {
    sessions: RwLock<HashMap<String, Session>>,
    session_duration: Duration,
}

impl SessionManager {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            session_duration: Duration::from_secs(24 * 60 * 60),
        }
    }

    /// Issue a new session for a logged-in user.
    pub fn issue(&self, user_id: i32) -> Session {
        let session = Session::new(user_id, self.session_duration);
        let mut sessions = self.sessions.write();
        sessions.insert(session.token.clone(), session.clone());
        session
    }

    /// Validate a raw session token, returning the user id.
    pub fn validate(&self, token: &str) -> Result<i32> {
        let sessions = self.sessions.read();
        let session = sessions
            .get(token)
            .ok_or_else(|| ServiceError::Token(TokenFailure::Invalid("invalid session".into())))?;
        if session.is_expired() {
            return Err(ServiceError::Token(TokenFailure::Invalid(
                "session expired".into(),
            )));
        }
        Ok(session.user_id)
    }

    /// Validate an `Authorization: Bearer <token>` header value.
    pub fn validate_bearer(&self, auth_header: &str) -> Result<i32> {
        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| ServiceError::Token(TokenFailure::Invalid("invalid session".into())))?;
        self.validate(token)
    }

    pub fn revoke(&self, token: &str) {
        let mut sessions = self.sessions.write();
        sessions.remove(token);
    }

    /// Drop expired sessions.
    pub fn cleanup_expired(&self) {
        let mut sessions = self.sessions.write();
        sessions.retain(|_, s| !s.is_expired());
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}
