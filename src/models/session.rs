use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashMap;

/// Key/value state of a session.
pub type SessionState = HashMap<String, Value>;

/// A persisted session. Only the SHA-256 digest of the client token is stored.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionRecord {
    pub token_hash: String,
    /// Mirrors the `user_id` state entry so the store can cascade user deletion.
    pub user_id: Option<i32>,
    pub state: SessionState,
    pub expires_at: DateTime<Utc>,
}

impl SessionRecord {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}
