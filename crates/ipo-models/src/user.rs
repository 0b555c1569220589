//! Stored user credentials.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered user, keyed by username in the credential store.
///
/// Only the one-way password hash is ever stored, never the plaintext.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    /// Argon2id password hash (PHC string format)
    pub password_hash: String,

    /// When the account was registered
    pub created_at: DateTime<Utc>,
}

impl UserRecord {
    /// Create a record stamped with the current time.
    pub fn new(password_hash: impl Into<String>) -> Self {
        Self {
            password_hash: password_hash.into(),
            created_at: Utc::now(),
        }
    }
}
