//! Credential store: username -> user record, one JSON file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tokio::sync::Mutex;
use tracing::{debug, info};

use ipo_models::UserRecord;

use crate::error::{StoreError, StoreResult};

/// Whole-file JSON store for user credentials.
///
/// `load` and `save` always act on the entire mapping. The mutex guards the
/// load/insert/save cycle in [`register`](Self::register) so two concurrent
/// registrations cannot overwrite each other's writes.
pub struct CredentialStore {
    path: PathBuf,
    write_guard: Mutex<()>,
}

impl CredentialStore {
    /// Create a store backed by the given file. The file need not exist yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_guard: Mutex::new(()),
        }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the full credential mapping. A missing file is an empty mapping.
    pub async fn load(&self) -> StoreResult<BTreeMap<String, UserRecord>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "credential file missing, starting empty");
                Ok(BTreeMap::new())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Overwrite the backing file with the full mapping.
    pub async fn save(&self, users: &BTreeMap<String, UserRecord>) -> StoreResult<()> {
        let json = serde_json::to_vec_pretty(users)?;
        tokio::fs::write(&self.path, json).await?;
        Ok(())
    }

    /// Insert a new user, failing with [`StoreError::Conflict`] if the
    /// username is already taken. The whole read-modify-write cycle runs
    /// under the store's mutex.
    pub async fn register(&self, username: &str, record: UserRecord) -> StoreResult<()> {
        let _guard = self.write_guard.lock().await;

        let mut users = self.load().await?;
        if users.contains_key(username) {
            return Err(StoreError::conflict(username));
        }
        users.insert(username.to_string(), record);
        self.save(&users).await?;

        info!(username, "registered user");
        Ok(())
    }

    /// Look up a single user.
    pub async fn get(&self, username: &str) -> StoreResult<Option<UserRecord>> {
        Ok(self.load().await?.remove(username))
    }
}
