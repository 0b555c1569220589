//! Prediction history store: one global append-only sequence, one JSON file.

use std::path::{Path, PathBuf};

use tokio::sync::Mutex;
use tracing::debug;

use ipo_models::HistoryEntry;

use crate::error::StoreResult;

/// Whole-file JSON store for the global prediction history.
///
/// Entries are ordered by insertion and never mutated or deleted. A batch of
/// appends is persisted with a single rewrite of the file.
pub struct HistoryStore {
    path: PathBuf,
    write_guard: Mutex<()>,
}

impl HistoryStore {
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

    /// Load the full history. A missing file is an empty history.
    pub async fn load(&self) -> StoreResult<Vec<HistoryEntry>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "history file missing, starting empty");
                Ok(Vec::new())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Overwrite the backing file with the full history.
    pub async fn save(&self, history: &[HistoryEntry]) -> StoreResult<()> {
        let json = serde_json::to_vec_pretty(history)?;
        tokio::fs::write(&self.path, json).await?;
        Ok(())
    }

    /// Append a batch of entries, rewriting the file once for the whole
    /// batch. The read-extend-save cycle runs under the store's mutex.
    pub async fn append_batch(&self, entries: Vec<HistoryEntry>) -> StoreResult<()> {
        if entries.is_empty() {
            return Ok(());
        }
        let _guard = self.write_guard.lock().await;

        let mut history = self.load().await?;
        history.extend(entries);
        self.save(&history).await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use ipo_models::PredictionResult;

    use super::*;

    fn entry(user: &str, ticker: &str) -> HistoryEntry {
        HistoryEntry::new(
            user,
            PredictionResult {
                ticker: ticker.to_string(),
                predicted_firstday_pct: 1.5,
                inputs: BTreeMap::new(),
            },
        )
    }

    #[tokio::test]
    async fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(dir.path().join("pred_history.json"));
        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn appends_preserve_order_across_users() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(dir.path().join("pred_history.json"));

        store
            .append_batch(vec![entry("alice", "AAA"), entry("alice", "BBB")])
            .await
            .unwrap();
        store.append_batch(vec![entry("bob", "CCC")]).await.unwrap();

        let history = store.load().await.unwrap();
        let users: Vec<&str> = history.iter().map(|e| e.user.as_str()).collect();
        let tickers: Vec<&str> = history.iter().map(|e| e.result.ticker.as_str()).collect();
        assert_eq!(users, ["alice", "alice", "bob"]);
        assert_eq!(tickers, ["AAA", "BBB", "CCC"]);
    }

    #[tokio::test]
    async fn empty_batch_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(dir.path().join("pred_history.json"));

        store.append_batch(Vec::new()).await.unwrap();
        // No file should have been created for an empty batch.
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn concurrent_batches_do_not_lose_entries() {
        let dir = tempfile::tempdir().unwrap();
        let store = std::sync::Arc::new(HistoryStore::new(dir.path().join("pred_history.json")));

        let mut handles = Vec::new();
        for i in 0..4 {
            let store = std::sync::Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store
                    .append_batch(vec![entry("alice", &format!("T{i}"))])
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(store.load().await.unwrap().len(), 4);
    }
}
