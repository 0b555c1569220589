//! Prediction results and history entries.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The outcome of a single prediction.
///
/// Immutable once created. `inputs` is keyed by the model artifact's feature
/// columns and holds the encoded values actually fed to the predictor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Ticker symbol the prediction is for
    pub ticker: String,

    /// Predicted first-day price change, in percent
    pub predicted_firstday_pct: f64,

    /// Encoded feature values, keyed by feature column
    pub inputs: BTreeMap<String, f64>,
}

/// One entry in the global prediction history.
///
/// Append-only and ordered by insertion; the history is a single global
/// sequence, not partitioned per user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Username the prediction is attributed to
    pub user: String,

    /// When the prediction was made
    pub time: DateTime<Utc>,

    /// The prediction itself
    pub result: PredictionResult,
}

impl HistoryEntry {
    /// Create an entry stamped with the current time.
    pub fn new(user: impl Into<String>, result: PredictionResult) -> Self {
        Self {
            user: user.into(),
            time: Utc::now(),
            result,
        }
    }
}
