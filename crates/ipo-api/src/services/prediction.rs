//! Batch prediction and explanation orchestration.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::warn;

use ipo_engine::{encode_features, ModelArtifact};
use ipo_models::{HistoryEntry, ListingRecord, PredictionResult};
use ipo_store::HistoryStore;

use crate::error::ApiResult;

/// Runs prediction batches against the loaded artifact and records them in
/// the history store.
#[derive(Clone)]
pub struct PredictionService {
    artifact: Arc<ModelArtifact>,
    history: Arc<HistoryStore>,
}

impl PredictionService {
    pub fn new(artifact: Arc<ModelArtifact>, history: Arc<HistoryStore>) -> Self {
        Self { artifact, history }
    }

    /// Predict each item independently, then persist the whole batch's
    /// history entries with a single store rewrite.
    ///
    /// One record's predictor failure never fails the batch: that record
    /// gets a 0.0 prediction and the rest proceed untouched.
    pub async fn predict_batch(
        &self,
        user: &str,
        items: &[ListingRecord],
    ) -> ApiResult<Vec<PredictionResult>> {
        let mut results = Vec::with_capacity(items.len());
        let mut entries = Vec::with_capacity(items.len());

        for item in items {
            let vector = encode_features(item, &self.artifact);
            let predicted = match self.artifact.model.predict(&vector) {
                Ok(value) => value,
                Err(e) => {
                    warn!(ticker = %item.ticker, error = %e, "prediction failed, defaulting to 0.0");
                    0.0
                }
            };

            let result = PredictionResult {
                ticker: item.ticker.clone(),
                predicted_firstday_pct: predicted,
                inputs: self.named_inputs(&vector),
            };
            entries.push(HistoryEntry::new(user, result.clone()));
            results.push(result);
        }

        self.history.append_batch(entries).await?;
        Ok(results)
    }

    /// Best-effort per-feature explanation scores for each item.
    ///
    /// Falls back from per-instance attributions to the model's global
    /// importances (identical for every item), and finally to all zeros.
    pub fn explain_batch(&self, items: &[ListingRecord]) -> Vec<BTreeMap<String, f64>> {
        items
            .iter()
            .map(|item| {
                let vector = encode_features(item, &self.artifact);
                let scores = self
                    .artifact
                    .model
                    .explain(&vector)
                    .or_else(|| self.artifact.model.feature_importances())
                    .unwrap_or_else(|| vec![0.0; self.artifact.feature_columns.len()]);

                self.artifact
                    .feature_columns
                    .iter()
                    .cloned()
                    .zip(scores)
                    .collect()
            })
            .collect()
    }

    fn named_inputs(&self, vector: &[f64]) -> BTreeMap<String, f64> {
        self.artifact
            .feature_columns
            .iter()
            .cloned()
            .zip(vector.iter().copied())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use ipo_engine::{Forest, Model};

    use super::*;

    fn artifact(model: Model) -> Arc<ModelArtifact> {
        Arc::new(ModelArtifact {
            model,
            feature_columns: [
                "issue_price",
                "listing_month",
                "listing_day",
                "exchange_code",
                "sector_code",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            category_maps: BTreeMap::from([
                (
                    "exchange".to_string(),
                    vec!["BSE".into(), "NSE".into(), "OTH".into()],
                ),
                (
                    "sector".to_string(),
                    vec!["FIN".into(), "TECH".into()],
                ),
            ]),
        })
    }

    fn item(ticker: &str) -> ListingRecord {
        ListingRecord {
            ticker: ticker.to_string(),
            issue_price: 100.0,
            listing_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            exchange: Some("NSE".to_string()),
            sector: None,
        }
    }

    fn service(model: Model, dir: &tempfile::TempDir) -> PredictionService {
        PredictionService::new(
            artifact(model),
            Arc::new(HistoryStore::new(dir.path().join("pred_history.json"))),
        )
    }

    #[tokio::test]
    async fn failing_predictor_defaults_to_zero_without_failing_the_batch() {
        let dir = tempfile::tempdir().unwrap();
        // An empty ensemble fails every predict call.
        let svc = service(
            Model::Forest(Forest {
                trees: vec![],
                feature_importances: None,
            }),
            &dir,
        );

        let results = svc
            .predict_batch("alice", &[item("AAA"), item("BBB"), item("CCC")])
            .await
            .unwrap();

        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|r| r.predicted_firstday_pct == 0.0));
        assert_eq!(results[1].ticker, "BBB");
        // Inputs are still recorded for the failed predictions.
        assert_eq!(results[0].inputs["exchange_code"], 1.0);
        assert_eq!(results[0].inputs["sector_code"], -1.0);
    }

    #[tokio::test]
    async fn batch_writes_history_once_in_input_order() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(
            Model::Forest(Forest {
                trees: vec![],
                feature_importances: None,
            }),
            &dir,
        );

        svc.predict_batch("alice", &[item("AAA"), item("BBB")])
            .await
            .unwrap();

        let history = HistoryStore::new(dir.path().join("pred_history.json"))
            .load()
            .await
            .unwrap();
        let tickers: Vec<&str> = history.iter().map(|e| e.result.ticker.as_str()).collect();
        assert_eq!(tickers, ["AAA", "BBB"]);
        assert!(history.iter().all(|e| e.user == "alice"));
    }

    #[tokio::test]
    async fn explanations_fall_back_to_zeros_when_model_has_nothing() {
        let dir = tempfile::tempdir().unwrap();
        // Empty forest: no per-instance explainer, no stored importances.
        let svc = service(
            Model::Forest(Forest {
                trees: vec![],
                feature_importances: None,
            }),
            &dir,
        );

        let explanations = svc.explain_batch(&[item("AAA")]);
        assert_eq!(explanations.len(), 1);
        assert_eq!(explanations[0].len(), 5);
        assert!(explanations[0].values().all(|v| *v == 0.0));
    }

    #[tokio::test]
    async fn explanations_use_global_importances_when_no_explainer() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(
            Model::Forest(Forest {
                trees: vec![],
                feature_importances: Some(vec![0.4, 0.3, 0.1, 0.1, 0.1]),
            }),
            &dir,
        );

        let explanations = svc.explain_batch(&[item("AAA"), item("BBB")]);
        assert_eq!(explanations[0]["issue_price"], 0.4);
        // Model-level scores repeat for every item.
        assert_eq!(explanations[0], explanations[1]);
    }
}
