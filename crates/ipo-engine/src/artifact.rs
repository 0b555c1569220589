//! The model artifact: trained predictor plus the metadata needed to feed it.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{EngineError, EngineResult};
use crate::model::Model;

/// Categorical input fields that must have a category map in the artifact.
pub const CATEGORICAL_FIELDS: [&str; 2] = ["exchange", "sector"];

/// The durable bundle produced by `ipo-train` and loaded once at service
/// startup. Read-only for the process lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    /// The trained predictor
    pub model: Model,

    /// Feature columns, in the exact order the predictor expects
    pub feature_columns: Vec<String>,

    /// Known category values per categorical field; a value's index in the
    /// list is its integer code
    pub category_maps: BTreeMap<String, Vec<String>>,
}

impl ModelArtifact {
    /// Load and validate an artifact from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> EngineResult<Self> {
        let path = path.as_ref();
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(EngineError::ArtifactMissing(path.display().to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        let artifact: Self = serde_json::from_slice(&bytes)?;
        artifact.validate()?;

        info!(
            path = %path.display(),
            columns = artifact.feature_columns.len(),
            "loaded model artifact"
        );
        Ok(artifact)
    }

    /// Write the artifact as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> EngineResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_vec_pretty(self)?)?;
        Ok(())
    }

    /// Structural validation, run at load time so a bad artifact fails the
    /// process at startup instead of the first request.
    ///
    /// Category maps are required for every categorical field: encoding
    /// without one would have to invent codes from the data it happens to
    /// see, which is not deterministic across calls.
    pub fn validate(&self) -> EngineResult<()> {
        if self.feature_columns.is_empty() {
            return Err(EngineError::invalid_artifact("no feature columns"));
        }
        for field in CATEGORICAL_FIELDS {
            match self.category_maps.get(field) {
                Some(values) if !values.is_empty() => {}
                Some(_) => {
                    return Err(EngineError::invalid_artifact(format!(
                        "empty category map for '{field}'"
                    )));
                }
                None => {
                    return Err(EngineError::invalid_artifact(format!(
                        "missing category map for '{field}'"
                    )));
                }
            }
        }

        let width = self.feature_columns.len();
        match &self.model {
            Model::Forest(forest) => {
                if let Some(importances) = &forest.feature_importances {
                    if importances.len() != width {
                        return Err(EngineError::invalid_artifact(format!(
                            "feature importances have {} entries for {width} columns",
                            importances.len()
                        )));
                    }
                }
            }
            Model::Linear(linear) => {
                if linear.weights.len() != width {
                    return Err(EngineError::invalid_artifact(format!(
                        "linear model has {} weights for {width} columns",
                        linear.weights.len()
                    )));
                }
            }
        }
        Ok(())
    }

    /// Category list for a field, empty when absent. Validation guarantees
    /// presence for the known categorical fields.
    pub fn categories(&self, field: &str) -> &[String] {
        self.category_maps
            .get(field)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}
