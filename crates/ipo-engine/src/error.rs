//! Engine error types.

use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors that can occur while loading the artifact or predicting.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Model artifact not found at {0}; run ipo-train to create it")]
    ArtifactMissing(String),

    #[error("Invalid model artifact: {0}")]
    InvalidArtifact(String),

    #[error("Prediction failed: {0}")]
    Prediction(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EngineError {
    pub fn invalid_artifact(msg: impl Into<String>) -> Self {
        Self::InvalidArtifact(msg.into())
    }

    pub fn prediction(msg: impl Into<String>) -> Self {
        Self::Prediction(msg.into())
    }
}
