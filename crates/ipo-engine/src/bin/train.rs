//! One-shot offline training job: fits the model and writes the artifact.

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ipo_engine::{train, TrainConfig};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let out_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "models/model_artifact.json".to_string());

    let config = TrainConfig::default();
    let artifact = train::train_artifact(&config);
    artifact
        .save(&out_path)
        .with_context(|| format!("failed to write artifact to {out_path}"))?;

    info!(path = %out_path, "model artifact written");
    Ok(())
}
