//! Application state.

use std::sync::Arc;

use tracing::warn;

use ipo_engine::ModelArtifact;
use ipo_store::{CredentialStore, HistoryStore};

use crate::auth::TokenService;
use crate::config::ApiConfig;
use crate::services::PredictionService;

/// Shared application state.
///
/// The model artifact is loaded here, once, before the server accepts any
/// request, and is immutable for the process lifetime.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub users: Arc<CredentialStore>,
    pub history: Arc<HistoryStore>,
    pub artifact: Arc<ModelArtifact>,
    pub tokens: Arc<TokenService>,
    pub predictions: PredictionService,
}

impl AppState {
    /// Create new application state.
    pub fn new(config: ApiConfig) -> Result<Self, Box<dyn std::error::Error>> {
        if config.uses_default_secret() {
            if config.is_production() {
                return Err("SECRET_KEY must be set in production; refusing to start \
                            with the default placeholder secret"
                    .into());
            }
            warn!("SECRET_KEY is the default placeholder; do not deploy this configuration");
        }

        let artifact = Arc::new(ModelArtifact::load(&config.model_artifact_path)?);
        let users = Arc::new(CredentialStore::new(&config.users_store_path));
        let history = Arc::new(HistoryStore::new(&config.history_store_path));
        let tokens = Arc::new(TokenService::new(
            &config.secret_key,
            config.token_ttl_days,
        ));
        let predictions = PredictionService::new(Arc::clone(&artifact), Arc::clone(&history));

        Ok(Self {
            config,
            users,
            history,
            artifact,
            tokens,
            predictions,
        })
    }
}
