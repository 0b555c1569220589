//! API configuration.

use std::path::PathBuf;

/// The compiled-in signing secret. Only acceptable for local development;
/// startup refuses it outright in production.
pub const DEFAULT_SECRET: &str = "change-this-secret-for-prod";

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// CORS origins
    pub cors_origins: Vec<String>,
    /// Max request body size
    pub max_body_size: usize,
    /// Environment (development/production)
    pub environment: String,
    /// Token signing secret
    pub secret_key: String,
    /// Token lifetime in days
    pub token_ttl_days: i64,
    /// Credential store file
    pub users_store_path: PathBuf,
    /// Prediction history file
    pub history_store_path: PathBuf,
    /// Model artifact file
    pub model_artifact_path: PathBuf,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_origins: vec!["*".to_string()],
            max_body_size: 2 * 1024 * 1024, // 2MB
            environment: "development".to_string(),
            secret_key: DEFAULT_SECRET.to_string(),
            token_ttl_days: 7,
            users_store_path: PathBuf::from("users_store.json"),
            history_store_path: PathBuf::from("pred_history.json"),
            model_artifact_path: PathBuf::from("models/model_artifact.json"),
        }
    }
}

impl ApiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("API_HOST").unwrap_or(defaults.host),
            port: std::env::var("API_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.port),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or(defaults.cors_origins),
            max_body_size: std::env::var("MAX_BODY_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_body_size),
            environment: std::env::var("ENVIRONMENT").unwrap_or(defaults.environment),
            secret_key: std::env::var("SECRET_KEY").unwrap_or(defaults.secret_key),
            token_ttl_days: std::env::var("TOKEN_TTL_DAYS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.token_ttl_days),
            users_store_path: std::env::var("USERS_STORE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.users_store_path),
            history_store_path: std::env::var("HISTORY_STORE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.history_store_path),
            model_artifact_path: std::env::var("MODEL_ARTIFACT_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.model_artifact_path),
        }
    }

    /// Check if running in production mode.
    pub fn is_production(&self) -> bool {
        self.environment.to_lowercase() == "production"
    }

    /// True when the signing secret is still the compiled-in placeholder.
    pub fn uses_default_secret(&self) -> bool {
        self.secret_key == DEFAULT_SECRET
    }
}
