//! Axum HTTP API server for the IPO first-day predictor.
//!
//! This crate provides:
//! - Registration and login with Argon2id password hashing
//! - Signed, time-limited bearer tokens (HS256)
//! - Batch prediction, explanation, and global history endpoints

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use services::PredictionService;
pub use state::AppState;
