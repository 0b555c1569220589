//! Shared data models for the IPO predictor backend.
//!
//! This crate provides Serde-serializable types for:
//! - Listing records submitted for prediction
//! - Prediction results and history entries
//! - Stored user credentials

pub mod listing;
pub mod prediction;
pub mod user;

// Re-export common types
pub use listing::ListingRecord;
pub use prediction::{HistoryEntry, PredictionResult};
pub use user::UserRecord;
