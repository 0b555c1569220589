//! Flat-file JSON stores for the IPO predictor backend.
//!
//! This crate provides:
//! - [`CredentialStore`]: username -> [`UserRecord`](ipo_models::UserRecord)
//! - [`HistoryStore`]: the global, append-only prediction history
//!
//! Both stores hold a whole collection in a single human-readable JSON file
//! that is rewritten in full on every mutation. Each store serializes its
//! read-modify-write cycle behind an async mutex, so concurrent mutators
//! cannot lose each other's updates.

pub mod credentials;
pub mod error;
pub mod history;

pub use credentials::CredentialStore;
pub use error::{StoreError, StoreResult};
pub use history::HistoryStore;
