//! Model artifact loading, feature encoding, and prediction.
//!
//! This crate provides:
//! - [`ModelArtifact`]: the durable bundle of trained model + metadata,
//!   loaded once at startup and immutable thereafter
//! - [`encoder`]: the pure listing-record -> feature-vector transform
//! - [`Model`]: the predictor (tree ensemble or linear) with optional
//!   per-instance explanation and global feature importances
//! - [`train`]: the offline fitting used by the `ipo-train` binary

pub mod artifact;
pub mod encoder;
pub mod error;
pub mod model;
pub mod train;

pub use artifact::ModelArtifact;
pub use encoder::{encode_features, UNKNOWN_CATEGORY_CODE};
pub use error::{EngineError, EngineResult};
pub use model::{Forest, Linear, Model, Node, Tree};
pub use train::TrainConfig;
