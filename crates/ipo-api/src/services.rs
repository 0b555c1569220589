//! Request-level services.

pub mod prediction;

pub use prediction::PredictionService;
