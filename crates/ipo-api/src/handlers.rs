//! Request handlers.

pub mod auth;
pub mod health;
pub mod history;
pub mod predict;

pub use auth::*;
pub use health::*;
pub use history::*;
pub use predict::*;
