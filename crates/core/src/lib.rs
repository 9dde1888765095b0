//! Core shared types for steamstats
//!
//! This crate contains:
//! - Steam payload models and the derived views served to clients
//! - Pure derivation folds (sorting, tallying, pricing)
//! - Error types
//! - The `SteamSource` capability trait (with `async` feature)

pub mod models;
pub mod stats;
pub mod error;

#[cfg(feature = "async")]
pub mod source;

pub use models::*;
pub use error::*;

#[cfg(feature = "async")]
pub use source::*;
