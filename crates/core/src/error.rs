//! Error types for steamstats

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StatsError {
    /// Transport failure or non-2xx reply from Steam.
    #[error("Steam API unavailable{}: {message}", status_suffix(.status))]
    UpstreamUnavailable { status: Option<u16>, message: String },

    #[error("Unexpected Steam API response: {reason}")]
    UpstreamMalformed { reason: String },

    #[error("{0} not found")]
    NotFound(String),

    #[error("{0} parameter is required")]
    MissingInput(&'static str),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Account creation date not available")]
    MissingCreationDate,

    /// Account is too young for a per-week average to mean anything.
    #[error("Account age too short to compute a weekly average")]
    DivisionUndefined,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl StatsError {
    pub fn unavailable(status: Option<u16>, message: impl Into<String>) -> Self {
        StatsError::UpstreamUnavailable { status, message: message.into() }
    }

    pub fn malformed(reason: impl Into<String>) -> Self {
        StatsError::UpstreamMalformed { reason: reason.into() }
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" ({})", s)).unwrap_or_default()
}

pub type Result<T> = std::result::Result<T, StatsError>;
