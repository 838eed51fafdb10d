//! Error types for wnav-tracker
//!
//! Transport failures from reqwest map to [`Error::Network`].

use thiserror::Error;

/// Main error type for the tracking engine
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration loading or validation errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Errors bubbled up from wnav-common (polyline decode, config parse)
    #[error(transparent)]
    Common(#[from] wnav_common::Error),

    /// Routing backend answered but reported a failure
    #[error("Routing failed: {0}")]
    Routing(String),

    /// Routing backend could not be reached or answered with a bad status
    #[error("Network error: {0}")]
    Network(String),

    /// Route geometry unusable (empty, too short or undecodable)
    #[error("Invalid route: {0}")]
    InvalidRoute(String),

    /// Invalid state for operation
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// A fix that cannot be matched (non-finite or out-of-range coordinate)
    #[error("Invalid position fix: {0}")]
    InvalidFix(String),
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Network(e.to_string())
    }
}

/// Convenience Result type using wnav-tracker Error
pub type Result<T> = std::result::Result<T, Error>;
