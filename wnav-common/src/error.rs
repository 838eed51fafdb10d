//! Common error types for WNAV

use thiserror::Error;

/// Common result type for WNAV operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across WNAV crates
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// TOML parse error
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Encoded polyline could not be decoded
    #[error("Polyline decode error: {0}")]
    PolylineDecode(String),

    /// Coordinates could not be encoded
    #[error("Polyline encode error: {0}")]
    PolylineEncode(String),
}
