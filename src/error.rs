//! Error types for the Tollgate service.

use thiserror::Error;

/// Main error type for Tollgate operations.
///
/// No variant is process-fatal: configuration problems fall back to
/// defaults, import rejections leave the ledger untouched, and persistent
/// provider failures are compensated by the overview composer.
#[derive(Error, Debug)]
pub enum TollgateError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed import payload
    #[error("invalid json: {0}")]
    InvalidPayload(#[from] serde_json::Error),

    /// Import payload version outside the supported set {0, 1}
    #[error("unsupported version: {0}")]
    UnsupportedVersion(i64),

    /// A persistent statistics provider call failed
    #[error("Persistent stats unavailable: {0}")]
    Provider(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Tollgate operations.
pub type Result<T> = std::result::Result<T, TollgateError>;
