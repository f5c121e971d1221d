//! Error types for lowpoly

use thiserror::Error;

/// Main error type for lowpoly operations
///
/// Configuration and geometry errors are fatal and raised before any mesh
/// is mutated. A missed quality target is not an error: it is reported on
/// the decimation report instead.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Format error: {0}")]
    Format(String),
}

/// Result type alias for lowpoly operations
pub type Result<T> = std::result::Result<T, Error>;
