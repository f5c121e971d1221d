//! Error types for I/O operations

use thiserror::Error;

/// Errors that can occur while loading or saving meshes
#[derive(Error, Debug)]
pub enum IoError {
    #[error("Unsupported mesh format: {path}")]
    UnsupportedFormat { path: String },

    #[error("Parse error in {path}: {message}")]
    ParseError { path: String, message: String },

    #[error("Write error in {path}: {message}")]
    WriteError { path: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<IoError> for lowpoly_core::Error {
    fn from(err: IoError) -> Self {
        match err {
            IoError::UnsupportedFormat { path } => lowpoly_core::Error::UnsupportedFormat(path),
            IoError::Io(e) => lowpoly_core::Error::Io(e),
            other => lowpoly_core::Error::Format(other.to_string()),
        }
    }
}
