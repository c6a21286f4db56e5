//! Error types for the hygiene core.

use std::{error::Error, fmt, io};

/// Error type for hygiene core operations.
#[derive(Debug)]
pub enum HygieneError {
    /// An underlying I/O error.
    Io(io::Error),
    /// A JSON document could not be parsed or produced.
    Json(serde_json::Error),
}

impl fmt::Display for HygieneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "io error: {err}"),
            Self::Json(err) => write!(f, "json error: {err}"),
        }
    }
}

impl Error for HygieneError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Json(err) => Some(err),
        }
    }
}

impl From<io::Error> for HygieneError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for HygieneError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

/// Convenience result type for the hygiene core.
pub type Result<T> = std::result::Result<T, HygieneError>;
