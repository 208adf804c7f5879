//! Session error types

use stampede_http::HttpError;
use std::path::PathBuf;
use thiserror::Error;

/// Session result type
pub type SessionResult<T> = Result<T, SessionError>;

#[derive(Error, Debug)]
pub enum SessionError {
    /// Missing or unusable credential source, empty pool, bad catalog
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Failed to read credentials from {path}: {source}")]
    CredentialRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid credential on line {line}: {reason}")]
    InvalidCredentialLine { line: usize, reason: String },

    /// The request never produced a response
    #[error("HTTP error: {0}")]
    Http(#[from] HttpError),

    /// A response arrived with a non-2xx status
    #[error("{endpoint} returned HTTP {status}")]
    UnexpectedStatus { endpoint: String, status: u16 },
}

impl SessionError {
    /// Configuration errors are fatal at startup; everything else is a failed task
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            SessionError::Configuration(_)
                | SessionError::CredentialRead { .. }
                | SessionError::InvalidCredentialLine { .. }
        )
    }

    /// HTTP status of the failed response, if one was received
    pub fn status(&self) -> Option<u16> {
        match self {
            SessionError::UnexpectedStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}
