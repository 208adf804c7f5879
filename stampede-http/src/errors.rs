//! HTTP error types

/// Error type for HTTP operations
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid header {name}: {reason}")]
    InvalidHeader { name: String, reason: String },

    #[error("Invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

impl HttpError {
    /// Whether the request never produced a response because it timed out
    pub fn is_timeout(&self) -> bool {
        matches!(self, HttpError::NetworkError(e) if e.is_timeout())
    }
}
