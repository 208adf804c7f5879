//! HTTP client functionality for stampede
//!
//! Every simulated user owns one [`HttpManager`]: a reqwest client with its
//! own cookie jar. Clearing the jar starts a fresh client-side session while
//! the caller keeps its bearer token.

pub mod client;
pub mod config;
pub mod errors;
pub mod types;

// Re-export main types for convenience
pub use client::{HttpClient, HttpManager};
pub use config::ClientConfig;
pub use errors::HttpError;
pub use types::{HttpMethod, HttpRequest, HttpResponse};
