//! Domain-driven configuration management for stampede
//!
//! Configuration is split by functional domain (target API, credentials,
//! session policy, load shape, HTTP client, logging), with validation,
//! defaults, and `STAMPEDE_*` environment variable overrides.

pub mod error;
pub mod loader;
pub mod validation;

// Domain-specific configuration modules
pub mod domains;

// Re-export main types
pub use error::{ConfigError, ConfigResult};
pub use loader::ConfigLoader;

// Re-export domain configurations
pub use domains::{
    credentials::{ClientCredentials, CredentialSourceConfig, CredentialsConfig},
    http::HttpConfig,
    load::LoadConfig,
    logging::LoggingConfig,
    session::{EndpointConfig, SessionConfig},
    target::TargetConfig,
    StampedeConfig,
};

// Re-export utilities
pub use domains::utils::serde_duration;
