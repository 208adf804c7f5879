//! Domain-specific configuration modules

pub mod credentials;
pub mod http;
pub mod load;
pub mod logging;
pub mod session;
pub mod target;
pub mod utils;

use crate::error::ConfigResult;
use crate::validation::Validatable;
use serde::{Deserialize, Serialize};

/// Main stampede configuration combining all domains
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StampedeConfig {
    /// API under test
    #[serde(default)]
    pub target: target::TargetConfig,

    /// Token source and OAuth client
    #[serde(default)]
    pub credentials: credentials::CredentialsConfig,

    /// Per-session policy and endpoint catalog
    #[serde(default)]
    pub session: session::SessionConfig,

    /// Load shape
    #[serde(default)]
    pub load: load::LoadConfig,

    /// HTTP client configuration
    #[serde(default)]
    pub http: http::HttpConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: logging::LoggingConfig,
}

impl StampedeConfig {
    /// Validate all domain configurations
    pub fn validate_all(&self) -> ConfigResult<()> {
        self.target.validate()?;
        self.credentials.validate()?;
        self.session.validate()?;
        self.load.validate()?;
        self.http.validate()?;
        self.logging.validate()?;
        Ok(())
    }

    /// Generate a sample configuration file
    pub fn generate_sample() -> String {
        let config = StampedeConfig::default();
        serde_yaml::to_string(&config)
            .unwrap_or_else(|_| "# Failed to generate sample config".to_string())
    }
}
