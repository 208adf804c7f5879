//! Configuration loading and environment variable handling

use crate::domains::credentials::{ClientCredentials, CredentialSourceConfig};
use crate::domains::utils::parse_seconds;
use crate::domains::StampedeConfig;
use crate::error::{ConfigError, ConfigResult};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Configuration loader with environment variable support
pub struct ConfigLoader {
    /// Environment variable prefix
    prefix: String,
}

impl ConfigLoader {
    /// Create a new config loader with the default `STAMPEDE` prefix
    pub fn new() -> Self {
        Self {
            prefix: "STAMPEDE".to_string(),
        }
    }

    /// Create a new config loader with custom prefix
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Load configuration from a YAML file with environment overrides
    pub fn from_file(&self, path: impl AsRef<Path>) -> ConfigResult<StampedeConfig> {
        let config = self.read(Some(path))?;
        config.validate_all()?;
        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env(&self) -> ConfigResult<StampedeConfig> {
        let config = self.read(None::<&Path>)?;
        config.validate_all()?;
        Ok(config)
    }

    /// Load configuration with fallback chain
    pub fn load(&self, config_path: Option<impl AsRef<Path>>) -> ConfigResult<StampedeConfig> {
        match config_path {
            Some(path) => self.from_file(path),
            None => self.from_env(),
        }
    }

    /// Read the file (or defaults) and apply environment overrides, without
    /// validating
    ///
    /// For callers that layer their own overrides on top; they must call
    /// `validate_all` once they are done.
    pub fn read(&self, config_path: Option<impl AsRef<Path>>) -> ConfigResult<StampedeConfig> {
        let mut config = match config_path {
            Some(path) => {
                let content = std::fs::read_to_string(path)?;
                serde_yaml::from_str(&content)?
            }
            None => StampedeConfig::default(),
        };

        self.apply_env_overrides(&mut config)?;
        Ok(config)
    }

    /// Apply environment variable overrides to configuration
    fn apply_env_overrides(&self, config: &mut StampedeConfig) -> ConfigResult<()> {
        self.apply_target_overrides(&mut config.target);
        self.apply_credentials_overrides(&mut config.credentials)?;
        self.apply_session_overrides(&mut config.session)?;
        self.apply_load_overrides(&mut config.load)?;
        self.apply_http_overrides(&mut config.http)?;
        self.apply_logging_overrides(&mut config.logging)?;
        Ok(())
    }

    fn apply_target_overrides(&self, config: &mut crate::domains::target::TargetConfig) {
        if let Ok(base_url) = self.get_env_var("BASE_URL") {
            config.base_url = base_url;
        }
    }

    /// Apply credential overrides
    ///
    /// `TOKENS_FILE` switches to the multi-identity variant. `CLIENT_ID` and
    /// `CLIENT_SECRET` must be given together.
    fn apply_credentials_overrides(
        &self,
        config: &mut crate::domains::credentials::CredentialsConfig,
    ) -> ConfigResult<()> {
        if let Ok(path) = self.get_env_var("TOKENS_FILE") {
            config.source = CredentialSourceConfig::File {
                path: PathBuf::from(path),
            };
        }

        match (self.get_env_var("CLIENT_ID"), self.get_env_var("CLIENT_SECRET")) {
            (Ok(client_id), Ok(client_secret)) => {
                config.client = Some(ClientCredentials {
                    client_id,
                    client_secret,
                });
            }
            (Ok(_), Err(_)) | (Err(_), Ok(_)) => {
                return Err(ConfigError::EnvError(format!(
                    "{0}_CLIENT_ID and {0}_CLIENT_SECRET must be set together",
                    self.prefix
                )));
            }
            (Err(_), Err(_)) => {}
        }

        Ok(())
    }

    fn apply_session_overrides(
        &self,
        config: &mut crate::domains::session::SessionConfig,
    ) -> ConfigResult<()> {
        if let Some(reset_after) = self.parse_env_var("RESET_AFTER")? {
            config.reset_after_requests = reset_after;
        }
        Ok(())
    }

    /// Apply load shape overrides; waits accept fractional seconds
    fn apply_load_overrides(
        &self,
        config: &mut crate::domains::load::LoadConfig,
    ) -> ConfigResult<()> {
        if let Some(users) = self.parse_env_var("USERS")? {
            config.users = users;
        }

        if let Ok(min_wait) = self.get_env_var("MIN_WAIT") {
            config.min_wait = parse_seconds(&min_wait)
                .map_err(|e| ConfigError::EnvError(format!("Invalid MIN_WAIT: {}", e)))?;
        }

        if let Ok(max_wait) = self.get_env_var("MAX_WAIT") {
            config.max_wait = parse_seconds(&max_wait)
                .map_err(|e| ConfigError::EnvError(format!("Invalid MAX_WAIT: {}", e)))?;
        }

        if let Some(seconds) = self.parse_env_var::<u64>("RUN_TIME")? {
            config.run_time = Some(Duration::from_secs(seconds));
        }

        Ok(())
    }

    /// Apply HTTP config overrides
    fn apply_http_overrides(
        &self,
        config: &mut crate::domains::http::HttpConfig,
    ) -> ConfigResult<()> {
        if let Some(seconds) = self.parse_env_var::<u64>("HTTP_TIMEOUT")? {
            config.timeout = Duration::from_secs(seconds);
        }

        if let Ok(user_agent) = self.get_env_var("HTTP_USER_AGENT") {
            config.user_agent = user_agent;
        }

        if let Some(verify_ssl) = self.parse_env_var("HTTP_VERIFY_SSL")? {
            config.verify_ssl = verify_ssl;
        }

        Ok(())
    }

    /// Apply logging config overrides
    fn apply_logging_overrides(
        &self,
        config: &mut crate::domains::logging::LoggingConfig,
    ) -> ConfigResult<()> {
        if let Ok(log_level) = self.get_env_var("LOG_LEVEL") {
            config.level = crate::domains::logging::LogLevel::from_str(&log_level)
                .map_err(|_| ConfigError::EnvError(format!("Invalid LOG_LEVEL: {}", log_level)))?;
        }

        if let Ok(format) = self.get_env_var("LOG_FORMAT") {
            config.format = crate::domains::logging::LogFormat::from_str(&format)
                .map_err(|_| ConfigError::EnvError(format!("Invalid LOG_FORMAT: {}", format)))?;
        }

        Ok(())
    }

    /// Parse an optional environment variable into `T`
    fn parse_env_var<T>(&self, name: &str) -> ConfigResult<Option<T>>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get_env_var(name) {
            Ok(raw) => raw
                .trim()
                .parse()
                .map(Some)
                .map_err(|e| ConfigError::EnvError(format!("Invalid {}: {}", name, e))),
            Err(_) => Ok(None),
        }
    }

    /// Get environment variable with prefix
    fn get_env_var(&self, name: &str) -> Result<String, std::env::VarError> {
        std::env::var(format!("{}_{}", self.prefix, name))
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
