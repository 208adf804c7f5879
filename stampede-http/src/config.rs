//! HTTP client configuration

use stampede_config::HttpConfig as ConfigHttpConfig;
use std::time::Duration;

/// Settings applied to every reqwest client a session builds
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Request timeout
    pub timeout: Duration,

    /// TCP connect timeout
    pub connect_timeout: Duration,

    /// Maximum number of redirects to follow
    pub max_redirects: u32,

    /// User agent string
    pub user_agent: String,

    /// Whether to verify SSL certificates
    pub verify_ssl: bool,

    /// Keep-alive connections held by one session's client
    pub idle_connections: usize,

    /// How long an idle connection is kept
    pub idle_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ConfigHttpConfig::default().into()
    }
}

impl From<ConfigHttpConfig> for ClientConfig {
    fn from(config: ConfigHttpConfig) -> Self {
        Self {
            timeout: config.timeout,
            connect_timeout: config.connect_timeout,
            max_redirects: config.max_redirects,
            user_agent: config.user_agent,
            verify_ssl: config.verify_ssl,
            idle_connections: config.idle_connections_per_user,
            idle_timeout: config.idle_timeout,
        }
    }
}

impl From<&ConfigHttpConfig> for ClientConfig {
    fn from(config: &ConfigHttpConfig) -> Self {
        config.clone().into()
    }
}
