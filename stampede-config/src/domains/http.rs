//! Per-user HTTP client settings
//!
//! Every simulated user owns its own client and cookie jar, so the
//! connection settings here apply to one user, not to the whole swarm.

use crate::error::ConfigResult;
use crate::validation::{validate_required_string, Validatable};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Whole-request timeout for endpoint, "who am I" and revocation calls
    #[serde(
        with = "crate::domains::utils::serde_duration",
        default = "default_timeout"
    )]
    pub timeout: Duration,

    /// TCP connect timeout; may not exceed `timeout`
    #[serde(
        with = "crate::domains::utils::serde_duration",
        default = "default_connect_timeout"
    )]
    pub connect_timeout: Duration,

    /// Sent on every request so the target can tell load apart from real traffic
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default = "crate::domains::utils::default_true")]
    pub verify_ssl: bool,

    /// Redirect hops followed per request; 0 hands the 3xx back to the session
    #[serde(default = "default_max_redirects")]
    pub max_redirects: u32,

    /// Keep-alive connections one user holds between requests; 0 disables reuse
    #[serde(default = "default_idle_connections_per_user")]
    pub idle_connections_per_user: usize,

    /// How long a user's idle connection stays open
    #[serde(with = "humantime_serde", default = "default_idle_timeout")]
    pub idle_timeout: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            connect_timeout: default_connect_timeout(),
            user_agent: default_user_agent(),
            verify_ssl: true,
            max_redirects: default_max_redirects(),
            idle_connections_per_user: default_idle_connections_per_user(),
            idle_timeout: default_idle_timeout(),
        }
    }
}

impl Validatable for HttpConfig {
    fn validate(&self) -> ConfigResult<()> {
        if self.timeout.is_zero() {
            return Err(self.validation_error("timeout must be greater than 0"));
        }
        if self.connect_timeout.is_zero() {
            return Err(self.validation_error("connect_timeout must be greater than 0"));
        }
        if self.connect_timeout > self.timeout {
            return Err(self.validation_error(format!(
                "connect_timeout ({:?}) cannot exceed timeout ({:?})",
                self.connect_timeout, self.timeout
            )));
        }

        validate_required_string(&self.user_agent, "user_agent", self.domain_name())?;
        if self.user_agent.chars().any(char::is_control) {
            return Err(self.validation_error("user_agent cannot contain control characters"));
        }

        if self.idle_connections_per_user > 0 && self.idle_timeout.is_zero() {
            return Err(self.validation_error(
                "idle_timeout must be greater than 0 when idle connections are kept",
            ));
        }

        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "http"
    }
}

fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_user_agent() -> String {
    concat!("stampede/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_max_redirects() -> u32 {
    5
}

// A user issues one request at a time
fn default_idle_connections_per_user() -> usize {
    1
}

fn default_idle_timeout() -> Duration {
    Duration::from_secs(90)
}
