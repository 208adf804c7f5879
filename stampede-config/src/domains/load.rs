//! Load shape: how many simulated users, how fast, for how long

use crate::error::ConfigResult;
use crate::validation::{validate_positive, Validatable};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Load shape configuration for the swarm runner
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadConfig {
    /// Number of concurrent simulated users
    #[serde(default = "default_users")]
    pub users: usize,

    /// Delay between starting two consecutive users
    #[serde(with = "humantime_serde", default = "default_spawn_interval")]
    pub spawn_interval: Duration,

    /// Lower bound of the think time between two requests of one user
    #[serde(with = "humantime_serde", default = "default_min_wait")]
    pub min_wait: Duration,

    /// Upper bound of the think time between two requests of one user
    #[serde(with = "humantime_serde", default = "default_max_wait")]
    pub max_wait: Duration,

    /// Total run time in seconds; runs until interrupted when unset
    #[serde(
        with = "crate::domains::utils::serde_duration_option",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub run_time: Option<Duration>,

    /// How long users get to finish their in-flight request after a stop
    #[serde(
        with = "crate::domains::utils::serde_duration",
        default = "default_stop_timeout"
    )]
    pub stop_timeout: Duration,

    /// Revoke every pooled token once the run ends
    #[serde(default = "crate::domains::utils::default_true")]
    pub revoke_on_shutdown: bool,

    /// Pause between two revocation calls at teardown
    #[serde(with = "humantime_serde", default)]
    pub revoke_interval: Duration,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            users: default_users(),
            spawn_interval: default_spawn_interval(),
            min_wait: default_min_wait(),
            max_wait: default_max_wait(),
            run_time: None,
            stop_timeout: default_stop_timeout(),
            revoke_on_shutdown: true,
            revoke_interval: Duration::ZERO,
        }
    }
}

impl Validatable for LoadConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_positive(self.users, "users", self.domain_name())?;

        if self.min_wait > self.max_wait {
            return Err(self.validation_error(format!(
                "min_wait ({:?}) must not exceed max_wait ({:?})",
                self.min_wait, self.max_wait
            )));
        }

        if self.run_time.is_some_and(|run_time| run_time.is_zero()) {
            return Err(self.validation_error("run_time must be greater than 0"));
        }

        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "load"
    }
}

fn default_users() -> usize {
    10
}

fn default_spawn_interval() -> Duration {
    Duration::from_millis(100)
}

fn default_min_wait() -> Duration {
    Duration::from_secs(1)
}

fn default_max_wait() -> Duration {
    Duration::from_secs(3)
}

fn default_stop_timeout() -> Duration {
    Duration::from_secs(10)
}
