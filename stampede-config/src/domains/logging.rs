//! Logging configuration

use crate::error::ConfigResult;
use crate::validation::{validate_enum_choice, validate_required_string, Validatable};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Rotation schedules understood by the file target
pub const ROTATIONS: [&str; 4] = ["minutely", "hourly", "daily", "never"];

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default)]
    pub level: LogLevel,

    /// Log format
    #[serde(default)]
    pub format: LogFormat,

    /// Log targets configuration
    #[serde(default = "default_targets")]
    pub targets: Vec<LogTarget>,

    /// Whether to include source location in logs
    #[serde(default = "crate::domains::utils::default_false")]
    pub include_location: bool,
}

/// Log level enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

/// Log format enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    #[default]
    Text,
    Compact,
    Pretty,
}

/// Log target configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LogTarget {
    Console,
    File {
        /// Directory the log files are written to
        directory: String,
        /// File name prefix; the rotation suffix is appended
        #[serde(default = "default_file_prefix")]
        file_prefix: String,
        /// One of `minutely`, `hourly`, `daily`, `never`
        #[serde(default = "default_rotation")]
        rotation: String,
    },
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Text,
            targets: default_targets(),
            include_location: false,
        }
    }
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "error" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            _ => Err(format!("Invalid log level: {}", s)),
        }
    }
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "text" => Ok(LogFormat::Text),
            "compact" => Ok(LogFormat::Compact),
            "pretty" => Ok(LogFormat::Pretty),
            _ => Err(format!("Invalid log format: {}", s)),
        }
    }
}

impl Validatable for LoggingConfig {
    fn validate(&self) -> ConfigResult<()> {
        if self.targets.is_empty() {
            return Err(self.validation_error("At least one log target must be configured"));
        }

        let file_targets = self
            .targets
            .iter()
            .filter(|t| matches!(t, LogTarget::File { .. }))
            .count();
        if file_targets > 1 {
            return Err(self.validation_error("At most one file target is supported"));
        }

        for target in &self.targets {
            target.validate()?;
        }

        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "logging"
    }
}

impl Validatable for LogTarget {
    fn validate(&self) -> ConfigResult<()> {
        match self {
            LogTarget::Console => Ok(()),
            LogTarget::File {
                directory,
                file_prefix,
                rotation,
            } => {
                validate_required_string(directory, "directory", self.domain_name())?;
                validate_required_string(file_prefix, "file_prefix", self.domain_name())?;
                validate_enum_choice(rotation, &ROTATIONS, "rotation", self.domain_name())
            }
        }
    }

    fn domain_name(&self) -> &'static str {
        "logging.target"
    }
}

fn default_targets() -> Vec<LogTarget> {
    vec![LogTarget::Console]
}

fn default_file_prefix() -> String {
    "stampede.log".to_string()
}

fn default_rotation() -> String {
    "daily".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_parsing() {
        assert_eq!("WARNING".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert_eq!("trace".parse::<LogLevel>().unwrap(), LogLevel::Trace);
        assert!("verbose".parse::<LogLevel>().is_err());
        assert_eq!(LogLevel::Debug.to_string(), "debug");
    }

    #[test]
    fn test_logging_config_validation() {
        let mut config = LoggingConfig::default();
        assert!(config.validate().is_ok());

        config.targets.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_log_target_validation() {
        let file = LogTarget::File {
            directory: "/var/log/stampede".to_string(),
            file_prefix: "run.log".to_string(),
            rotation: "Hourly".to_string(),
        };
        assert!(file.validate().is_ok());

        let bad_rotation = LogTarget::File {
            directory: "/var/log/stampede".to_string(),
            file_prefix: "run.log".to_string(),
            rotation: "weekly".to_string(),
        };
        assert!(bad_rotation.validate().is_err());

        let no_directory = LogTarget::File {
            directory: String::new(),
            file_prefix: "run.log".to_string(),
            rotation: "daily".to_string(),
        };
        assert!(no_directory.validate().is_err());
    }

    #[test]
    fn test_two_file_targets_rejected() {
        let file = LogTarget::File {
            directory: "/tmp".to_string(),
            file_prefix: "a.log".to_string(),
            rotation: "daily".to_string(),
        };
        let config = LoggingConfig {
            targets: vec![file.clone(), file],
            ..LoggingConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
