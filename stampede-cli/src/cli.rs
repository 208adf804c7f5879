//! CLI argument parsing definitions

use clap::{Parser, Subcommand};
use stampede_config::domains::utils::parse_seconds;
use stampede_logging::LogLevel;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(author, version, about = "Simulated users against an OAuth-protected HTTP API", long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Set the log level (trace, debug, info, warn, error)
    #[arg(long, value_name = "LEVEL", global = true)]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run simulated users until the run time elapses or Ctrl-C
    Run {
        /// Number of concurrent simulated users
        #[arg(long, value_name = "N")]
        users: Option<usize>,

        /// Stop after this many seconds
        #[arg(long, value_name = "SECS", value_parser = parse_seconds)]
        run_time: Option<Duration>,

        /// Keep the pooled tokens valid after the run
        #[arg(long)]
        no_revoke: bool,
    },

    /// Revoke every token in the credential pool
    Revoke,

    /// Print the subject identifier of the first pooled token
    Whoami,

    /// Configuration management commands
    Config {
        #[command(subcommand)]
        config_cmd: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Validate a configuration file
    Validate {
        /// Path to the configuration file
        #[arg(long, value_name = "PATH")]
        config_file: PathBuf,
    },

    /// Generate a sample configuration file
    Generate {
        /// Output file path
        #[arg(long, value_name = "PATH")]
        output: PathBuf,

        /// Overwrite existing file
        #[arg(long)]
        force: bool,
    },

    /// Show the effective configuration after environment overrides
    Show {
        /// Output format: yaml, json
        #[arg(long, value_name = "FORMAT", default_value = "yaml")]
        format: String,
    },
}
