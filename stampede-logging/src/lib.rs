//! Structured logging infrastructure for stampede
//!
//! Library crates log through `tracing` macros only; binaries call
//! [`init_logging_from_config`] once at startup and keep the returned
//! [`LoggingGuard`] alive until exit so buffered file output is flushed.

pub mod init;

pub use init::{build_env_filter, init_logging_from_config, init_simple_tracing, LoggingGuard};
pub use stampede_config::domains::logging::{LogFormat, LogLevel, LogTarget, LoggingConfig};
