//! Host harness for stampede
//!
//! This crate runs a swarm of simulated users: weighted task selection, think
//! time between tasks, ramp-up, run-duration and signal-driven stop, and
//! token revocation once every user has stopped.

pub mod error;
pub mod runner;
pub mod shutdown;

// Re-export commonly used types
pub use error::{SwarmError, SwarmResult};
pub use runner::{SwarmRunner, SwarmSummary};
pub use shutdown::{ShutdownCoordinator, ShutdownError, ShutdownSignal};
