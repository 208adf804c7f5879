//! Graceful shutdown coordination
//!
//! Users subscribe to a broadcast channel before they start. A stop first
//! sends [`ShutdownSignal::Graceful`], which lets every user finish its
//! in-flight request; users still active when the grace period runs out get
//! [`ShutdownSignal::Forced`] and their tasks are aborted by the runner.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info, warn};

/// Shutdown signal types with escalating urgency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownSignal {
    /// Finish the current request, then stop
    Graceful,
    /// Stop now
    Forced,
}

impl std::fmt::Display for ShutdownSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShutdownSignal::Graceful => write!(f, "graceful"),
            ShutdownSignal::Forced => write!(f, "forced"),
        }
    }
}

/// Graceful shutdown coordinator
pub struct ShutdownCoordinator {
    sender: broadcast::Sender<ShutdownSignal>,
    is_shutting_down: Arc<RwLock<bool>>,
    active_users: Arc<RwLock<u32>>,
    grace_period: Duration,
}

impl ShutdownCoordinator {
    /// Create a new shutdown coordinator with the default grace period
    pub fn new() -> Self {
        Self::with_grace_period(Duration::from_secs(10))
    }

    pub fn with_grace_period(grace_period: Duration) -> Self {
        let (sender, _) = broadcast::channel(16);

        Self {
            sender,
            is_shutting_down: Arc::new(RwLock::new(false)),
            active_users: Arc::new(RwLock::new(0)),
            grace_period,
        }
    }

    /// Subscribe to shutdown signals
    pub fn subscribe(&self) -> broadcast::Receiver<ShutdownSignal> {
        self.sender.subscribe()
    }

    pub async fn is_shutting_down(&self) -> bool {
        *self.is_shutting_down.read().await
    }

    pub async fn user_started(&self) {
        let mut count = self.active_users.write().await;
        *count += 1;
    }

    pub async fn user_stopped(&self) {
        let mut count = self.active_users.write().await;
        if *count > 0 {
            *count -= 1;
        }
    }

    pub async fn active_users(&self) -> u32 {
        *self.active_users.read().await
    }

    /// Ask every user to stop and wait up to the grace period for them
    ///
    /// Returns [`ShutdownError::UsersRemaining`] after broadcasting
    /// [`ShutdownSignal::Forced`] when users are still active at the deadline.
    pub async fn shutdown(&self) -> Result<(), ShutdownError> {
        {
            let mut shutting_down = self.is_shutting_down.write().await;
            if *shutting_down {
                return Err(ShutdownError::AlreadyShuttingDown);
            }
            *shutting_down = true;
        }

        info!(
            active_users = self.active_users().await,
            grace_period_ms = self.grace_period.as_millis() as u64,
            "Stopping users"
        );

        // No receivers left means every user has already returned
        if self.sender.send(ShutdownSignal::Graceful).is_err() {
            debug!("No users subscribed to shutdown");
        }

        if self.wait_for_users(self.grace_period).await {
            info!("All users stopped");
            return Ok(());
        }

        let remaining = self.active_users().await;
        warn!(remaining, "Grace period elapsed, forcing remaining users to stop");
        let _ = self.sender.send(ShutdownSignal::Forced);
        Err(ShutdownError::UsersRemaining(remaining))
    }

    async fn wait_for_users(&self, timeout_duration: Duration) -> bool {
        let start = tokio::time::Instant::now();

        loop {
            let active = self.active_users().await;
            if active == 0 {
                return true;
            }
            if start.elapsed() >= timeout_duration {
                return false;
            }

            let sleep_duration = if active > 10 {
                Duration::from_millis(100)
            } else {
                Duration::from_millis(50)
            };
            tokio::time::sleep(sleep_duration).await;
        }
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ShutdownError {
    #[error("Shutdown already in progress")]
    AlreadyShuttingDown,

    #[error("Grace period elapsed with {0} users still active")]
    UsersRemaining(u32),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_user_counting() {
        let coordinator = ShutdownCoordinator::new();

        assert!(!coordinator.is_shutting_down().await);
        assert_eq!(coordinator.active_users().await, 0);

        coordinator.user_started().await;
        coordinator.user_started().await;
        assert_eq!(coordinator.active_users().await, 2);

        coordinator.user_stopped().await;
        coordinator.user_stopped().await;
        assert_eq!(coordinator.active_users().await, 0);

        // Extra stop doesn't go negative
        coordinator.user_stopped().await;
        assert_eq!(coordinator.active_users().await, 0);
    }

    #[tokio::test]
    async fn test_shutdown_without_users() {
        let coordinator = ShutdownCoordinator::new();
        assert!(coordinator.shutdown().await.is_ok());
        assert!(coordinator.is_shutting_down().await);
    }

    #[tokio::test]
    async fn test_graceful_signal_reaches_users() {
        let coordinator = Arc::new(ShutdownCoordinator::with_grace_period(Duration::from_secs(1)));
        let mut receiver = coordinator.subscribe();
        coordinator.user_started().await;

        let user = {
            let coordinator = coordinator.clone();
            tokio::spawn(async move {
                let signal = receiver.recv().await.unwrap();
                coordinator.user_stopped().await;
                signal
            })
        };

        assert!(coordinator.shutdown().await.is_ok());
        assert_eq!(user.await.unwrap(), ShutdownSignal::Graceful);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stuck_user_is_forced() {
        let coordinator = ShutdownCoordinator::with_grace_period(Duration::from_millis(200));
        let mut receiver = coordinator.subscribe();
        coordinator.user_started().await;

        let result = coordinator.shutdown().await;
        assert!(matches!(result, Err(ShutdownError::UsersRemaining(1))));
        assert_eq!(receiver.recv().await.unwrap(), ShutdownSignal::Graceful);
        assert_eq!(receiver.recv().await.unwrap(), ShutdownSignal::Forced);
    }

    #[tokio::test]
    async fn test_double_shutdown_prevented() {
        let coordinator = ShutdownCoordinator::new();
        coordinator.shutdown().await.unwrap();
        assert!(matches!(
            coordinator.shutdown().await,
            Err(ShutdownError::AlreadyShuttingDown)
        ));
    }
}
