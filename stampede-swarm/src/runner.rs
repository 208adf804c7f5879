//! Swarm runner: one tokio task per simulated user

use crate::error::SwarmResult;
use crate::shutdown::{ShutdownCoordinator, ShutdownError, ShutdownSignal};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use stampede_config::StampedeConfig;
use stampede_http::{ClientConfig, HttpManager};
use stampede_session::{
    CredentialPool, EndpointCatalog, Session, SessionSettings, SubjectCache, Teardown,
    TeardownReport,
};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::{self, error::TryRecvError};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// What happened during one run
#[derive(Debug)]
pub struct SwarmSummary {
    pub users: usize,
    /// Some users were still busy when the grace period ended and got aborted
    pub forced: bool,
    /// Present when tokens were revoked after the run
    pub teardown: Option<TeardownReport>,
}

/// Drives `load.users` simulated users until the run time elapses or a stop is requested
pub struct SwarmRunner {
    config: StampedeConfig,
    pool: Arc<CredentialPool>,
    subjects: Arc<SubjectCache>,
    catalog: Arc<EndpointCatalog>,
}

impl SwarmRunner {
    pub fn new(
        config: StampedeConfig,
        pool: Arc<CredentialPool>,
        subjects: Arc<SubjectCache>,
    ) -> SwarmResult<Self> {
        let catalog = Arc::new(EndpointCatalog::from_config(&config.session)?);
        Ok(Self {
            config,
            pool,
            subjects,
            catalog,
        })
    }

    pub fn catalog(&self) -> &EndpointCatalog {
        &self.catalog
    }

    /// Run the swarm, then revoke tokens if the configuration asks for it
    ///
    /// `stop` resolving ends the run early, e.g. on Ctrl-C.
    pub async fn run<F>(self, stop: F) -> SwarmResult<SwarmSummary>
    where
        F: Future<Output = ()>,
    {
        let load = &self.config.load;
        let settings = Arc::new(SessionSettings::from_config(&self.config));
        let client_config = ClientConfig::from(&self.config.http);
        let coordinator = Arc::new(ShutdownCoordinator::with_grace_period(load.stop_timeout));

        // Every session is built up front so a bad client config fails before any traffic
        let mut sessions = Vec::with_capacity(load.users);
        for id in 0..load.users {
            let client = HttpManager::with_config(client_config.clone())?;
            sessions.push(Session::new(
                id,
                &self.pool,
                client,
                settings.clone(),
                self.subjects.clone(),
            )?);
        }

        info!(
            users = load.users,
            endpoints = self.catalog.len(),
            tokens = self.pool.len(),
            run_time_secs = load.run_time.map(|d| d.as_secs_f64()),
            "Starting swarm"
        );

        let handles: Vec<JoinHandle<()>> = sessions
            .into_iter()
            .map(|session| {
                let position = u32::try_from(session.id()).unwrap_or(u32::MAX);
                let user = SimulatedUser {
                    start_delay: load.spawn_interval.saturating_mul(position),
                    min_wait: load.min_wait,
                    max_wait: load.max_wait,
                    catalog: self.catalog.clone(),
                    shutdown: coordinator.subscribe(),
                    coordinator: coordinator.clone(),
                    session,
                };
                tokio::spawn(user.run())
            })
            .collect();

        let run_time = async {
            match load.run_time {
                Some(duration) => tokio::time::sleep(duration).await,
                None => std::future::pending().await,
            }
        };
        tokio::select! {
            _ = run_time => info!("Run time elapsed"),
            _ = stop => info!("Stop requested"),
        }

        let forced = match coordinator.shutdown().await {
            Ok(()) => false,
            Err(ShutdownError::UsersRemaining(_)) => {
                for handle in &handles {
                    handle.abort();
                }
                true
            }
            Err(e) => return Err(e.into()),
        };

        for result in futures::future::join_all(handles).await {
            if let Err(e) = result {
                if e.is_panic() {
                    warn!(error = %e, "User task panicked");
                }
            }
        }

        let teardown = self.teardown().await?;
        Ok(SwarmSummary {
            users: load.users,
            forced,
            teardown,
        })
    }

    async fn teardown(&self) -> SwarmResult<Option<TeardownReport>> {
        if !self.config.load.revoke_on_shutdown {
            debug!("Token revocation disabled");
            return Ok(None);
        }
        if !self.pool.is_revocable() {
            debug!("Fixed token is not revoked");
            return Ok(None);
        }
        let Some(client) = &self.config.credentials.client else {
            warn!("No OAuth client configured, skipping token revocation");
            return Ok(None);
        };

        let http = HttpManager::with_config(ClientConfig::from(&self.config.http))?;
        let report = Teardown::new(&self.config.target, client)
            .with_interval(self.config.load.revoke_interval)
            .run(&http, &self.pool)
            .await;
        Ok(Some(report))
    }
}

struct SimulatedUser {
    session: Session<HttpManager>,
    catalog: Arc<EndpointCatalog>,
    coordinator: Arc<ShutdownCoordinator>,
    shutdown: broadcast::Receiver<ShutdownSignal>,
    start_delay: Duration,
    min_wait: Duration,
    max_wait: Duration,
}

impl SimulatedUser {
    async fn run(mut self) {
        let id = self.session.id();

        if !self.start_delay.is_zero() {
            tokio::select! {
                _ = tokio::time::sleep(self.start_delay) => {}
                _ = self.shutdown.recv() => return,
            }
        }

        self.coordinator.user_started().await;
        debug!(user = id, "User started");

        let catalog = self.catalog.clone();
        let mut rng = StdRng::from_os_rng();
        while !self.stop_requested() {
            let endpoint = catalog.choose(&mut rng);
            match self.session.invoke_endpoint(endpoint).await {
                Ok(response) => info!(
                    user = id,
                    endpoint = %response.endpoint,
                    status = response.status,
                    elapsed_ms = response.elapsed.as_millis() as u64,
                    "Task succeeded"
                ),
                Err(e) => warn!(
                    user = id,
                    endpoint = endpoint.name(),
                    status = e.status(),
                    error = %e,
                    "Task failed"
                ),
            }

            let pause = think_time(&mut rng, self.min_wait, self.max_wait);
            tokio::select! {
                _ = tokio::time::sleep(pause) => {}
                _ = self.shutdown.recv() => break,
            }
        }

        self.coordinator.user_stopped().await;
        debug!(
            user = id,
            requests_since_reset = self.session.request_count(),
            resets = self.session.resets(),
            "User stopped"
        );
    }

    fn stop_requested(&mut self) -> bool {
        !matches!(self.shutdown.try_recv(), Err(TryRecvError::Empty))
    }
}

/// Uniformly random pause in `[min, max]`
fn think_time<R: Rng + ?Sized>(rng: &mut R, min: Duration, max: Duration) -> Duration {
    if max <= min {
        return min;
    }
    rng.random_range(min..=max)
}
