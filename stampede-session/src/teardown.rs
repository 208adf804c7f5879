//! End-of-run revocation of every token in the pool

use crate::credentials::{fingerprint, CredentialPool};
use crate::error::{SessionError, SessionResult};
use stampede_config::{ClientCredentials, TargetConfig};
use stampede_http::{HttpClient, HttpRequest};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Result of revoking one token
#[derive(Debug)]
pub struct RevocationOutcome {
    /// Position of the token in the pool
    pub index: usize,
    pub fingerprint: String,
    /// HTTP status of the successful revocation, or why it failed
    pub result: SessionResult<u16>,
}

impl RevocationOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Per-token outcomes of one teardown, in pool order
#[derive(Debug, Default)]
pub struct TeardownReport {
    pub outcomes: Vec<RevocationOutcome>,
}

impl TeardownReport {
    pub fn attempted(&self) -> usize {
        self.outcomes.len()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.attempted() - self.succeeded()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed() == 0
    }

    pub fn failures(&self) -> impl Iterator<Item = &RevocationOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }
}

/// Revokes tokens through the OAuth revocation endpoint
pub struct Teardown {
    url: String,
    client: ClientCredentials,
    interval: Duration,
}

impl Teardown {
    pub fn new(target: &TargetConfig, client: &ClientCredentials) -> Self {
        Self {
            url: target.url_for(&target.revoke_path),
            client: client.clone(),
            interval: Duration::ZERO,
        }
    }

    /// Pause between consecutive revocations
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Attempt to revoke every token in `pool` once, in order
    ///
    /// Failures are recorded and never stop the remaining attempts.
    pub async fn run<C>(&self, http: &C, pool: &CredentialPool) -> TeardownReport
    where
        C: HttpClient + ?Sized,
    {
        info!(tokens = pool.len(), url = %self.url, "Revoking tokens");

        let mut report = TeardownReport::default();
        for (index, token) in pool.tokens().enumerate() {
            if index > 0 && !self.interval.is_zero() {
                tokio::time::sleep(self.interval).await;
            }

            let fingerprint = fingerprint(token);
            let result = self.revoke(http, token).await;
            match result {
                Ok(status) => debug!(index, token = %fingerprint, status, "Token revoked"),
                Err(ref e) => warn!(index, token = %fingerprint, error = %e, "Token revocation failed"),
            }
            report.outcomes.push(RevocationOutcome {
                index,
                fingerprint,
                result,
            });
        }

        info!(
            attempted = report.attempted(),
            failed = report.failed(),
            "Token revocation finished"
        );
        report
    }

    async fn revoke<C>(&self, http: &C, token: &str) -> SessionResult<u16>
    where
        C: HttpClient + ?Sized,
    {
        let request = HttpRequest::post(&self.url).form([
            ("token", token),
            ("client_id", self.client.client_id.as_str()),
            ("client_secret", self.client.client_secret.as_str()),
        ]);

        let response = http.send(request).await?;
        if !response.is_success() {
            return Err(SessionError::UnexpectedStatus {
                endpoint: "revoke_token".to_string(),
                status: response.status,
            });
        }
        Ok(response.status)
    }
}
