//! One simulated user: a bearer token, a cookie-carrying client and a request counter

use crate::credentials::{fingerprint, CredentialPool};
use crate::endpoint::Endpoint;
use crate::error::{SessionError, SessionResult};
use crate::subject::{fetch_subject, SubjectCache};
use stampede_config::{StampedeConfig, TargetConfig};
use stampede_http::{HttpClient, HttpRequest};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Settings shared read-only by every session of a run
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub target: TargetConfig,
    /// Cookies are cleared before the request that would exceed this count
    pub reset_after_requests: u32,
}

impl SessionSettings {
    pub fn new(target: TargetConfig, reset_after_requests: u32) -> Self {
        Self {
            target,
            reset_after_requests,
        }
    }

    pub fn from_config(config: &StampedeConfig) -> Self {
        Self::new(config.target.clone(), config.session.reset_after_requests)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum SubjectState {
    Unresolved,
    Resolved(String),
    /// Lookup failed once; the session keeps using an empty identifier
    Unavailable,
}

/// Successful endpoint invocation
#[derive(Debug, Clone)]
pub struct EndpointResponse {
    pub endpoint: String,
    pub url: String,
    pub status: u16,
    pub elapsed: Duration,
}

/// A simulated user session
///
/// Owned by exactly one task; every operation takes `&mut self` and runs to
/// completion before the next one starts.
pub struct Session<C: HttpClient> {
    id: usize,
    token: String,
    client: C,
    settings: Arc<SessionSettings>,
    subjects: Arc<SubjectCache>,
    subject: SubjectState,
    request_count: u32,
    resets: u32,
}

impl<C: HttpClient> Session<C> {
    /// Start a session with a token picked from `pool` by the pool's policy
    pub fn new(
        id: usize,
        pool: &CredentialPool,
        client: C,
        settings: Arc<SessionSettings>,
        subjects: Arc<SubjectCache>,
    ) -> SessionResult<Self> {
        let token = pool.select().ok_or_else(|| {
            SessionError::Configuration("credential pool is empty".to_string())
        })?;
        Ok(Self::with_token(id, token, client, settings, subjects))
    }

    /// Start a session with an explicit token
    pub fn with_token(
        id: usize,
        token: impl Into<String>,
        client: C,
        settings: Arc<SessionSettings>,
        subjects: Arc<SubjectCache>,
    ) -> Self {
        let token = token.into();
        debug!(session = id, token = %fingerprint(&token), "Session started");
        Self {
            id,
            token,
            client,
            settings,
            subjects,
            subject: SubjectState::Unresolved,
            request_count: 0,
            resets: 0,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// Requests issued since the last cookie reset
    pub fn request_count(&self) -> u32 {
        self.request_count
    }

    /// Number of cookie resets performed so far
    pub fn resets(&self) -> u32 {
        self.resets
    }

    /// The subject identifier for this session's token, empty if it cannot be resolved
    ///
    /// The first call consults the shared cache and falls back to the "who am
    /// I" endpoint; later calls never touch the network.
    pub async fn resolve_subject(&mut self) -> &str {
        if self.subject == SubjectState::Unresolved {
            self.subject = match self.subjects.get(&self.token) {
                Some(subject) => SubjectState::Resolved(subject),
                None => {
                    match fetch_subject(&self.client, &self.settings.target, &self.token).await {
                        Some(subject) => {
                            self.subjects.insert(&self.token, subject.clone());
                            SubjectState::Resolved(subject)
                        }
                        None => SubjectState::Unavailable,
                    }
                }
            };
        }

        match &self.subject {
            SubjectState::Resolved(subject) => subject.as_str(),
            _ => "",
        }
    }

    /// Issue one authenticated GET for `endpoint`
    ///
    /// The request counter is incremented whatever the outcome. Non-2xx
    /// responses come back as [`SessionError::UnexpectedStatus`].
    pub async fn invoke_endpoint(&mut self, endpoint: &Endpoint) -> SessionResult<EndpointResponse> {
        if self.request_count >= self.settings.reset_after_requests {
            self.client.clear_cookies()?;
            self.request_count = 0;
            self.resets += 1;
            debug!(session = self.id, resets = self.resets, "Cookie jar reset");
        }

        let path = if endpoint.needs_subject() {
            let subject = self.resolve_subject().await.to_string();
            endpoint.render(&subject)
        } else {
            endpoint.template().to_string()
        };
        let url = self.settings.target.url_for(&path);

        let result = self
            .client
            .send(HttpRequest::get(&url).bearer(&self.token))
            .await;
        self.request_count += 1;

        let response = result?;
        if !response.is_success() {
            return Err(SessionError::UnexpectedStatus {
                endpoint: endpoint.name().to_string(),
                status: response.status,
            });
        }

        Ok(EndpointResponse {
            endpoint: endpoint.name().to_string(),
            url,
            status: response.status,
            elapsed: response.elapsed,
        })
    }
}

impl<C: HttpClient> std::fmt::Debug for Session<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("token", &fingerprint(&self.token))
            .field("subject", &self.subject)
            .field("request_count", &self.request_count)
            .field("resets", &self.resets)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::CredentialOrigin;
    use crate::testing::{ok, response, MockHttp};
    use mockall::Sequence;
    use stampede_http::HttpError;

    fn settings(reset_after_requests: u32) -> Arc<SessionSettings> {
        Arc::new(SessionSettings::new(
            TargetConfig {
                base_url: "http://api.test".to_string(),
                ..TargetConfig::default()
            },
            reset_after_requests,
        ))
    }

    fn session(client: MockHttp, reset_after_requests: u32) -> Session<MockHttp> {
        Session::with_token(
            0,
            "tok-1",
            client,
            settings(reset_after_requests),
            Arc::new(SubjectCache::new()),
        )
    }

    #[test]
    fn test_new_picks_token_from_pool() {
        let pool = CredentialPool::from_tokens(["a", "b", "c"], CredentialOrigin::File).unwrap();
        for id in 0..20 {
            let session = Session::new(
                id,
                &pool,
                MockHttp::new(),
                settings(50),
                Arc::new(SubjectCache::new()),
            )
            .unwrap();
            assert!(pool.contains(session.token()));
            assert_eq!(session.request_count(), 0);
        }
    }

    #[tokio::test]
    async fn test_cookies_cleared_before_request_after_threshold() {
        let mut client = MockHttp::new();
        let mut seq = Sequence::new();
        client
            .expect_send()
            .times(50)
            .in_sequence(&mut seq)
            .returning(|_| ok());
        client
            .expect_clear_cookies()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(()));
        client
            .expect_send()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| ok());

        let endpoint = Endpoint::new("userinfo", "/v1/connect/userinfo?format=json", 1);
        let mut session = session(client, 50);

        for expected in 1..=50 {
            session.invoke_endpoint(&endpoint).await.unwrap();
            assert_eq!(session.request_count(), expected);
        }
        assert_eq!(session.resets(), 0);

        session.invoke_endpoint(&endpoint).await.unwrap();
        assert_eq!(session.request_count(), 1);
        assert_eq!(session.resets(), 1);
    }

    #[tokio::test]
    async fn test_counter_increments_on_failure() {
        let mut client = MockHttp::new();
        client
            .expect_send()
            .times(1)
            .returning(|_| Ok(response(503, "busy")));
        client
            .expect_send()
            .times(1)
            .returning(|_| Err(HttpError::InvalidUrl("boom".to_string())));

        let endpoint = Endpoint::new("userinfo", "/v1/connect/userinfo", 1);
        let mut session = session(client, 50);

        let err = session.invoke_endpoint(&endpoint).await.unwrap_err();
        assert_eq!(err.status(), Some(503));
        assert_eq!(session.request_count(), 1);

        let err = session.invoke_endpoint(&endpoint).await.unwrap_err();
        assert!(matches!(err, SessionError::Http(_)));
        assert_eq!(session.request_count(), 2);
    }

    #[tokio::test]
    async fn test_failed_cookie_reset_keeps_counter() {
        let mut client = MockHttp::new();
        client.expect_send().times(1).returning(|_| ok());
        client
            .expect_clear_cookies()
            .times(1)
            .returning(|| Err(HttpError::InvalidUrl("no client".to_string())));

        let endpoint = Endpoint::new("userinfo", "/v1/connect/userinfo", 1);
        let mut session = session(client, 1);

        session.invoke_endpoint(&endpoint).await.unwrap();
        assert!(session.invoke_endpoint(&endpoint).await.is_err());
        assert_eq!(session.request_count(), 1);
        assert_eq!(session.resets(), 0);
    }

    #[tokio::test]
    async fn test_url_and_bearer_header() {
        let mut client = MockHttp::new();
        client
            .expect_send()
            .withf(|request| request.url == "http://api.test/v1/connect/userinfo")
            .times(1)
            .returning(|_| Ok(response(200, r#"{"patient": "abc123"}"#)));
        client
            .expect_send()
            .withf(|request| {
                request.url == "http://api.test/v1/fhir/Patient/abc123?_format=json"
                    && request.header_value("Authorization") == Some("Bearer tok-1")
            })
            .times(1)
            .returning(|_| ok());

        let endpoint = Endpoint::new("patient", "/v1/fhir/Patient/%s?_format=json", 1);
        let mut session = session(client, 50);

        let response = session.invoke_endpoint(&endpoint).await.unwrap();
        assert_eq!(response.url, "http://api.test/v1/fhir/Patient/abc123?_format=json");
        assert_eq!(response.endpoint, "patient");
        assert_eq!(response.status, 200);
        // the lookup is not a counted request
        assert_eq!(session.request_count(), 1);
    }

    #[tokio::test]
    async fn test_failed_lookup_is_attempted_once() {
        let mut client = MockHttp::new();
        client
            .expect_send()
            .withf(|request| request.url.ends_with("/v1/connect/userinfo"))
            .times(1)
            .returning(|_| Ok(response(401, "")));
        client
            .expect_send()
            .withf(|request| request.url == "http://api.test/v1/fhir/Patient/?_format=json")
            .times(2)
            .returning(|_| ok());

        let cache = Arc::new(SubjectCache::new());
        let endpoint = Endpoint::new("patient", "/v1/fhir/Patient/%s?_format=json", 1);
        let mut session = Session::with_token(0, "tok-1", client, settings(50), cache.clone());

        session.invoke_endpoint(&endpoint).await.unwrap();
        session.invoke_endpoint(&endpoint).await.unwrap();
        assert_eq!(session.resolve_subject().await, "");
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_shared_cache_skips_lookup() {
        let cache = Arc::new(SubjectCache::new());
        cache.insert("tok-1", "cached".to_string());

        let mut session = Session::with_token(0, "tok-1", MockHttp::new(), settings(50), cache);
        assert_eq!(session.resolve_subject().await, "cached");
    }
}
