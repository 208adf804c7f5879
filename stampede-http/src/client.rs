//! HTTP client implementation

use crate::config::ClientConfig;
use crate::errors::HttpError;
use crate::types::{HttpRequest, HttpResponse};
use reqwest::{
    self,
    cookie::Jar,
    header::{HeaderMap, HeaderName, HeaderValue},
    Client,
};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, trace};

/// HTTP client trait used by simulated user sessions
#[async_trait::async_trait]
pub trait HttpClient: Send + Sync {
    /// Send a request and read the full response body
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpError>;

    /// Drop every cookie so the next request starts a fresh client-side session
    fn clear_cookies(&mut self) -> Result<(), HttpError>;
}

/// reqwest-backed client owning one cookie jar
#[derive(Debug, Clone)]
pub struct HttpManager {
    config: ClientConfig,
    client: Client,
    jar: Arc<Jar>,
}

impl HttpManager {
    /// Create a new HttpManager with default configuration
    pub fn new() -> Result<Self, HttpError> {
        Self::with_config(ClientConfig::default())
    }

    /// Create a new HttpManager with specific configuration
    pub fn with_config(config: ClientConfig) -> Result<Self, HttpError> {
        debug!(
            "Creating HttpManager with timeout: {}s",
            config.timeout.as_secs()
        );
        let jar = Arc::new(Jar::default());
        let client = build_client(&config, jar.clone())?;
        Ok(Self {
            config,
            client,
            jar,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The cookie jar the current client reads from and writes to
    pub fn jar(&self) -> &Arc<Jar> {
        &self.jar
    }
}

fn build_client(config: &ClientConfig, jar: Arc<Jar>) -> Result<Client, HttpError> {
    Ok(Client::builder()
        .timeout(config.timeout)
        .connect_timeout(config.connect_timeout)
        .user_agent(&config.user_agent)
        .danger_accept_invalid_certs(!config.verify_ssl)
        .redirect(redirect_policy(config.max_redirects))
        .pool_max_idle_per_host(config.idle_connections)
        .pool_idle_timeout(config.idle_timeout)
        .cookie_provider(jar)
        .build()?)
}

/// `limited(0)` would fail on the first 3xx; zero means the response is returned as is
fn redirect_policy(max_redirects: u32) -> reqwest::redirect::Policy {
    match max_redirects {
        0 => reqwest::redirect::Policy::none(),
        n => reqwest::redirect::Policy::limited(n as usize),
    }
}

fn header_map(headers: &[(String, String)]) -> Result<HeaderMap, HttpError> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let header_name = HeaderName::from_str(name).map_err(|e| HttpError::InvalidHeader {
            name: name.clone(),
            reason: e.to_string(),
        })?;
        let header_value = HeaderValue::from_str(value).map_err(|e| HttpError::InvalidHeader {
            name: name.clone(),
            reason: e.to_string(),
        })?;
        map.insert(header_name, header_value);
    }
    Ok(map)
}

#[async_trait::async_trait]
impl HttpClient for HttpManager {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        let url = reqwest::Url::parse(&request.url)
            .map_err(|e| HttpError::InvalidUrl(format!("{}: {}", request.url, e)))?;

        trace!(?request, "Building request");
        let mut builder = self
            .client
            .request(request.method.into(), url)
            .headers(header_map(&request.headers)?);

        if let Some(ref fields) = request.form {
            builder = builder.form(fields);
        }

        let started = Instant::now();
        let response = builder.send().await?;

        let status = response.status().as_u16();
        let headers: HashMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.to_string(), v.to_string()))
            })
            .collect();
        let body = response.text().await?;
        let elapsed = started.elapsed();

        debug!(
            method = %request.method,
            url = %request.url,
            status,
            elapsed_ms = elapsed.as_millis() as u64,
            "HTTP response received"
        );

        Ok(HttpResponse {
            status,
            headers,
            body,
            elapsed,
        })
    }

    fn clear_cookies(&mut self) -> Result<(), HttpError> {
        // reqwest's jar cannot be emptied in place; swap in a fresh one
        let jar = Arc::new(Jar::default());
        self.client = build_client(&self.config, jar.clone())?;
        self.jar = jar;
        debug!("Cleared session cookies");
        Ok(())
    }
}
