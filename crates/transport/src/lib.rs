//! Watson HTTP transport adapter.
//!
//! Implements [`watson::Transport`] and [`watson::Connector`] over `reqwest`.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** Base-URL joining, authentication headers, TLS, timeouts
//! and status-code classification all live here. Service clients see only
//! [`watson::Transport`].
//!
//! ## Authentication
//!
//! Credentials with a username use HTTP basic auth (`username:password`).
//! Credentials with only an API key use basic auth with the literal user
//! `apikey`, which Watson gateways accept for IAM keys. Credentials with
//! neither are rejected at construction.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Method, Url};
use serde::Deserialize;
use tracing::{debug, warn};
use watson::{Connector, Credentials, HttpMethod, Transport, TransportError, TransportRequest};

/// User name sent with API-key authentication.
const API_KEY_USER: &str = "apikey";

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Settings for [`HttpTransport`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HttpTransportConfig {
    /// Timeout applied to the whole request, connect through body read.
    #[serde(rename = "timeout_secs", deserialize_with = "deserialize_secs")]
    pub timeout: Duration,
    /// `User-Agent` header sent with every request.
    pub user_agent: String,
}

impl Default for HttpTransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: format!("watson-conversation/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

fn deserialize_secs<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: serde::Deserializer<'de>,
{
    u64::deserialize(deserializer).map(Duration::from_secs)
}

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

#[derive(Clone)]
struct BasicAuth {
    username: String,
    password: String,
}

impl std::fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicAuth")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// [`Transport`] backed by a `reqwest` client and one set of credentials.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    auth: BasicAuth,
}

impl HttpTransport {
    /// Creates a transport for `credentials`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::InvalidConfiguration`] when the URL is empty,
    /// not an absolute `http`/`https` URL, when no authentication material is
    /// present, or when the HTTP client cannot be built.
    pub fn new(credentials: &Credentials, config: HttpTransportConfig) -> Result<Self, TransportError> {
        let base_url = parse_base_url(credentials.url())?;
        let auth = auth_for(credentials)?;

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent)
            .build()
            .map_err(|e| TransportError::invalid_configuration(format!("HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url,
            auth,
        })
    }

    /// The base URL every request path is appended to (no trailing slash).
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url_for(&self, path_and_query: &str) -> String {
        if path_and_query.starts_with('/') {
            format!("{}{}", self.base_url, path_and_query)
        } else {
            format!("{}/{}", self.base_url, path_and_query)
        }
    }
}

fn parse_base_url(raw: &str) -> Result<String, TransportError> {
    if raw.is_empty() {
        return Err(TransportError::invalid_configuration("service URL is empty"));
    }
    let url = Url::parse(raw)
        .map_err(|e| TransportError::invalid_configuration(format!("service URL '{raw}': {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(raw.trim_end_matches('/').to_string()),
        other => Err(TransportError::invalid_configuration(format!(
            "service URL '{raw}': unsupported scheme '{other}'"
        ))),
    }
}

fn auth_for(credentials: &Credentials) -> Result<BasicAuth, TransportError> {
    if credentials.has_basic_auth() {
        Ok(BasicAuth {
            username: credentials.username().to_string(),
            password: credentials.password().to_string(),
        })
    } else if credentials.has_api_key() {
        Ok(BasicAuth {
            username: API_KEY_USER.to_string(),
            password: credentials.api_key().to_string(),
        })
    } else {
        Err(TransportError::invalid_configuration(
            "credentials carry neither a username nor an API key",
        ))
    }
}

fn method_for(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Post => Method::POST,
    }
}

/// Reads a `Retry-After` header in its delta-seconds form.
///
/// The HTTP-date form is not used by Watson gateways and is ignored.
fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

#[async_trait]
impl Transport for HttpTransport {
    async fn make_request(&self, request: TransportRequest) -> Result<Vec<u8>, TransportError> {
        let url = self.url_for(&request.path_and_query);
        debug!(method = %request.method, url = %url, "sending request");

        let mut builder = self.client.request(method_for(request.method), &url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        let response = builder
            .basic_auth(&self.auth.username, Some(&self.auth.password))
            .body(request.body)
            .send()
            .await
            .map_err(|e| TransportError::network(format!("request to {url} failed: {e}")))?;

        let status = response.status();
        let retry_after = retry_after(response.headers());
        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::network(format!("reading response from {url}: {e}")))?;

        if !status.is_success() {
            let body = String::from_utf8_lossy(&body).into_owned();
            warn!(status = status.as_u16(), url = %url, "service returned an error status");
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
                retry_after,
            });
        }

        Ok(body.to_vec())
    }
}

// ---------------------------------------------------------------------------
// Connector
// ---------------------------------------------------------------------------

/// [`Connector`] producing [`HttpTransport`]s with a shared configuration.
#[derive(Debug, Clone, Default)]
pub struct HttpConnector {
    config: HttpTransportConfig,
}

impl HttpConnector {
    pub fn new(config: HttpTransportConfig) -> Self {
        Self { config }
    }
}

impl Connector for HttpConnector {
    fn connect(&self, credentials: &Credentials) -> Result<Arc<dyn Transport>, TransportError> {
        let transport = HttpTransport::new(credentials, self.config.clone())?;
        Ok(Arc::new(transport))
    }
}
