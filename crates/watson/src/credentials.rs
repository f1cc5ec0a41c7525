//! Connection material for a Watson service instance.
//!
//! [`Credentials`] is produced by [`crate::resolve`] (or assembled by hand when
//! the caller already knows the endpoint) and handed to a [`crate::Connector`].
//! Once built it is never mutated: every field is private and the `with_*`
//! methods consume and return the value.

use serde::{Deserialize, Serialize};

/// Resolved connection material for one service instance.
///
/// Any field may be empty. Which ones are required depends on the service and
/// on the transport: basic-auth services use `username`/`password`, IAM-style
/// services use `api_key`.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Credentials {
    service_name: String,
    service_plan: String,
    url: String,
    username: String,
    password: String,
    #[serde(rename = "apikey")]
    api_key: String,
}

impl Credentials {
    /// Creates empty credentials for `service_name`.
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            ..Self::default()
        }
    }

    pub fn with_service_name(mut self, service_name: impl Into<String>) -> Self {
        self.service_name = service_name.into();
        self
    }

    pub fn with_service_plan(mut self, service_plan: impl Into<String>) -> Self {
        self.service_plan = service_plan.into();
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Sets HTTP basic-auth material.
    pub fn with_basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = username.into();
        self.password = password.into();
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = api_key.into();
        self
    }

    /// The logical service name that was requested (not the manifest key).
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// The plan of the matched manifest entry.
    pub fn service_plan(&self) -> &str {
        &self.service_plan
    }

    /// Base URL of the service endpoint.
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Returns `true` when a username is present.
    pub fn has_basic_auth(&self) -> bool {
        !self.username.is_empty()
    }

    /// Returns `true` when an API key is present.
    pub fn has_api_key(&self) -> bool {
        !self.api_key.is_empty()
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fn redact(secret: &str) -> &'static str {
            if secret.is_empty() {
                ""
            } else {
                "<redacted>"
            }
        }

        f.debug_struct("Credentials")
            .field("service_name", &self.service_name)
            .field("service_plan", &self.service_plan)
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &redact(&self.password))
            .field("api_key", &redact(&self.api_key))
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Client configuration
// ---------------------------------------------------------------------------

/// Configuration handed to a service client constructor.
///
/// Carries possibly partial [`Credentials`]; the client fills in its own
/// defaults for an empty service name or URL before connecting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Connection material, possibly partially populated.
    #[serde(default)]
    pub credentials: Credentials,
}

impl ClientConfig {
    /// Creates a configuration from resolved credentials.
    pub fn new(credentials: Credentials) -> Self {
        Self { credentials }
    }
}

impl From<Credentials> for ClientConfig {
    fn from(credentials: Credentials) -> Self {
        Self::new(credentials)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_secrets() {
        let creds = Credentials::new("conversation")
            .with_basic_auth("user", "hunter2")
            .with_api_key("k-123");
        let rendered = format!("{creds:?}");

        assert!(rendered.contains("user"));
        assert!(!rendered.contains("hunter2"));
        assert!(!rendered.contains("k-123"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_config_deserializes_partial_credentials() {
        let config: ClientConfig =
            serde_json::from_str(r#"{"credentials":{"url":"https://x/api","apikey":"k"}}"#)
                .unwrap();

        assert_eq!(config.credentials.url(), "https://x/api");
        assert_eq!(config.credentials.api_key(), "k");
        assert_eq!(config.credentials.service_name(), "");
        assert!(config.credentials.has_api_key());
        assert!(!config.credentials.has_basic_auth());
    }
}
