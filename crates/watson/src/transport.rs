//! Port traits for the HTTP exchange.
//!
//! Service clients in this workspace never talk to an HTTP library directly.
//! They build a [`TransportRequest`] and hand it to a [`Transport`]; the
//! `transport` crate supplies the production implementation. Tests supply
//! in-memory ones.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::{Credentials, TransportError};

/// HTTP verbs issued by the service clients.
///
/// Only the verbs some client actually sends are listed; the `message`
/// exchange is a `POST`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Post,
}

impl HttpMethod {
    /// Returns the method name as sent on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Post => "POST",
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One outbound request, relative to the service base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportRequest {
    pub method: HttpMethod,
    /// Path and query appended to the base URL (e.g. `/v1/workspaces/x/message?version=...`).
    pub path_and_query: String,
    pub body: Vec<u8>,
    pub headers: BTreeMap<String, String>,
}

impl TransportRequest {
    /// Creates a request with no body and no headers.
    pub fn new(method: HttpMethod, path_and_query: impl Into<String>) -> Self {
        Self {
            method,
            path_and_query: path_and_query.into(),
            body: Vec::new(),
            headers: BTreeMap::new(),
        }
    }

    /// Sets the request body.
    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    /// Adds a header, replacing any previous value for `name`.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

/// Performs one HTTP exchange for a service client.
///
/// Implementations prefix the base URL, inject authentication derived from the
/// [`Credentials`] they were built with, and classify non-success statuses as
/// [`TransportError::Status`]. They must be safe to share across tasks: a
/// single client issues concurrent requests through the same transport.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends `request` and returns the raw response body of a successful
    /// (2xx) response.
    async fn make_request(&self, request: TransportRequest) -> Result<Vec<u8>, TransportError>;
}

/// Builds a [`Transport`] bound to a set of credentials.
pub trait Connector {
    /// Creates a transport for `credentials`.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] when the credentials cannot produce a
    /// working transport (e.g. unparsable URL, no authentication material).
    fn connect(&self, credentials: &Credentials) -> Result<Arc<dyn Transport>, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder_replaces_headers() {
        let request = TransportRequest::new(HttpMethod::Post, "/v1/x")
            .with_header("Content-Type", "text/plain")
            .with_header("Content-Type", "application/json")
            .with_body(b"{}".to_vec());

        assert_eq!(request.headers.len(), 1);
        assert_eq!(request.headers["Content-Type"], "application/json");
        assert_eq!(request.body, b"{}");
        assert_eq!(request.method.to_string(), "POST");
    }
}
