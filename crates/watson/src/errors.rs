//! Error and retry-policy types shared by every Watson client crate.
//!
//! [`WatsonError`] is the single error type returned across the public API:
//! credential resolution, client construction and the request/response
//! exchange all report through it. [`TransportError`] is the narrower type
//! produced by [`crate::Transport`] implementations; it is carried unchanged
//! inside [`WatsonError::ConstructionError`] and [`WatsonError::TransportError`].
//!
//! [`RetryPolicy`] lets callers decide whether to re-issue a call. Nothing in
//! this workspace retries on its own.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Retry semantics
// ---------------------------------------------------------------------------

/// Whether an error condition is safe to retry and, if so, after what delay.
///
/// - `Retryable` errors: connection failures, HTTP 429 and 5xx responses.
///   `after` is taken from the response's `Retry-After` header when present.
/// - `NonRetryable` errors: missing or malformed manifest, unknown service,
///   rejected credentials, undecodable responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RetryPolicy {
    /// The operation may be retried.
    Retryable {
        /// Minimum back-off before the next attempt. `None` means retry
        /// immediately or apply the caller's own back-off schedule.
        after: Option<Duration>,
    },
    /// The operation must not be retried without changing its inputs.
    NonRetryable,
}

// ---------------------------------------------------------------------------
// Transport errors
// ---------------------------------------------------------------------------

/// Failures reported by a [`crate::Transport`] or [`crate::Connector`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The credentials or transport settings cannot produce a working client
    /// (unparsable URL, no authentication material, TLS backend failure).
    #[error("Invalid transport configuration: {message}")]
    InvalidConfiguration {
        /// Description of the configuration problem.
        message: String,
    },

    /// The request never produced an HTTP response (DNS, connect, TLS, timeout,
    /// or the body could not be read).
    #[error("Network error: {message}")]
    Network {
        /// Description reported by the HTTP stack.
        message: String,
    },

    /// The service answered with a non-success status code.
    #[error("HTTP status {status}: {body}")]
    Status {
        /// Numeric HTTP status code.
        status: u16,
        /// Response body, as text, for diagnostics.
        body: String,
        /// Delay requested by a `Retry-After` header, when the service sent one.
        retry_after: Option<Duration>,
    },
}

impl TransportError {
    /// Creates an [`TransportError::InvalidConfiguration`].
    pub fn invalid_configuration(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            message: message.into(),
        }
    }

    /// Creates a [`TransportError::Network`].
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Returns the retry policy for this failure.
    pub fn retry_policy(&self) -> RetryPolicy {
        match self {
            Self::Network { .. } => RetryPolicy::Retryable { after: None },
            Self::Status {
                status,
                retry_after,
                ..
            } if *status == 429 || *status >= 500 => RetryPolicy::Retryable {
                after: *retry_after,
            },
            Self::Status { .. } | Self::InvalidConfiguration { .. } => RetryPolicy::NonRetryable,
        }
    }
}

// ---------------------------------------------------------------------------
// Client-level errors
// ---------------------------------------------------------------------------

/// Errors returned by credential resolution, client construction and the
/// message exchange.
///
/// A call either succeeds completely or fails with exactly one of these
/// variants; there is no partial success.
#[derive(Debug, Error)]
pub enum WatsonError {
    /// No service manifest is available (`VCAP_SERVICES` unset or empty).
    ///
    /// Typical when running outside the platform.
    #[error("VCAP_SERVICES undefined")]
    ManifestMissing,

    /// The manifest is present but is not a mapping of binding groups to
    /// service entries.
    #[error("failed to parse VCAP_SERVICES: {message}")]
    ManifestMalformed {
        /// The underlying parse failure.
        message: String,
    },

    /// No binding group prefix-matches the service name with a plan-matching
    /// entry.
    #[error("service instance '{service}' (plan '{plan}') not found in VCAP_SERVICES")]
    ServiceNotFound {
        /// The requested service name.
        service: String,
        /// The requested plan; empty when any plan was acceptable.
        plan: String,
    },

    /// The connector rejected the resolved or defaulted credentials.
    #[error("client construction failed: {0}")]
    ConstructionError(#[source] TransportError),

    /// The outgoing request could not be serialised. Signals a library defect.
    #[error("failed to encode request: {message}")]
    EncodingError {
        /// Serialiser error description.
        message: String,
    },

    /// The HTTP exchange failed; the transport's error is preserved.
    #[error("transport failure: {0}")]
    TransportError(#[source] TransportError),

    /// The service replied but the body does not match the expected shape.
    #[error("failed to decode response: {message}")]
    DecodingError {
        /// Deserialiser error description.
        message: String,
    },
}

impl WatsonError {
    /// Returns the retry policy for this error.
    ///
    /// Only transport-level failures can be retryable; everything else needs a
    /// change of input or environment before a second attempt can succeed.
    pub fn retry_policy(&self) -> RetryPolicy {
        match self {
            Self::TransportError(inner) => inner.retry_policy(),
            _ => RetryPolicy::NonRetryable,
        }
    }

    /// Returns `true` for [`WatsonError::ServiceNotFound`].
    pub fn is_service_not_found(&self) -> bool {
        matches!(self, Self::ServiceNotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_errors_are_retryable() {
        let err = WatsonError::TransportError(TransportError::network("connection refused"));
        assert_eq!(err.retry_policy(), RetryPolicy::Retryable { after: None });
    }

    #[test]
    fn test_status_classification() {
        let throttled = TransportError::Status {
            status: 429,
            body: String::new(),
            retry_after: Some(Duration::from_secs(20)),
        };
        let unavailable = TransportError::Status {
            status: 503,
            body: String::new(),
            retry_after: None,
        };
        let not_found = TransportError::Status {
            status: 404,
            body: "{\"error\":\"Resource not found\"}".to_string(),
            retry_after: None,
        };

        assert_eq!(
            throttled.retry_policy(),
            RetryPolicy::Retryable {
                after: Some(Duration::from_secs(20))
            }
        );
        assert_eq!(unavailable.retry_policy(), RetryPolicy::Retryable { after: None });
        assert_eq!(not_found.retry_policy(), RetryPolicy::NonRetryable);
    }

    #[test]
    fn test_retry_after_carries_through_watson_error() {
        let err = WatsonError::TransportError(TransportError::Status {
            status: 429,
            body: String::new(),
            retry_after: Some(Duration::from_secs(3)),
        });
        assert_eq!(
            err.retry_policy(),
            RetryPolicy::Retryable {
                after: Some(Duration::from_secs(3))
            }
        );
    }

    #[test]
    fn test_resolution_errors_are_not_retryable() {
        let errors = [
            WatsonError::ManifestMissing,
            WatsonError::ManifestMalformed {
                message: "expected a map".to_string(),
            },
            WatsonError::ServiceNotFound {
                service: "conversation".to_string(),
                plan: "premium".to_string(),
            },
            WatsonError::ConstructionError(TransportError::invalid_configuration("empty url")),
            WatsonError::DecodingError {
                message: "EOF".to_string(),
            },
        ];

        for err in errors {
            assert_eq!(err.retry_policy(), RetryPolicy::NonRetryable, "{err}");
        }
    }

    #[test]
    fn test_construction_error_preserves_source() {
        let err = WatsonError::ConstructionError(TransportError::invalid_configuration("bad url"));
        let source = std::error::Error::source(&err).map(ToString::to_string);
        assert_eq!(
            source.as_deref(),
            Some("Invalid transport configuration: bad url")
        );
    }
}
