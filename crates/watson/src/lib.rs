//! Core domain for the Watson service clients.
//!
//! This crate contains the connection material, the service-manifest credential
//! resolver, the transport port traits and the shared error taxonomy. Service
//! clients (e.g. the `conversation` crate) depend on it; the `transport` crate
//! implements its traits over HTTP.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** This crate has no I/O dependencies
//! beyond reading `VCAP_SERVICES` in [`resolve_from_env`]. It defines *what* a
//! transport must do; infrastructure crates define *how*.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`manifest`] | `VCAP_SERVICES` parsing and credential resolution |
//! | [`credentials`] | `Credentials`, `ClientConfig` |
//! | [`transport`] | `Transport`, `Connector`, `TransportRequest` |
//! | [`identifiers`] | Newtype identifiers (`WorkspaceId`, `ServiceName`) |
//! | [`types`] | Shared value types (`ApiVersion`) |
//! | [`errors`] | `WatsonError`, `TransportError`, `RetryPolicy` |

pub mod credentials;
pub mod errors;
pub mod identifiers;
pub mod manifest;
pub mod transport;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use credentials::{ClientConfig, Credentials};
pub use errors::{RetryPolicy, TransportError, WatsonError};
pub use identifiers::{ServiceName, WorkspaceId};
pub use manifest::{
    resolve, resolve_from_env, Manifest, ManifestCredentials, ServiceManifestEntry, VCAP_SERVICES,
};
pub use transport::{Connector, HttpMethod, Transport, TransportRequest};
pub use types::ApiVersion;
