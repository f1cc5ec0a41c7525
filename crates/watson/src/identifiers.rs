//! Newtype domain identifiers.
//!
//! Identifiers that must never be empty are wrapped in distinct newtypes so an
//! empty workspace id or service name is rejected where it enters the system
//! rather than producing a malformed request path later.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Macro for String-wrapped newtypes.
// Generates: struct, new() returning Option<Self>, as_str(), Display, and a
// TryFrom<String> that serde deserialises through, so `accepts` always holds.
// ---------------------------------------------------------------------------
macro_rules! string_id {
    (
        $(#[$attr:meta])*
        $name:ident, accepts = $accepts:expr
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier, returning `None` if the value is not
            /// accepted.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                let accepts: fn(&str) -> bool = $accepts;
                if accepts(&v) { Some(Self(v)) } else { None }
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = String;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value.clone())
                    .ok_or_else(|| format!("invalid {}: {value:?}", stringify!($name)))
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

/// Characters allowed unescaped in a URL path segment (RFC 3986 `unreserved`).
fn is_path_segment(value: &str) -> bool {
    !value.is_empty()
        && value
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~'))
}

string_id! {
    /// Identifies a Conversation workspace: the dialog definition a message is
    /// routed to.
    ///
    /// Appears as a path segment in `/workspaces/{workspace_id}/message`, so
    /// only unreserved URL characters are accepted; `/`, `?`, `#` and the like
    /// would change the request target.
    WorkspaceId, accepts = is_path_segment
}

string_id! {
    /// Logical name of a bound service (e.g. `"conversation"`).
    ///
    /// Matched as a prefix against the binding-group keys of the service
    /// manifest, which the platform often suffixes with generated identifiers.
    ServiceName, accepts = |v| !v.is_empty()
}
