//! Shared value types.

use serde::Serialize;

// ---------------------------------------------------------------------------
// Versioning
// ---------------------------------------------------------------------------

/// Version pin for a Watson service API.
///
/// Watson services carry two version markers: a major path segment
/// (`/v1/...`) and a release date passed as the `version` query parameter.
/// A client is bound to exactly one [`ApiVersion`] for its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ApiVersion {
    /// Major path segment, without slashes (e.g. `"v1"`).
    pub major: &'static str,
    /// Release date sent as `?version=` (e.g. `"2017-05-05"`).
    pub date: &'static str,
}

impl ApiVersion {
    /// Creates a new [`ApiVersion`].
    pub const fn new(major: &'static str, date: &'static str) -> Self {
        Self { major, date }
    }

    /// Returns the path prefix for this version (e.g. `"/v1"`).
    pub fn path_prefix(self) -> String {
        format!("/{}", self.major)
    }

    /// Returns the `version` query pair (e.g. `"version=2017-05-05"`).
    pub fn query(self) -> String {
        format!("version={}", self.date)
    }
}

impl std::fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.major, self.date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_renders_path_and_query() {
        let version = ApiVersion::new("v1", "2017-05-05");
        assert_eq!(version.path_prefix(), "/v1");
        assert_eq!(version.query(), "version=2017-05-05");
        assert_eq!(version.to_string(), "v1@2017-05-05");
    }
}
