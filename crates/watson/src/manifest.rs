//! Credential resolution from the platform service manifest.
//!
//! Cloud Foundry style platforms inject bound services as JSON in the
//! `VCAP_SERVICES` environment variable:
//!
//! ```text
//! { "<binding-group>": [ { "name": "...", "label": "...", "plan": "...",
//!                          "credentials": { "url": "...", "username": "...",
//!                                           "password": "...", "apikey": "..." } } ] }
//! ```
//!
//! [`resolve`] is a pure function over the manifest text. [`resolve_from_env`]
//! is the only place that touches the process environment.
//!
//! ## Matching rules
//!
//! - A binding group matches when its key *starts with* the requested service
//!   name; the platform frequently appends generated suffixes to the key.
//! - Groups are visited in lexicographic key order, so the result is
//!   deterministic when several groups share the prefix.
//! - Within a group, entries are scanned in document order. An empty requested
//!   plan accepts any entry; otherwise the entry's plan must be equal
//!   (case-sensitive).
//! - The first accepted entry wins.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer};
use tracing::debug;

use crate::{Credentials, WatsonError};

/// Environment variable holding the service manifest.
pub const VCAP_SERVICES: &str = "VCAP_SERVICES";

/// Reads JSON `null` as the type's empty value.
///
/// Platform manifests routinely carry `null` in bindings the caller does not
/// ask for (user-provided services, unset plans). Wrong types still fail.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// One service binding declared in the manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServiceManifestEntry {
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub label: String,
    #[serde(deserialize_with = "null_as_default")]
    pub plan: String,
    #[serde(deserialize_with = "null_as_default")]
    pub credentials: ManifestCredentials,
}

/// The `credentials` object of a manifest entry. Every field may be absent
/// or `null`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ManifestCredentials {
    #[serde(deserialize_with = "null_as_default")]
    pub url: String,
    #[serde(deserialize_with = "null_as_default")]
    pub username: String,
    #[serde(deserialize_with = "null_as_default")]
    pub password: String,
    #[serde(deserialize_with = "null_as_default")]
    pub apikey: String,
}

impl ServiceManifestEntry {
    /// Returns `true` if this entry satisfies the requested plan.
    fn accepts_plan(&self, plan: &str) -> bool {
        plan.is_empty() || self.plan == plan
    }

    fn to_credentials(&self, service_name: &str) -> Credentials {
        Credentials::new(service_name)
            .with_service_plan(self.plan.as_str())
            .with_url(self.credentials.url.as_str())
            .with_basic_auth(
                self.credentials.username.as_str(),
                self.credentials.password.as_str(),
            )
            .with_api_key(self.credentials.apikey.as_str())
    }
}

/// A parsed service manifest: binding-group name to its service entries.
///
/// A `null` group is kept as a group with no entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    groups: BTreeMap<String, Vec<ServiceManifestEntry>>,
}

impl Manifest {
    /// Parses manifest text.
    ///
    /// # Errors
    ///
    /// - [`WatsonError::ManifestMissing`] if `text` is empty.
    /// - [`WatsonError::ManifestMalformed`] if `text` is not a JSON object of
    ///   arrays of service entries.
    pub fn parse(text: &str) -> Result<Self, WatsonError> {
        if text.is_empty() {
            return Err(WatsonError::ManifestMissing);
        }
        let groups: BTreeMap<String, Option<Vec<ServiceManifestEntry>>> =
            serde_json::from_str(text).map_err(|e| WatsonError::ManifestMalformed {
                message: e.to_string(),
            })?;
        Ok(Self {
            groups: groups
                .into_iter()
                .map(|(key, entries)| (key, entries.unwrap_or_default()))
                .collect(),
        })
    }

    /// Iterates binding groups in lexicographic key order.
    pub fn groups(&self) -> impl Iterator<Item = (&str, &[ServiceManifestEntry])> {
        self.groups
            .iter()
            .map(|(key, entries)| (key.as_str(), entries.as_slice()))
    }

    /// Finds the first entry whose group key starts with `service_name` and
    /// whose plan is accepted by `plan`.
    ///
    /// # Errors
    ///
    /// Returns [`WatsonError::ServiceNotFound`] when nothing matches.
    pub fn find(&self, service_name: &str, plan: &str) -> Result<Credentials, WatsonError> {
        self.groups()
            .filter(|(key, _)| key.starts_with(service_name))
            .find_map(|(key, entries)| {
                entries
                    .iter()
                    .find(|entry| entry.accepts_plan(plan))
                    .map(|entry| (key, entry))
            })
            .map(|(key, entry)| {
                debug!(
                    service = service_name,
                    binding = key,
                    plan = entry.plan.as_str(),
                    "resolved service credentials from manifest"
                );
                entry.to_credentials(service_name)
            })
            .ok_or_else(|| WatsonError::ServiceNotFound {
                service: service_name.to_string(),
                plan: plan.to_string(),
            })
    }
}

/// Resolves credentials for `service_name` (optionally restricted to `plan`)
/// from manifest text.
///
/// # Errors
///
/// [`WatsonError::ManifestMissing`], [`WatsonError::ManifestMalformed`] or
/// [`WatsonError::ServiceNotFound`]; see [`Manifest::parse`] and
/// [`Manifest::find`].
pub fn resolve(manifest_text: &str, service_name: &str, plan: &str) -> Result<Credentials, WatsonError> {
    Manifest::parse(manifest_text)?.find(service_name, plan)
}

/// Resolves credentials from the `VCAP_SERVICES` environment variable.
///
/// An unset or non-UTF-8 variable is treated as an empty manifest.
///
/// # Errors
///
/// Same as [`resolve`].
pub fn resolve_from_env(service_name: &str, plan: &str) -> Result<Credentials, WatsonError> {
    let manifest_text = std::env::var(VCAP_SERVICES).unwrap_or_default();
    resolve(&manifest_text, service_name, plan)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SINGLE: &str = r#"{"conversation-12ab":[{"name":"conversation-12ab","plan":"standard","credentials":{"url":"https://x/api","username":"u","password":"p"}}]}"#;

    #[test]
    fn test_prefix_match_with_any_plan() {
        let creds = resolve(SINGLE, "conversation", "").unwrap();

        assert_eq!(creds.service_name(), "conversation");
        assert_eq!(creds.service_plan(), "standard");
        assert_eq!(creds.url(), "https://x/api");
        assert_eq!(creds.username(), "u");
        assert_eq!(creds.password(), "p");
        assert_eq!(creds.api_key(), "");
    }

    #[test]
    fn test_unmatched_plan_is_not_found() {
        let err = resolve(SINGLE, "conversation", "premium").unwrap_err();
        assert!(err.is_service_not_found(), "{err}");
    }

    #[test]
    fn test_empty_manifest_is_missing() {
        assert!(matches!(
            resolve("", "conversation", ""),
            Err(WatsonError::ManifestMissing)
        ));
    }

    #[test]
    fn test_wrong_shape_is_malformed() {
        for text in ["not json", r#"{"conversation":{"name":"x"}}"#, "[]"] {
            assert!(
                matches!(
                    resolve(text, "conversation", ""),
                    Err(WatsonError::ManifestMalformed { .. })
                ),
                "{text}"
            );
        }
    }

    #[test]
    fn test_empty_entry_plan_does_not_match_specific_plan() {
        let manifest = r#"{"conversation":[{"name":"conversation","credentials":{"url":"https://a"}}]}"#;
        assert!(resolve(manifest, "conversation", "standard")
            .unwrap_err()
            .is_service_not_found());
        assert_eq!(resolve(manifest, "conversation", "").unwrap().url(), "https://a");
    }

    #[test]
    fn test_first_entry_in_document_order_wins() {
        let manifest = r#"{"conversation":[
            {"name":"a","plan":"free","credentials":{"url":"https://first"}},
            {"name":"b","plan":"standard","credentials":{"url":"https://second"}},
            {"name":"c","plan":"standard","credentials":{"url":"https://third"}}
        ]}"#;

        assert_eq!(resolve(manifest, "conversation", "").unwrap().url(), "https://first");
        assert_eq!(
            resolve(manifest, "conversation", "standard").unwrap().url(),
            "https://second"
        );
    }

    #[test]
    fn test_plan_match_is_case_sensitive() {
        assert!(resolve(SINGLE, "conversation", "Standard")
            .unwrap_err()
            .is_service_not_found());
    }

    #[test]
    fn test_non_prefix_keys_are_skipped() {
        let manifest = r#"{
            "my-conversation":[{"name":"x","credentials":{"url":"https://wrong"}}],
            "tone_analyzer":[{"name":"t","credentials":{"url":"https://tone"}}]
        }"#;
        assert!(resolve(manifest, "conversation", "")
            .unwrap_err()
            .is_service_not_found());
    }

    #[test]
    fn test_later_group_used_when_earlier_group_has_no_plan_match() {
        let manifest = r#"{
            "conversation-a":[{"name":"a","plan":"free","credentials":{"url":"https://a"}}],
            "conversation-b":[{"name":"b","plan":"standard","credentials":{"url":"https://b"}}]
        }"#;
        let creds = resolve(manifest, "conversation", "standard").unwrap();
        assert_eq!(creds.url(), "https://b");
        assert_eq!(creds.service_plan(), "standard");
    }

    #[test]
    fn test_multiple_matching_groups_resolve_in_key_order() {
        let manifest = r#"{
            "conversation-zz":[{"name":"z","credentials":{"url":"https://z"}}],
            "conversation-aa":[{"name":"a","credentials":{"url":"https://a"}}]
        }"#;
        assert_eq!(resolve(manifest, "conversation", "").unwrap().url(), "https://a");
    }

    #[test]
    fn test_resolution_is_pure() {
        let first = resolve(SINGLE, "conversation", "").unwrap();
        let second = resolve(SINGLE, "conversation", "").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_api_key_and_unknown_fields() {
        let manifest = r#"{"conversation":[{
            "name":"conversation-iam","label":"conversation","plan":"lite",
            "tags":["watson"],"instance_name":"my-bot",
            "credentials":{"url":"https://gateway","apikey":"k-1","iam_apikey_name":"ignored"}
        }]}"#;
        let creds = resolve(manifest, "conversation", "lite").unwrap();
        assert_eq!(creds.api_key(), "k-1");
        assert_eq!(creds.username(), "");
    }

    #[test]
    fn test_nulls_in_other_bindings_read_as_empty() {
        let null_plan = r#"{"conversation":[
            {"name":null,"label":null,"plan":null,"credentials":{"url":"https://x"}}
        ]}"#;
        let null_credential = r#"{
            "conversation":[{"name":"c","credentials":{"url":"https://x","username":"u","password":null}}],
            "user-provided":[{"name":"db","credentials":null}]
        }"#;
        let null_group = r#"{"aaa-user-provided":null,"conversation":[{"name":"c","credentials":{"url":"https://x"}}]}"#;

        for manifest in [null_plan, null_credential, null_group] {
            let creds = resolve(manifest, "conversation", "").unwrap();
            assert_eq!(creds.url(), "https://x", "{manifest}");
        }

        let creds = resolve(null_credential, "conversation", "").unwrap();
        assert_eq!(creds.username(), "u");
        assert_eq!(creds.password(), "");
        assert_eq!(resolve(null_plan, "conversation", "").unwrap().service_plan(), "");
    }

    #[test]
    fn test_null_group_has_no_entries() {
        let manifest = Manifest::parse(r#"{"conversation":null}"#).unwrap();
        assert_eq!(manifest.groups().next().map(|(_, e)| e.len()), Some(0));
        assert!(resolve(r#"{"conversation":null}"#, "conversation", "")
            .unwrap_err()
            .is_service_not_found());
    }

    #[test]
    fn test_type_mismatches_stay_malformed() {
        for text in [
            r#"{"conversation":[{"name":"c","plan":7}]}"#,
            r#"{"conversation":[{"name":"c","credentials":{"url":["https://x"]}}]}"#,
            r#"{"conversation":[{"name":"c","credentials":"secret"}]}"#,
            r#"{"conversation":{"name":"c"}}"#,
        ] {
            assert!(
                matches!(
                    resolve(text, "conversation", ""),
                    Err(WatsonError::ManifestMalformed { .. })
                ),
                "{text}"
            );
        }
    }

    #[test]
    fn test_groups_are_listed_in_key_order() {
        let manifest = Manifest::parse(
            r#"{"b":[{"name":"b1"}],"a":[{"name":"a1","label":"conversation"},{"name":"a2"}]}"#,
        )
        .unwrap();
        let keys: Vec<_> = manifest.groups().map(|(k, v)| (k, v.len())).collect();
        assert_eq!(keys, vec![("a", 2), ("b", 1)]);
    }
}
