//! Watson Conversation CLI entry point.
//!
//! This binary is the composition root for the workspace. Responsibilities:
//!
//! 1. **Wire observability** — configure `tracing-subscriber` with an
//!    `EnvFilter` (`RUST_LOG`, default `warn`) and either a human-readable or a
//!    JSON formatting layer. Events from every crate flow through it.
//! 2. **Obtain credentials** — from explicit flags when `--url` and some
//!    authentication (`--username` or `--api-key`) are given, otherwise from the
//!    `VCAP_SERVICES` manifest via [`watson::resolve_from_env`]. A bare `--url`
//!    only replaces the URL of the manifest binding.
//! 3. **Construct infrastructure** — build an [`HttpConnector`] and inject it
//!    into [`ConversationClient`].
//! 4. **Send one message** and print the response as pretty JSON on stdout.

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use conversation::ConversationClient;
use tracing::info;
use tracing_subscriber::EnvFilter;
use transport::{HttpConnector, HttpTransportConfig};
use watson::{
    resolve_from_env, ClientConfig, Credentials, ServiceName, WatsonError, WorkspaceId,
};

/// Send a message to a Watson Conversation workspace.
#[derive(Debug, Parser)]
#[command(name = "watson-conversation", version)]
struct Args {
    /// Workspace (dialog definition) to address.
    #[arg(long, env = "CONVERSATION_WORKSPACE_ID")]
    workspace: String,

    /// Utterance to send. Empty starts a new conversation.
    #[arg(long, default_value = "")]
    text: String,

    /// Service name looked up in VCAP_SERVICES (prefix match).
    #[arg(long, default_value = "conversation")]
    service: String,

    /// Restrict the VCAP_SERVICES lookup to this plan.
    #[arg(long, default_value = "")]
    plan: String,

    /// Service URL. With --username or --api-key, credentials come from flags
    /// instead of VCAP_SERVICES; on its own it overrides the manifest URL.
    #[arg(long)]
    url: Option<String>,

    #[arg(long, env = "CONVERSATION_USERNAME", default_value = "")]
    username: String,

    #[arg(long, env = "CONVERSATION_PASSWORD", default_value = "", hide_env_values = true)]
    password: String,

    #[arg(long, env = "CONVERSATION_APIKEY", default_value = "", hide_env_values = true)]
    api_key: String,

    /// Request timeout in seconds.
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,

    /// Emit logs as JSON.
    #[arg(long)]
    log_json: bool,
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Picks the credentials for this run. `lookup` resolves `(service, plan)`
/// against the service manifest.
fn credentials<F>(args: &Args, lookup: F) -> Result<Credentials>
where
    F: FnOnce(&str, &str) -> Result<Credentials, WatsonError>,
{
    let service = ServiceName::new(args.service.as_str()).context("--service must not be empty")?;
    let has_auth = !args.username.is_empty() || !args.api_key.is_empty();

    match &args.url {
        Some(url) if has_auth => Ok(Credentials::new(service.as_str())
            .with_url(url.as_str())
            .with_basic_auth(args.username.as_str(), args.password.as_str())
            .with_api_key(args.api_key.as_str())),
        url => {
            let resolved = lookup(service.as_str(), &args.plan)
                .with_context(|| format!("looking up '{service}' in {}", watson::VCAP_SERVICES))?;
            Ok(match url {
                Some(url) => resolved.with_url(url.as_str()),
                None => resolved,
            })
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.log_json);

    let workspace =
        WorkspaceId::new(args.workspace.as_str()).context("--workspace must be a non-empty URL path segment")?;
    let credentials = credentials(&args, resolve_from_env)?;

    let connector = HttpConnector::new(HttpTransportConfig {
        timeout: Duration::from_secs(args.timeout_secs),
        ..HttpTransportConfig::default()
    });
    let client = ConversationClient::new(ClientConfig::new(credentials), &connector)
        .context("creating conversation client")?;
    info!(url = client.credentials().url(), workspace = %workspace, "sending message");

    let response = client
        .message(&workspace, &args.text)
        .await
        .with_context(|| format!("sending message to workspace '{workspace}'"))?;

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use watson::resolve;

    const MANIFEST: &str = r#"{"conversation":[{"name":"conversation","plan":"standard","credentials":{"url":"https://bound/api","username":"bu","password":"bp"}}]}"#;

    fn parse(extra: &[&str]) -> Args {
        let mut argv = vec!["watson-conversation", "--workspace", "ws-1"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    fn from_manifest(service: &str, plan: &str) -> Result<Credentials, WatsonError> {
        resolve(MANIFEST, service, plan)
    }

    fn unreachable_lookup(_: &str, _: &str) -> Result<Credentials, WatsonError> {
        panic!("manifest must not be consulted");
    }

    #[test]
    fn test_url_with_basic_auth_skips_the_manifest() {
        let args = parse(&["--url", "https://flag/api", "--username", "u", "--password", "p"]);
        let creds = credentials(&args, unreachable_lookup).unwrap();

        assert_eq!(creds.url(), "https://flag/api");
        assert_eq!(creds.username(), "u");
        assert_eq!(creds.password(), "p");
    }

    #[test]
    fn test_url_with_api_key_skips_the_manifest() {
        let args = parse(&["--url", "https://flag/api", "--api-key", "k"]);
        let creds = credentials(&args, unreachable_lookup).unwrap();

        assert_eq!(creds.api_key(), "k");
        assert!(!creds.has_basic_auth());
    }

    #[test]
    fn test_bare_url_overrides_only_the_manifest_url() {
        let args = parse(&["--url", "https://flag/api"]);
        let creds = credentials(&args, from_manifest).unwrap();

        assert_eq!(creds.url(), "https://flag/api");
        assert_eq!(creds.username(), "bu");
        assert_eq!(creds.password(), "bp");
        assert_eq!(creds.service_plan(), "standard");
    }

    #[test]
    fn test_without_url_the_manifest_binding_is_used() {
        let args = parse(&["--username", "ignored"]);
        let creds = credentials(&args, from_manifest).unwrap();

        assert_eq!(creds.url(), "https://bound/api");
        assert_eq!(creds.username(), "bu");
    }

    #[test]
    fn test_lookup_failure_is_reported() {
        let args = parse(&["--url", "https://flag/api", "--plan", "premium"]);
        let err = credentials(&args, from_manifest).unwrap_err();

        let watson = err.downcast_ref::<WatsonError>().unwrap();
        assert!(watson.is_service_not_found());
    }
}
