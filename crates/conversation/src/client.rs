//! The Conversation service client.

use std::sync::Arc;

use tracing::{debug, instrument};
use watson::{
    ApiVersion, ClientConfig, Connector, Credentials, HttpMethod, Transport, TransportRequest,
    WatsonError, WorkspaceId,
};

use crate::message::{Message, MessageResponse};

/// Service name used when the configuration leaves it empty.
pub const DEFAULT_SERVICE_NAME: &str = "conversation";

/// Production endpoint used when the configuration leaves the URL empty.
pub const DEFAULT_URL: &str = "https://gateway.watsonplatform.net/conversation/api";

/// API version this client speaks.
pub const API_VERSION: ApiVersion = ApiVersion::new("v1", "2017-05-05");

/// Client for the Watson Conversation `message` API.
///
/// Bound to one set of [`Credentials`] and one [`ApiVersion`] for its whole
/// lifetime. It keeps no per-call or per-conversation state, so a single
/// instance (or its clones, which share the transport) can serve concurrent
/// calls.
#[derive(Clone)]
pub struct ConversationClient {
    credentials: Credentials,
    version: ApiVersion,
    transport: Arc<dyn Transport>,
}

impl ConversationClient {
    /// Builds a client from `config`, connecting through `connector`.
    ///
    /// An empty service name defaults to [`DEFAULT_SERVICE_NAME`] and an empty
    /// URL to [`DEFAULT_URL`].
    ///
    /// # Errors
    ///
    /// Returns [`WatsonError::ConstructionError`] when the connector rejects
    /// the credentials. No client is produced in that case.
    pub fn new(config: ClientConfig, connector: &impl Connector) -> Result<Self, WatsonError> {
        let mut credentials = config.credentials;
        if credentials.service_name().is_empty() {
            credentials = credentials.with_service_name(DEFAULT_SERVICE_NAME);
        }
        if credentials.url().is_empty() {
            credentials = credentials.with_url(DEFAULT_URL);
        }

        let transport = connector
            .connect(&credentials)
            .map_err(WatsonError::ConstructionError)?;

        debug!(
            service = credentials.service_name(),
            url = credentials.url(),
            version = %API_VERSION,
            "conversation client ready"
        );

        Ok(Self {
            credentials,
            version: API_VERSION,
            transport,
        })
    }

    /// The credentials this client was built with, after defaulting.
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn version(&self) -> ApiVersion {
        self.version
    }

    /// Sends one utterance to a workspace and returns the dialog's reply.
    ///
    /// `text` may be empty; an empty utterance starts a conversation. No
    /// context is sent, so each call is a first turn from the service's point
    /// of view. Use [`ConversationClient::send`] to continue a conversation.
    ///
    /// # Errors
    ///
    /// [`WatsonError::EncodingError`], [`WatsonError::TransportError`] or
    /// [`WatsonError::DecodingError`].
    pub async fn message(
        &self,
        workspace_id: &WorkspaceId,
        text: &str,
    ) -> Result<MessageResponse, WatsonError> {
        self.send(workspace_id, &Message::new(text)).await
    }

    /// Sends a caller-built [`Message`], including any context from a
    /// previous turn.
    ///
    /// # Errors
    ///
    /// Same as [`ConversationClient::message`].
    #[instrument(skip_all, fields(workspace = %workspace_id))]
    pub async fn send(
        &self,
        workspace_id: &WorkspaceId,
        message: &Message,
    ) -> Result<MessageResponse, WatsonError> {
        let body = serde_json::to_vec(message).map_err(|e| WatsonError::EncodingError {
            message: e.to_string(),
        })?;

        let request = TransportRequest::new(HttpMethod::Post, self.message_path(workspace_id))
            .with_header("Content-Type", "application/json")
            .with_body(body);

        let raw = self
            .transport
            .make_request(request)
            .await
            .map_err(WatsonError::TransportError)?;

        let response: MessageResponse =
            serde_json::from_slice(&raw).map_err(|e| WatsonError::DecodingError {
                message: e.to_string(),
            })?;

        debug!(
            intents = response.intents.len(),
            entities = response.entities.len(),
            "received conversation response"
        );
        Ok(response)
    }

    fn message_path(&self, workspace_id: &WorkspaceId) -> String {
        format!(
            "{}/workspaces/{}/message?{}",
            self.version.path_prefix(),
            workspace_id,
            self.version.query()
        )
    }
}

impl std::fmt::Debug for ConversationClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationClient")
            .field("credentials", &self.credentials)
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}
