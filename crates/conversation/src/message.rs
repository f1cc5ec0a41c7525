//! Request and response bodies of the `message` endpoint.
//!
//! Field names follow the wire format. Every response field is optional on the
//! wire: absent fields decode to their empty value and empty fields are
//! omitted again on encode, so a decoded response re-encodes without dropping
//! anything that was populated.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Dialog state threaded between turns.
///
/// The shape is defined by the workspace's dialog, not by this crate; values
/// are forwarded verbatim.
pub type Context = Map<String, Value>;

/// User input for one turn.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageInput {
    /// The utterance. Always serialised, even when empty: an empty utterance
    /// asks the dialog for its opening turn.
    #[serde(default)]
    pub text: String,
}

/// Body of `POST /workspaces/{workspace_id}/message`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub input: MessageInput,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Context>,
}

impl Message {
    /// Creates a message carrying `text` and no context.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            input: MessageInput { text: text.into() },
            context: None,
        }
    }

    /// Attaches dialog context returned by a previous turn.
    pub fn with_context(mut self, context: Context) -> Self {
        self.context = Some(context);
        self
    }
}

/// A recognised intent and the classifier's confidence in it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Intent {
    pub intent: String,
    pub confidence: f64,
}

/// Character-offset span `[start, end)` of an entity within the input text.
///
/// Serialised as a two-element array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span(pub u32, pub u32);

impl Span {
    pub fn start(self) -> u32 {
        self.0
    }

    pub fn end(self) -> u32 {
        self.1
    }
}

/// A recognised entity value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Entity {
    pub entity: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Span>,
}

/// What the dialog produced for this turn.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageOutput {
    /// Lines to present to the user.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub text: Vec<String>,
    /// Diagnostic entries emitted by the dialog runtime.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub log_messages: Vec<Value>,
    /// Dialog nodes visited while producing this output.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub hit_nodes: Vec<String>,
}

impl MessageOutput {
    fn is_empty(&self) -> bool {
        self.text.is_empty() && self.log_messages.is_empty() && self.hit_nodes.is_empty()
    }
}

/// Response of the `message` endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<MessageInput>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub intents: Vec<Intent>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub entities: Vec<Entity>,
    #[serde(skip_serializing_if = "MessageOutput::is_empty")]
    pub output: MessageOutput,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub context: Context,
}

impl MessageResponse {
    /// Returns the highest-confidence intent, if any was recognised.
    pub fn top_intent(&self) -> Option<&Intent> {
        self.intents
            .iter()
            .max_by(|a, b| a.confidence.total_cmp(&b.confidence))
    }

    /// Builds the next turn's message, carrying this response's context.
    pub fn next_message(&self, text: impl Into<String>) -> Message {
        Message::new(text).with_context(self.context.clone())
    }
}
