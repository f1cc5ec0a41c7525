//! Watson Conversation service client.
//!
//! [`ConversationClient`] turns a user utterance into a `message` call against
//! a Conversation workspace and decodes the reply into a [`MessageResponse`]
//! (intents, entities, output text and dialog context).
//!
//! ## Architectural Layer
//!
//! **Service client.** Request construction, path/version handling and JSON
//! (de)serialisation live here. The HTTP exchange itself goes through
//! [`watson::Transport`], so this crate has no HTTP dependency.
//!
//! ```no_run
//! # async fn run(connector: impl watson::Connector) -> Result<(), watson::WatsonError> {
//! use conversation::ConversationClient;
//! use watson::{resolve_from_env, ClientConfig, WorkspaceId};
//!
//! let credentials = resolve_from_env("conversation", "")?;
//! let client = ConversationClient::new(ClientConfig::new(credentials), &connector)?;
//! let workspace = WorkspaceId::new("my-workspace").expect("valid workspace id");
//!
//! let first = client.message(&workspace, "").await?;
//! let second = client.send(&workspace, &first.next_message("hello")).await?;
//! println!("{:?}", second.output.text);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod message;

pub use client::{ConversationClient, API_VERSION, DEFAULT_SERVICE_NAME, DEFAULT_URL};
pub use message::{
    Context, Entity, Intent, Message, MessageInput, MessageOutput, MessageResponse, Span,
};
