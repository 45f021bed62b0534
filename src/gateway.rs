// Response gateway: forwards approved messages to the chat backend.
//
// One request per message, no retries. A backend failure is returned as
// ChatBackendError so callers can tell it apart from a moderation rejection.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::client::ApiClient;
use crate::error::{ApiError, ChatBackendError};

pub const DEFAULT_CONVERSATION_ID: &str = "e4f55a1c-122f-45ea-9ceb-2b09a07674de";

/// The assistant's answer to a forwarded message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    pub role: String,
    pub content: String,
}

/// Anything that can answer a chat message.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn forward(&self, message: &str) -> Result<ChatReply, ChatBackendError>;
}

/// Continues a fixed conversation on the provider's chat endpoint.
pub struct ConversationGateway {
    client: ApiClient,
    conversation_id: String,
}

impl ConversationGateway {
    pub fn new(client: ApiClient, conversation_id: impl Into<String>) -> Self {
        Self {
            client,
            conversation_id: conversation_id.into(),
        }
    }
}

#[async_trait]
impl ChatBackend for ConversationGateway {
    async fn forward(&self, message: &str) -> Result<ChatReply, ChatBackendError> {
        let path = format!("conversations/{}/continue-sync", self.conversation_id);
        let response: ContinueResponse = self
            .client
            .patch(&path, &ContinueRequest { message })
            .await?;

        let reply = response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message)
            .ok_or_else(|| ApiError::ResponseShape("chat response has no choices".to_string()))?;

        debug!(role = %reply.role, "Chat backend replied");
        Ok(reply)
    }
}

// --- Conversation API request/response types ---

#[derive(Serialize)]
struct ContinueRequest<'a> {
    message: &'a str,
}

#[derive(Deserialize)]
struct ContinueResponse {
    #[serde(default)]
    choices: Vec<ContinueChoice>,
}

#[derive(Deserialize)]
struct ContinueChoice {
    message: ChatReply,
}
