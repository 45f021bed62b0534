// Chat session: one policy, one conversation history, one turn at a time.
//
// `submit` borrows the session mutably for the whole turn, so a second
// evaluation can't start while one is in flight and the policy can't be
// edited underneath it. The orchestrator gets a snapshot of the policy taken
// when the turn starts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ChatBackendError;
use crate::gateway::{ChatBackend, ChatReply};
use crate::orchestrator::Moderator;
use crate::policy::{PolicyConfiguration, PolicyEdit};
use crate::verdict::Verdict;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
    pub sent_at: DateTime<Utc>,
}

impl ChatMessage {
    fn now(role: &str, content: &str) -> Self {
        Self {
            role: role.to_string(),
            content: content.to_string(),
            sent_at: Utc::now(),
        }
    }
}

/// How a turn ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Turn {
    /// Moderation blocked the message; the backend was never called.
    Rejected(Verdict),
    /// The message passed and the backend answered.
    Replied { reply: ChatReply, verdict: Verdict },
}

pub struct Session<'a> {
    moderator: &'a Moderator,
    backend: &'a dyn ChatBackend,
    policy: PolicyConfiguration,
    history: Vec<ChatMessage>,
}

impl<'a> Session<'a> {
    pub fn new(moderator: &'a Moderator, backend: &'a dyn ChatBackend, policy: PolicyConfiguration) -> Self {
        Self {
            moderator,
            backend,
            policy,
            history: Vec::new(),
        }
    }

    pub fn policy(&self) -> &PolicyConfiguration {
        &self.policy
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    pub fn edit_policy(&mut self, edit: PolicyEdit) {
        edit.apply(&mut self.policy);
    }

    /// Screen a message and, if it passes, forward it to the chat backend.
    ///
    /// The user message is always recorded; the assistant reply only when
    /// the backend answered.
    pub async fn submit(&mut self, message: &str) -> Result<Turn, ChatBackendError> {
        self.history.push(ChatMessage::now("user", message));

        let snapshot = self.policy.clone();
        let verdict = self.moderator.evaluate(message, &snapshot).await;
        if !verdict.passed {
            return Ok(Turn::Rejected(verdict));
        }

        let reply = self.backend.forward(message).await?;
        self.history.push(ChatMessage::now(&reply.role, &reply.content));
        Ok(Turn::Replied { reply, verdict })
    }
}
