use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Who said a line in the interview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Agent,
}

/// A single committed line of the interview transcript.
///
/// Messages are never mutated or deleted once appended; append order is the
/// canonical transcript order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub speaker: Speaker,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl ConversationMessage {
    pub fn new(speaker: Speaker, text: impl Into<String>) -> Self {
        Self {
            speaker,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Append-only conversation log shared between the streaming session and the
/// text turn path.
///
/// The only mutation is appending: the assembler commits finished turns, the
/// text turn handler appends one user message and at most one reply. All
/// writers go through this handle, so ordering is the lock acquisition order.
#[derive(Clone, Default)]
pub struct TranscriptLog {
    messages: Arc<Mutex<Vec<ConversationMessage>>>,
}

impl TranscriptLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one message unconditionally.
    pub async fn append(&self, message: ConversationMessage) {
        self.messages.lock().await.push(message);
    }

    /// Commit one finished turn.
    ///
    /// Trims both texts; appends a user message only when non-empty and
    /// different from the most recently appended message's text (the remote
    /// side occasionally redelivers the same user utterance across rapid
    /// consecutive turns), then an agent message when non-empty. Returns how
    /// many messages were appended; both sides empty is a no-op.
    pub async fn commit_turn(&self, user_text: &str, agent_text: &str) -> usize {
        let user_text = user_text.trim();
        let agent_text = agent_text.trim();

        let mut messages = self.messages.lock().await;
        let mut appended = 0;

        if !user_text.is_empty() {
            let duplicate = messages
                .last()
                .is_some_and(|last| last.text == user_text);
            if !duplicate {
                messages.push(ConversationMessage::new(Speaker::User, user_text));
                appended += 1;
            }
        }

        if !agent_text.is_empty() {
            messages.push(ConversationMessage::new(Speaker::Agent, agent_text));
            appended += 1;
        }

        appended
    }

    /// Snapshot of the full transcript, in append order.
    pub async fn snapshot(&self) -> Vec<ConversationMessage> {
        self.messages.lock().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.messages.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.messages.lock().await.is_empty()
    }

    /// Text of the most recently appended message, if any.
    pub async fn last_text(&self) -> Option<String> {
        self.messages.lock().await.last().map(|m| m.text.clone())
    }
}
