use crate::agent::{CompletionAgent, CompletionTurn};
use crate::error::{Result, SessionError};
use crate::position::JobPosition;
use crate::transcript::{ConversationMessage, Speaker, TranscriptLog};
use std::sync::Arc;
use tracing::{info, warn};

/// Non-streaming alternate path: one complete typed answer per request.
///
/// The user message is appended optimistically before the request goes out;
/// on failure it stays in the log without a reply so the candidate can see
/// what they sent and resubmit.
pub struct TextTurnHandler {
    agent: Arc<dyn CompletionAgent>,
    log: TranscriptLog,
    position: JobPosition,
}

impl TextTurnHandler {
    pub fn new(agent: Arc<dyn CompletionAgent>, log: TranscriptLog, position: JobPosition) -> Self {
        Self {
            agent,
            log,
            position,
        }
    }

    /// Send one typed message with the full prior conversation as context.
    /// Appends exactly one agent reply on success.
    pub async fn send_text(&self, message: &str) -> Result<ConversationMessage> {
        let message = message.trim();
        if message.is_empty() {
            return Err(SessionError::request("message is empty"));
        }

        self.log
            .append(ConversationMessage::new(Speaker::User, message))
            .await;

        let turns: Vec<CompletionTurn> = self
            .log
            .snapshot()
            .await
            .into_iter()
            .map(|m| CompletionTurn {
                speaker: m.speaker,
                text: m.text,
            })
            .collect();

        let instruction = self.position.completion_instruction();
        let reply = match self.agent.complete(&instruction, &turns).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Text turn failed, user message kept in log: {}", e);
                return Err(e);
            }
        };

        info!("Text turn completed ({} chars)", reply.len());

        let reply_message = ConversationMessage::new(Speaker::Agent, reply);
        self.log.append(reply_message.clone()).await;
        Ok(reply_message)
    }
}
