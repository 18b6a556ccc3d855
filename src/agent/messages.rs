use crate::transcript::Speaker;
use serde::{Deserialize, Serialize};

/// Request to open a streaming interview session, sent as a request/reply
/// handshake before any audio flows.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionOpenRequest {
    pub session_id: String,
    pub system_instruction: String,
    pub output_modality: String,
    pub voice: String,
    pub input_sample_rate: u32,
}

/// Acknowledgement for a session open request.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionOpenAck {
    pub accepted: bool,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Audio frame message published to the agent
#[derive(Debug, Serialize, Deserialize)]
pub struct AudioFrameMessage {
    pub session_id: String,
    pub sequence: u32,
    pub pcm: String, // Base64-encoded PCM16 bytes
    pub sample_rate: u32,
    pub timestamp: String, // RFC3339 timestamp
    #[serde(rename = "final")]
    pub final_frame: bool,
}

/// Event received from the agent during a streaming session
#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentEventMessage {
    UserTranscript { text: String },
    AgentTranscript { text: String },
    AudioChunk { pcm: String, sample_rate: u32 },
    TurnComplete,
    Interrupted,
    Error { reason: String },
    Closed,
}

/// Non-streaming completion request carrying the full ordered conversation.
#[derive(Debug, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub system_instruction: String,
    pub turns: Vec<CompletionTurnMessage>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CompletionTurnMessage {
    pub speaker: Speaker,
    pub text: String,
}

/// Reply to a completion request; exactly one of `text` / `error` is set.
#[derive(Debug, Serialize, Deserialize)]
pub struct CompletionReply {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}
