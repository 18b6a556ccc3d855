//! Vendor-neutral boundary to the remote interview agent.
//!
//! The session controller only ever sees these traits and types; the NATS
//! adapter in [`super::nats`] is one implementation, test doubles are another.

use crate::error::Result;
use crate::transcript::Speaker;
use tokio::sync::{mpsc, watch};

/// Everything the remote agent can tell us during a streaming session.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentEvent {
    /// Incremental speech-to-text fragment of the candidate's utterance.
    PartialUserTranscript { text: String },
    /// Incremental transcript fragment of the agent's spoken reply.
    PartialAgentTranscript { text: String },
    /// Decoded agent speech ready for playback.
    AudioChunk { samples: Vec<i16>, sample_rate: u32 },
    /// The current exchange is finished; committed transcripts follow from
    /// the accumulated partials.
    TurnComplete,
    /// The candidate started speaking over the agent (barge-in).
    Interrupted,
    /// Transport or agent failure; terminal for the session.
    Error { reason: String },
    /// The agent closed the session.
    Closed,
}

/// Output the agent is asked to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputModality {
    Audio,
}

impl OutputModality {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputModality::Audio => "audio",
        }
    }
}

/// Parameters for opening a streaming session.
#[derive(Debug, Clone)]
pub struct SessionOpenOptions {
    pub session_id: String,
    pub system_instruction: String,
    pub output_modality: OutputModality,
    /// Voice profile for synthesized agent speech.
    pub voice: String,
    pub input_sample_rate: u32,
}

/// One quantized microphone frame headed for the agent.
#[derive(Debug, Clone)]
pub struct OutboundFrame {
    pub samples: Vec<i16>,
    pub sample_rate: u32,
}

/// Signals the transport tasks of an open session to shut down.
pub struct CloseHandle {
    tx: watch::Sender<bool>,
}

impl CloseHandle {
    pub fn close(&self) {
        let _ = self.tx.send(true);
    }
}

/// Create the close signal pair shared by a session's transport tasks.
pub fn close_channel() -> (CloseHandle, watch::Receiver<bool>) {
    let (tx, rx) = watch::channel(false);
    (CloseHandle { tx }, rx)
}

/// An open streaming session with the remote agent.
///
/// Frames go out through a bounded channel (senders must `try_send` and drop
/// on backpressure rather than buffer without bound); events come back in
/// arrival order.
pub struct AgentSession {
    pub frames: mpsc::Sender<OutboundFrame>,
    pub events: mpsc::Receiver<AgentEvent>,
    pub close: CloseHandle,
}

impl AgentSession {
    pub fn split(
        self,
    ) -> (
        mpsc::Sender<OutboundFrame>,
        mpsc::Receiver<AgentEvent>,
        CloseHandle,
    ) {
        (self.frames, self.events, self.close)
    }
}

/// Streaming side of the remote agent.
#[async_trait::async_trait]
pub trait RealtimeAgent: Send + Sync {
    /// Open a bidirectional streaming session.
    ///
    /// Implementations must fail with a `Connection` error rather than hang
    /// when the remote side does not acknowledge the open.
    async fn open(&self, opts: SessionOpenOptions) -> Result<AgentSession>;
}

/// One ordered turn of the conversation for the non-streaming path.
#[derive(Debug, Clone)]
pub struct CompletionTurn {
    pub speaker: Speaker,
    pub text: String,
}

/// Non-streaming request/response side of the remote agent.
#[async_trait::async_trait]
pub trait CompletionAgent: Send + Sync {
    /// Send the full ordered conversation and receive exactly one reply.
    async fn complete(&self, system_instruction: &str, turns: &[CompletionTurn])
        -> Result<String>;
}
