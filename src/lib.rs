pub mod agent;
pub mod audio;
pub mod config;
pub mod error;
pub mod http;
pub mod position;
pub mod session;
pub mod transcript;

pub use agent::{
    AgentEvent, AgentSession, CompletionAgent, CompletionTurn, NatsAgent, OutboundFrame,
    OutputModality, RealtimeAgent, SessionOpenOptions,
};
pub use audio::{
    AudioSegment, AudioSink, CaptureBackend, CaptureBackendFactory, CaptureBlock, CaptureConfig,
    MonotonicClock, PlaybackClock, PlaybackPipeline, SpeakerSink,
};
pub use config::Config;
pub use error::{Result, SessionError};
pub use http::{create_router, AppState};
pub use position::JobPosition;
pub use session::{InterviewSession, SessionConfig, SessionState, SessionStats, TextTurnHandler};
pub use transcript::{ConversationMessage, Speaker, TranscriptAssembler, TranscriptLog};
