pub mod messages;
pub mod nats;
pub mod service;

pub use nats::NatsAgent;
pub use service::{
    close_channel, AgentEvent, AgentSession, CloseHandle, CompletionAgent, CompletionTurn,
    OutboundFrame, OutputModality, RealtimeAgent, SessionOpenOptions,
};
