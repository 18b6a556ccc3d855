//! Interview session management
//!
//! This module provides the `InterviewSession` abstraction that manages:
//! - Microphone capture and PCM16 frame forwarding
//! - The streaming connection to the remote interview agent
//! - Transcript assembly into the conversation log
//! - Gapless playback of agent speech with barge-in interruption
//! - Session lifecycle and statistics
//!
//! plus the `TextTurnHandler` for the non-streaming typed-answer path.

mod config;
mod session;
mod stats;
mod text_turn;

pub use config::SessionConfig;
pub use session::{InterviewSession, SessionState};
pub use stats::SessionStats;
pub use text_turn::TextTurnHandler;
