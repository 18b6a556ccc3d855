use crate::audio::CaptureConfig;
use crate::position::JobPosition;
use std::time::Duration;

/// Configuration for one interview session
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Unique session identifier (e.g., "iv-7f3b...")
    pub session_id: String,

    /// The job opening the candidate is interviewing for; drives the
    /// interviewer system instruction.
    pub position: JobPosition,

    /// Voice profile for the agent's synthesized speech.
    pub voice: String,

    /// Microphone capture settings (the agent expects 16kHz mono).
    pub capture: CaptureConfig,

    /// Sample rate of agent speech segments (24kHz).
    pub playback_sample_rate: u32,

    /// How long to wait for the agent to acknowledge a session open before
    /// failing instead of hanging.
    pub open_timeout: Duration,

    /// Grace window after a soft stop, letting trailing partial transcripts
    /// and the final turn-complete arrive before the session closes.
    pub grace_period: Duration,
}

impl SessionConfig {
    pub fn new(position: JobPosition) -> Self {
        Self {
            session_id: format!("iv-{}", uuid::Uuid::new_v4()),
            position,
            voice: "Puck".to_string(),
            capture: CaptureConfig::default(),
            playback_sample_rate: 24000,
            open_timeout: Duration::from_secs(10),
            grace_period: Duration::from_millis(800),
        }
    }
}
