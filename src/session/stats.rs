use super::session::SessionState;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Statistics about an interview session
#[derive(Debug, Clone, Serialize)]
pub struct SessionStats {
    /// Current lifecycle state
    pub state: SessionState,

    /// When the session was created
    pub started_at: DateTime<Utc>,

    /// Total duration in seconds
    pub duration_secs: f64,

    /// Audio frames forwarded to the agent
    pub frames_sent: usize,

    /// Audio frames dropped because the transport was not ready
    pub frames_dropped: usize,

    /// Messages committed to the conversation log
    pub messages_count: usize,
}
