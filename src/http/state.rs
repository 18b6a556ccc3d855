use crate::agent::NatsAgent;
use crate::config::Config;
use crate::position::JobPosition;
use crate::session::{InterviewSession, TextTurnHandler};
use crate::transcript::TranscriptLog;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// One running interview: the streaming session plus the text turn path,
/// both writing to the same conversation log.
pub struct ActiveInterview {
    pub session: Arc<InterviewSession>,
    pub text_turns: TextTurnHandler,
    pub log: TranscriptLog,
    pub position: JobPosition,
}

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Active interviews (interview_id → interview)
    pub interviews: Arc<RwLock<HashMap<String, Arc<ActiveInterview>>>>,

    /// Shared agent transport
    pub agent: Arc<NatsAgent>,

    /// Service configuration
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(agent: Arc<NatsAgent>, config: Arc<Config>) -> Self {
        Self {
            interviews: Arc::new(RwLock::new(HashMap::new())),
            agent,
            config,
        }
    }
}
