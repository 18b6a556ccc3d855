use super::TranscriptLog;

/// Accumulates incremental partial transcripts for the currently open turn.
///
/// The remote agent streams speech-to-text fragments for the candidate and
/// text fragments for its own reply; both are cumulative deltas that must be
/// concatenated in arrival order. Neither buffer is part of the transcript
/// until a turn-complete signal commits it.
#[derive(Debug, Default)]
pub struct TranscriptAssembler {
    user: String,
    agent: String,
}

impl TranscriptAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a speech-to-text fragment of the candidate's current utterance.
    pub fn push_user(&mut self, delta: &str) {
        self.user.push_str(delta);
    }

    /// Append a fragment of the agent's spoken reply transcript.
    pub fn push_agent(&mut self, delta: &str) {
        self.agent.push_str(delta);
    }

    /// The uncommitted user text, for live interim display.
    pub fn user_preview(&self) -> &str {
        &self.user
    }

    /// Commit the open turn to the log and reset both accumulators.
    ///
    /// Returns the number of messages appended (0 when both buffers were
    /// empty or the user text was a redelivered duplicate).
    pub async fn commit(&mut self, log: &TranscriptLog) -> usize {
        let appended = log.commit_turn(&self.user, &self.agent).await;
        self.reset();
        appended
    }

    /// Drop any uncommitted text, e.g. when the session restarts.
    pub fn reset(&mut self) {
        self.user.clear();
        self.agent.clear();
    }
}
