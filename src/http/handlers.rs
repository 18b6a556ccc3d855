use super::state::{ActiveInterview, AppState};
use crate::audio::{CaptureBackendFactory, CaptureConfig, PlaybackPipeline, SpeakerSink};
use crate::error::SessionError;
use crate::position::{self, JobPosition, OPENING_GREETING};
use crate::session::{InterviewSession, SessionConfig, SessionStats, TextTurnHandler};
use crate::transcript::{ConversationMessage, Speaker, TranscriptLog};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct StartInterviewRequest {
    /// Which job opening the candidate is interviewing for
    pub position_id: String,

    /// Optional voice profile override
    pub voice: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StartInterviewResponse {
    pub interview_id: String,
    pub status: String,
    pub position: JobPosition,
    pub greeting: String,
}

#[derive(Debug, Serialize)]
pub struct StopInterviewResponse {
    pub interview_id: String,
    pub status: String,
    /// The finished interview hand-off: the full conversation log.
    pub messages: Vec<ConversationMessage>,
    pub stats: SessionStats,
}

#[derive(Debug, Serialize)]
pub struct InterviewStatusResponse {
    pub interview_id: String,
    pub position: JobPosition,
    pub stats: SessionStats,
    pub last_error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TranscriptResponse {
    pub interview_id: String,
    pub messages: Vec<ConversationMessage>,
    /// Uncommitted user speech for live display
    pub interim_user_text: String,
}

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct SendMessageResponse {
    pub reply: ConversationMessage,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_status(e: &SessionError) -> StatusCode {
    match e {
        SessionError::DeviceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        SessionError::Connection { .. } => StatusCode::BAD_GATEWAY,
        SessionError::Request { .. } => StatusCode::BAD_GATEWAY,
        SessionError::PipelineClosed => StatusCode::CONFLICT,
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /health
pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

/// GET /positions
/// The job openings candidates can interview for
pub async fn list_positions() -> impl IntoResponse {
    Json(position::catalog())
}

/// POST /interviews/start
/// Open a voice interview session for a position
pub async fn start_interview(
    State(state): State<AppState>,
    Json(req): Json<StartInterviewRequest>,
) -> impl IntoResponse {
    let Some(pos) = position::find(&req.position_id) else {
        return (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("Unknown position: {}", req.position_id),
            }),
        )
            .into_response();
    };

    info!("Starting interview for position: {}", pos.title);

    let audio = &state.config.audio;
    let agent_cfg = &state.config.agent;
    let mut session_config = SessionConfig::new(pos.clone());
    session_config.voice = req.voice.unwrap_or_else(|| agent_cfg.voice.clone());
    session_config.capture = CaptureConfig {
        sample_rate: audio.capture_sample_rate,
        block_samples: audio.capture_block_samples,
    };
    session_config.playback_sample_rate = audio.playback_sample_rate;
    session_config.open_timeout = agent_cfg.open_timeout();
    session_config.grace_period = agent_cfg.grace_period();

    let interview_id = session_config.session_id.clone();

    // Every interview begins with the agent's scripted greeting.
    let log = TranscriptLog::new();
    log.append(ConversationMessage::new(Speaker::Agent, OPENING_GREETING))
        .await;

    let capture = match CaptureBackendFactory::create(session_config.capture.clone()) {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to create capture backend: {}", e);
            return (error_status(&e), Json(ErrorResponse { error: e.to_string() })).into_response();
        }
    };

    let sink = match SpeakerSink::open().await {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to open speaker sink: {}", e);
            return (error_status(&e), Json(ErrorResponse { error: e.to_string() })).into_response();
        }
    };
    let playback = PlaybackPipeline::new(sink.clock(), Box::new(sink));

    let session = Arc::new(InterviewSession::new(
        session_config,
        state.agent.clone(),
        log.clone(),
    ));

    if let Err(e) = session.start(capture, playback).await {
        error!("Failed to start interview session: {}", e);
        return (error_status(&e), Json(ErrorResponse { error: e.to_string() })).into_response();
    }

    let interview = Arc::new(ActiveInterview {
        session,
        text_turns: TextTurnHandler::new(state.agent.clone(), log.clone(), pos.clone()),
        log,
        position: pos.clone(),
    });

    {
        let mut interviews = state.interviews.write().await;
        interviews.insert(interview_id.clone(), interview);
    }

    info!("Interview {} started", interview_id);

    (
        StatusCode::OK,
        Json(StartInterviewResponse {
            interview_id,
            status: "listening".to_string(),
            position: pos,
            greeting: OPENING_GREETING.to_string(),
        }),
    )
        .into_response()
}

/// POST /interviews/:interview_id/stop
/// Soft-stop the session and hand the finished conversation log back
pub async fn stop_interview(
    State(state): State<AppState>,
    Path(interview_id): Path<String>,
) -> impl IntoResponse {
    let Some(interview) = state.interviews.read().await.get(&interview_id).cloned() else {
        return not_found(&interview_id);
    };

    interview.session.stop().await;

    let messages = interview.log.snapshot().await;
    let stats = interview.session.stats().await;

    // The interview is over; the in-memory log is handed off and discarded.
    state.interviews.write().await.remove(&interview_id);

    info!(
        "Interview {} finished ({} messages)",
        interview_id,
        messages.len()
    );

    (
        StatusCode::OK,
        Json(StopInterviewResponse {
            interview_id,
            status: "closed".to_string(),
            messages,
            stats,
        }),
    )
        .into_response()
}

/// GET /interviews/:interview_id/status
pub async fn interview_status(
    State(state): State<AppState>,
    Path(interview_id): Path<String>,
) -> impl IntoResponse {
    let Some(interview) = state.interviews.read().await.get(&interview_id).cloned() else {
        return not_found(&interview_id);
    };

    let stats = interview.session.stats().await;
    let last_error = interview.session.last_error().await;

    (
        StatusCode::OK,
        Json(InterviewStatusResponse {
            interview_id,
            position: interview.position.clone(),
            stats,
            last_error,
        }),
    )
        .into_response()
}

/// GET /interviews/:interview_id/transcript
pub async fn interview_transcript(
    State(state): State<AppState>,
    Path(interview_id): Path<String>,
) -> impl IntoResponse {
    let Some(interview) = state.interviews.read().await.get(&interview_id).cloned() else {
        return not_found(&interview_id);
    };

    let messages = interview.log.snapshot().await;
    let interim_user_text = interview.session.interim_watch().borrow().clone();

    (
        StatusCode::OK,
        Json(TranscriptResponse {
            interview_id,
            messages,
            interim_user_text,
        }),
    )
        .into_response()
}

/// POST /interviews/:interview_id/message
/// Text turn path: one typed answer, one agent reply
pub async fn send_message(
    State(state): State<AppState>,
    Path(interview_id): Path<String>,
    Json(req): Json<SendMessageRequest>,
) -> impl IntoResponse {
    let Some(interview) = state.interviews.read().await.get(&interview_id).cloned() else {
        return not_found(&interview_id);
    };

    if req.text.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "message text is empty".to_string(),
            }),
        )
            .into_response();
    }

    match interview.text_turns.send_text(&req.text).await {
        Ok(reply) => (StatusCode::OK, Json(SendMessageResponse { reply })).into_response(),
        // The optimistic user message stays in the log; the candidate can
        // resubmit once the agent is reachable again.
        Err(e) => (error_status(&e), Json(ErrorResponse { error: e.to_string() })).into_response(),
    }
}

fn not_found(interview_id: &str) -> axum::response::Response {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: format!("Unknown interview: {interview_id}"),
        }),
    )
        .into_response()
}
