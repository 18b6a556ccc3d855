use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Job openings
        .route("/positions", get(handlers::list_positions))
        // Interview control
        .route("/interviews/start", post(handlers::start_interview))
        .route(
            "/interviews/:interview_id/stop",
            post(handlers::stop_interview),
        )
        // Interview queries
        .route(
            "/interviews/:interview_id/status",
            get(handlers::interview_status),
        )
        .route(
            "/interviews/:interview_id/transcript",
            get(handlers::interview_transcript),
        )
        // Text turn path
        .route(
            "/interviews/:interview_id/message",
            post(handlers::send_message),
        )
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
