//! HTTP API server for the interview UI
//!
//! This module provides a REST API for controlling interview sessions:
//! - GET  /positions - Job openings candidates can interview for
//! - POST /interviews/start - Open a voice interview session
//! - POST /interviews/:id/stop - Finish an interview, hand back the log
//! - GET  /interviews/:id/status - Query session state and stats
//! - GET  /interviews/:id/transcript - Get the conversation so far
//! - POST /interviews/:id/message - Text turn path (typed answer)
//! - GET  /health - Health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::{ActiveInterview, AppState};
