//! Error types for the interview session service.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    /// The microphone (or another capture device) could not be acquired.
    /// Surfaced to the user as-is; there is no automatic retry.
    #[error("audio device unavailable: {message}")]
    DeviceUnavailable { message: String },

    /// Opening, sending on, or receiving from the streaming transport failed.
    /// Terminal for the session; a new session must be opened manually.
    #[error("agent connection failed: {message}")]
    Connection { message: String },

    /// A non-streaming completion request failed. The optimistically
    /// appended user message stays in the log.
    #[error("completion request failed: {message}")]
    Request { message: String },

    /// Operation attempted after the pipeline was torn down.
    #[error("pipeline is closed")]
    PipelineClosed,
}

impl SessionError {
    pub fn device(message: impl Into<String>) -> Self {
        Self::DeviceUnavailable {
            message: message.into(),
        }
    }

    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    pub fn request(message: impl Into<String>) -> Self {
        Self::Request {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SessionError>;
