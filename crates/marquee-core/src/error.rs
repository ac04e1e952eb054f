//! Error types for Marquee Core

use thiserror::Error;

/// Result type alias for session operations
pub type Result<T> = std::result::Result<T, Error>;

/// Session error types
#[derive(Error, Debug)]
pub enum Error {
    // Gate errors
    #[error("Failed to detect onboarding: {0}")]
    Onboarding(String),

    // State machine errors
    #[error("Invalid session state transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    // Routing errors
    #[error("Invalid route: {0}")]
    InvalidRoute(String),

    // Source conversion errors
    #[error("Unsupported stream: {0}")]
    UnsupportedStream(String),

    #[error("No playable quality in file stream {stream_id}")]
    NoPlayableQuality { stream_id: String },

    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create an invalid transition error from any displayable states
    pub fn transition(from: impl std::fmt::Display, to: impl std::fmt::Display) -> Self {
        Error::InvalidStateTransition {
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    /// Returns true if this error must abort the whole view
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Onboarding(_))
    }

    /// Returns the error code for logs and error UI
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::Onboarding(_) => "ONBOARDING_CHECK",
            Error::InvalidStateTransition { .. } => "INVALID_STATE",
            Error::InvalidRoute(_) => "INVALID_ROUTE",
            Error::UnsupportedStream(_) => "UNSUPPORTED_STREAM",
            Error::NoPlayableQuality { .. } => "NO_PLAYABLE_QUALITY",
            Error::InvalidConfig(_) => "INVALID_CONFIG",
            Error::Json(_) => "JSON",
            Error::Io(_) => "IO",
        }
    }
}
