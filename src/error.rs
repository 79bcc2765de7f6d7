//! Error types for the gate, its storage backends, and the chat orchestrator.
use thiserror::Error;

/// Failure reported by a [`LimitStorage`](crate::rate_limit::LimitStorage) backend.
///
/// The rate limit store never surfaces these to its callers; they are logged and the
/// store degrades to "no record".
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend could not be read from or written to.
    #[error("storage i/o failed: {0}")]
    Io(#[from] std::io::Error),
    /// Persisted state exists but is not valid JSON for the snapshot layout.
    #[error("persisted state is malformed: {0}")]
    Serde(#[from] serde_json::Error),
    /// Persisted state was written with a layout this build cannot read.
    #[error("unsupported snapshot layout version {0}")]
    UnsupportedVersion(u32),
    /// The backend is disabled or otherwise inaccessible.
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Errors returned by
/// [`ChatOrchestrator::send_message`](crate::chat::ChatOrchestrator::send_message).
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("message is empty")]
    EmptyMessage,
    #[error("a message is already being processed")]
    Busy,
    #[error("sign in to use the chat")]
    NotSignedIn,
    /// The subject used up its allowance for the current window.
    #[error("message limit reached for the current window")]
    LimitReached,
    #[error("no model selected")]
    NoModel,
    /// The completion endpoint answered with an error.
    #[error("AI Service Error: {message}{}", status_suffix(.status))]
    Completion { message: String, status: Option<u16> },
    /// The completion endpoint could not be reached.
    #[error("transport error: {0}")]
    Transport(String),
}

const LIMIT_REACHED_TEXT: &str =
    "You have reached your message limit. Please upgrade to premium for unlimited access.";

const AUTH_FAILED_TEXT: &str =
    "Authentication failed. Please check if your API key is configured correctly.";

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (Status: {s})")).unwrap_or_default()
}

impl ChatError {
    /// Text suitable for showing to the person chatting.
    pub fn user_message(&self) -> String {
        match self {
            Self::LimitReached => LIMIT_REACHED_TEXT.into(),
            Self::Completion { status: Some(401), .. } => AUTH_FAILED_TEXT.into(),
            other => other.to_string(),
        }
    }

    /// Check if this error is a rate-limit refusal.
    pub fn is_limit_reached(&self) -> bool {
        matches!(self, Self::LimitReached)
    }
}

/// Invalid or incomplete [`GateConfig`](crate::config::GateConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
    #[error("missing required setting {0}")]
    Missing(&'static str),
    #[error("config is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
}
