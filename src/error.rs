//! Error types for the wordplay speech engine

use thiserror::Error;

/// Result type alias for wordplay operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the speech engine
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error (missing credential, bad config value)
    #[error("configuration error: {0}")]
    Config(String),

    /// Text-to-speech provider rejected or failed the request
    #[error("provider error: {0}")]
    Provider(String),

    /// Provider answered successfully but without usable audio
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// Audio output context could not be created, resumed, or started
    #[error("playback error: {0}")]
    Playback(String),

    /// Synthesis did not settle within the configured bound
    #[error("timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// Host speech fallback could not be started
    #[error("fallback speech error: {0}")]
    Fallback(String),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}
