//! Error types for the outer collaborators.
//!
//! The simulation itself never fails; these cover score storage and the
//! commentary service, both of which are absorbed before they reach a session.

use thiserror::Error;

/// Failures while reading or writing the stored best score.
#[derive(Error, Debug)]
pub enum StoreError {
    /// File system errors
    #[error("File system error: {0}")]
    FileSystem(#[from] std::io::Error),

    /// JSON parsing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Envelope written by a newer build
    #[error("Unsupported envelope version {found} (max {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },

    /// Backend not reachable (e.g. LocalStorage disabled)
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Creates a new unavailable-backend error.
    #[must_use]
    pub fn unavailable<S: Into<String>>(msg: S) -> Self {
        Self::Unavailable(msg.into())
    }
}

/// Failures while fetching game-over commentary.
#[derive(Error, Debug)]
pub enum CommentaryError {
    /// Transport-level failure
    #[error("Network error: {0}")]
    Network(String),

    /// Service answered with a non-success status
    #[error("Service returned status {0}")]
    Status(u16),

    /// Service answered but produced no text
    #[error("Empty response")]
    Empty,

    /// No answer within the configured budget
    #[error("Timed out after {0} ms")]
    Timeout(u64),

    /// No credentials configured
    #[error("Missing API key (set {0})")]
    MissingKey(String),
}

impl CommentaryError {
    /// Creates a new network error.
    #[must_use]
    pub fn network<S: Into<String>>(msg: S) -> Self {
        Self::Network(msg.into())
    }
}
