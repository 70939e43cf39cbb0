//! Error types for scanforge-core
//!
//! Covers request validation, session lookup, persistence, and
//! external-process failures raised by the scan pipeline.

use thiserror::Error;
use uuid::Uuid;

/// Core error type
#[derive(Debug, Error)]
pub enum Error {
    /// Request failed field validation
    #[error("validation error: {0}")]
    Validation(String),

    /// Requested scan tool is not recognized
    #[error("unsupported tool: {0}")]
    UnsupportedTool(String),

    /// Session not found
    #[error("session not found: {0}")]
    SessionNotFound(Uuid),

    /// Database error
    #[error("database error: {0}")]
    Database(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(String),

    /// External process failed to launch
    #[error("failed to spawn scan process: {0}")]
    Spawn(String),

    /// External process output stream faulted
    #[error("process I/O error: {0}")]
    ProcessIo(String),
}

impl Error {
    /// Create a validation error
    #[must_use]
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a spawn error
    #[must_use]
    pub fn spawn(msg: impl Into<String>) -> Self {
        Self::Spawn(msg.into())
    }

    /// Get error code for API responses
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::UnsupportedTool(_) => "unsupported_tool",
            Self::SessionNotFound(_) => "session_not_found",
            Self::Database(_) => "database_error",
            Self::Serialization(_) => "serialization_error",
            Self::Spawn(_) => "spawn_error",
            Self::ProcessIo(_) => "process_io_error",
        }
    }

    /// Whether the failure is the caller's fault rather than the server's
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::UnsupportedTool(_) | Self::SessionNotFound(_)
        )
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, Error>;
