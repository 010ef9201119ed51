//! Error types for pollhub.

use thiserror::Error;

/// Application result type.
pub type AppResult<T> = Result<T, AppError>;

/// Application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // === Client Errors ===
    /// No poll with this id.
    #[error("Poll not found: {0}")]
    PollNotFound(String),

    /// No comment with this id.
    #[error("Comment not found: {0}")]
    CommentNotFound(String),

    /// Vote selection does not fit the poll.
    #[error("Invalid selection: {0}")]
    InvalidSelection(String),

    /// Poll is past its close date.
    #[error("Poll is closed: {0}")]
    PollClosed(String),

    /// Request is inconsistent with stored data.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Input failed validation.
    #[error("Validation error: {0}")]
    Validation(String),

    // === Transient Errors ===
    /// Vote lost the write race on every attempt.
    #[error("Concurrent update conflict on poll {poll_id} after {attempts} attempts")]
    ConcurrentUpdateConflict {
        /// Poll whose tally could not be written.
        poll_id: String,
        /// Number of read-compute-write attempts made.
        attempts: u32,
    },

    // === Server Errors ===
    /// Storage failure.
    #[error("Database error: {0}")]
    Database(String),

    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Corrupt stored data or another internal failure.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::PollNotFound(_) => "POLL_NOT_FOUND",
            Self::CommentNotFound(_) => "COMMENT_NOT_FOUND",
            Self::InvalidSelection(_) => "INVALID_SELECTION",
            Self::PollClosed(_) => "POLL_CLOSED",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::ConcurrentUpdateConflict { .. } => "CONCURRENT_UPDATE_CONFLICT",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns whether the caller can fix this error by changing the request.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::PollNotFound(_)
                | Self::CommentNotFound(_)
                | Self::InvalidSelection(_)
                | Self::PollClosed(_)
                | Self::BadRequest(_)
                | Self::Validation(_)
        )
    }

    /// Returns whether resubmitting the same request may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::ConcurrentUpdateConflict { .. })
    }

    /// Returns whether this error should be logged at error level.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Database(_) | Self::Config(_) | Self::Internal(_)
        )
    }
}

// === From implementations ===

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}
