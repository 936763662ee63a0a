//! Error taxonomy for task operations.
//!
//! Every failure the engine can signal is a [`TaskError`] variant, and every
//! variant reports exactly one [`ErrorKind`]. Callers branch on the kind to
//! decide whether to retry with fresh data (conflict), fix their input
//! (invalid argument) or escalate (not authorized, not found).
//!
//! ## Usage
//!
//! ```rust,no_run
//! use basket::libs::error::{ErrorKind, TaskError};
//!
//! fn retry_worthy(err: &TaskError) -> bool {
//!     err.kind() == ErrorKind::ConcurrencyConflict
//! }
//! ```

use std::fmt;
use thiserror::Error;

/// Coarse classification of a [`TaskError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    NotAuthorized,
    InvalidArgument,
    ConcurrencyConflict,
    AlreadyExists,
    InvalidState,
    PersistenceFailure,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::NotFound => "not found",
            ErrorKind::NotAuthorized => "not authorized",
            ErrorKind::InvalidArgument => "invalid argument",
            ErrorKind::ConcurrencyConflict => "concurrency conflict",
            ErrorKind::AlreadyExists => "already exists",
            ErrorKind::InvalidState => "invalid state",
            ErrorKind::PersistenceFailure => "persistence failure",
        };
        write!(f, "{}", name)
    }
}

/// Failure signaled by a task operation.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("task '{0}' was not found")]
    TaskNotFound(String),

    #[error("workbasket '{0}' was not found")]
    WorkbasketNotFound(String),

    #[error("classification '{key}' was not found in domain '{domain}'")]
    ClassificationNotFound { key: String, domain: String },

    #[error("user '{user}' is not authorized: {reason}")]
    NotAuthorized { user: String, reason: String },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("task '{task_id}' has been modified by another user")]
    ConcurrencyConflict { task_id: String },

    #[error("task '{0}' already exists")]
    AlreadyExists(String),

    #[error("task '{task_id}' is in an invalid state: {reason}")]
    InvalidState { task_id: String, reason: String },

    #[error("database failure: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("failed to encode task attributes: {0}")]
    Encoding(#[from] serde_json::Error),
}

impl TaskError {
    /// Returns the kind a caller should branch on.
    pub fn kind(&self) -> ErrorKind {
        match self {
            TaskError::TaskNotFound(_) | TaskError::WorkbasketNotFound(_) | TaskError::ClassificationNotFound { .. } => ErrorKind::NotFound,
            TaskError::NotAuthorized { .. } => ErrorKind::NotAuthorized,
            TaskError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            TaskError::ConcurrencyConflict { .. } => ErrorKind::ConcurrencyConflict,
            TaskError::AlreadyExists(_) => ErrorKind::AlreadyExists,
            TaskError::InvalidState { .. } => ErrorKind::InvalidState,
            TaskError::Database(_) | TaskError::Encoding(_) => ErrorKind::PersistenceFailure,
        }
    }

    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        TaskError::InvalidArgument(reason.into())
    }

    pub(crate) fn invalid_state(task_id: &str, reason: impl Into<String>) -> Self {
        TaskError::InvalidState {
            task_id: task_id.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result alias used throughout the task core.
pub type TaskResult<T> = Result<T, TaskError>;
