use std::path::PathBuf;
use thiserror::Error;

/// User-facing command rejections. Nothing is mutated when one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("no project selected")]
    NoProjectSelected,
    #[error("project not found: {0}")]
    ProjectNotFound(String),
    #[error("task not found: {0}")]
    TaskNotFound(String),
    #[error("project name cannot be empty")]
    EmptyProjectName,
    #[error("task name cannot be empty")]
    EmptyTaskName,
    #[error("invalid expected time '{0}' (use HH:MM:SS)")]
    InvalidExpectedTime(String),
    #[error("task '{0}' is already completed")]
    TaskCompleted(String),
    #[error("invalid user id '{0}' (letters, digits, '-' and '_' only)")]
    InvalidUserId(String),
}

/// A duration string that is not `HH:MM:SS`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot parse '{input}' as HH:MM:SS: {reason}")]
pub struct ParseFailure {
    pub input: String,
    pub reason: &'static str,
}

impl ParseFailure {
    pub fn new(input: &str, reason: &'static str) -> Self {
        Self {
            input: input.to_string(),
            reason,
        }
    }
}

/// Snapshot store failures. Saves report these; loads recover from them.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode snapshot: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("atomic write to {path} failed: {message}")]
    Write { path: PathBuf, message: String },
}
