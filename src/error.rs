//! Error types for command sessions and capture sources.

use std::path::PathBuf;

/// Coarse classification of a [`RunError`], for callers that only need to branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    EmptyCommand,
    SpawnFailed,
    CommandFailed,
    Interrupted,
}

/// Fatal outcomes of a command session. Every variant that can carry output
/// keeps the transcript captured up to the failure.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("command cannot be empty")]
    EmptyCommand,
    #[error("failed to start command \"{command}\": {reason}")]
    SpawnFailed {
        command: String,
        reason: String,
        transcript: String,
    },
    #[error("command \"{command}\" {}", describe_exit(.code))]
    CommandFailed {
        command: String,
        code: Option<i32>,
        transcript: String,
    },
    #[error("command \"{command}\" interrupted by user (Ctrl+C)")]
    Interrupted { command: String, transcript: String },
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("exited with code {c}"),
        None => "was terminated by a signal".to_string(),
    }
}

impl RunError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RunError::EmptyCommand => ErrorKind::EmptyCommand,
            RunError::SpawnFailed { .. } => ErrorKind::SpawnFailed,
            RunError::CommandFailed { .. } => ErrorKind::CommandFailed,
            RunError::Interrupted { .. } => ErrorKind::Interrupted,
        }
    }

    /// Output captured before the failure, if the session got far enough to have any.
    pub fn transcript(&self) -> Option<&str> {
        match self {
            RunError::EmptyCommand => None,
            RunError::SpawnFailed { transcript, .. }
            | RunError::CommandFailed { transcript, .. }
            | RunError::Interrupted { transcript, .. } => Some(transcript),
        }
    }
}

/// Failures while turning a user-supplied path into file content.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("file path was empty after cleaning")]
    EmptyPath,
    #[error("file not found at {}", .0.display())]
    NotFound(PathBuf),
    #[error("permission denied reading {}", .0.display())]
    PermissionDenied(PathBuf),
    #[error("error reading {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
