use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// How commands are handed to the shell.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    pub shell: String,
    pub shell_arg: String,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        if cfg!(windows) {
            Self {
                shell: "cmd".into(),
                shell_arg: "/C".into(),
            }
        } else {
            Self {
                shell: "sh".into(),
                shell_arg: "-c".into(),
            }
        }
    }
}

/// Which child pipe a chunk of output came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stream {
    Stdout,
    Stderr,
}

/// A raw chunk read from one of the child's output pipes.
#[derive(Debug, Clone)]
pub struct OutputChunk {
    pub stream: Stream,
    pub data: Bytes,
}

/// Events emitted while a command session is running, consumed by the CLI layer.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    Started {
        command: String,
    },
    Stdout(Bytes),
    Stderr(Bytes),
    InputEchoed {
        line: String,
    },
    StdinWriteFailed {
        message: String,
    },
    Interrupted,
    Exited {
        code: Option<i32>,
    },
}

/// Control messages accepted by a running session.
#[derive(Debug, Clone)]
pub enum RunnerControl {
    /// Forward an interrupt to the child and abandon the session
    Interrupt,
}

/// Successful outcome of a command session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionOutput {
    pub transcript: String,
    pub command: String,
    pub exit_code: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    File,
    Command,
    Custom,
}

impl SourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SourceKind::File => "file",
            SourceKind::Command => "command",
            SourceKind::Custom => "custom",
        }
    }
}

/// Text plus the metadata the renderer page needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Capture {
    pub text: String,
    pub extension: String,
    pub file_name: String,
    pub source: SourceKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    #[serde(default)]
    pub captured_at: String,
}

/// RFC 3339 timestamp for "now", local time when the offset is known.
pub fn now_rfc3339() -> String {
    let now = time::OffsetDateTime::now_local().unwrap_or_else(|_| time::OffsetDateTime::now_utc());
    now.format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| "now".into())
}
