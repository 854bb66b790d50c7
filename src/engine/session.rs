//! Session state for one command run.
//!
//! A session resolves exactly once. Every recording method checks the state
//! first, so events that arrive after a terminal state are dropped.

use bytes::Bytes;

use super::transcript::Transcript;
use crate::error::RunError;
use crate::model::{SessionOutput, Stream};

pub(crate) const INTERRUPT_MARKER: &str = "\n--- Command Interrupted by User (Ctrl+C) ---\n";

/// Shell exit statuses meaning the command itself could not be started.
const SHELL_NOT_FOUND: i32 = 127;
const SHELL_NOT_EXECUTABLE: i32 = 126;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Spawn,
    Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Running,
    Completed,
    Failed(FailureKind),
    Interrupted,
}

impl SessionState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, SessionState::Idle | SessionState::Running)
    }
}

#[derive(Debug)]
pub struct Session {
    command: String,
    transcript: Transcript,
    exit_code: Option<i32>,
    interrupted: bool,
    state: SessionState,
}

impl Session {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            transcript: Transcript::new(),
            exit_code: None,
            interrupted: false,
            state: SessionState::Idle,
        }
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn exit_code(&self) -> Option<i32> {
        self.exit_code
    }

    pub fn interrupted(&self) -> bool {
        self.interrupted
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn start(&mut self) -> bool {
        if self.state != SessionState::Idle {
            return false;
        }
        self.state = SessionState::Running;
        true
    }

    fn accepting(&self) -> bool {
        !self.state.is_terminal()
    }

    pub fn record_output(&mut self, stream: Stream, data: Bytes) -> bool {
        if !self.accepting() {
            return false;
        }
        self.transcript.push_output(stream, data);
        true
    }

    pub fn record_input(&mut self, line: &str) -> bool {
        if !self.accepting() {
            return false;
        }
        self.transcript.push_input_line(line);
        true
    }

    pub fn record_stdin_failure(&mut self, reason: &str) -> bool {
        if !self.accepting() {
            return false;
        }
        self.transcript
            .push_marker(format!("\nError writing to child stdin: {reason}\n"));
        true
    }

    /// Move to a terminal state. Returns `false` if one was already reached.
    fn settle(&mut self, next: SessionState) -> bool {
        if self.state.is_terminal() {
            return false;
        }
        self.state = next;
        true
    }

    /// Resolve the session from the child's exit status.
    ///
    /// Returns `None` if the session already settled.
    pub fn finish_exit(&mut self, code: Option<i32>) -> Option<Result<SessionOutput, RunError>> {
        match code {
            Some(0) => {
                if !self.settle(SessionState::Completed) {
                    return None;
                }
                self.exit_code = Some(0);
                Some(Ok(SessionOutput {
                    transcript: self.transcript.render(),
                    command: self.command.clone(),
                    exit_code: 0,
                }))
            }
            Some(c @ (SHELL_NOT_FOUND | SHELL_NOT_EXECUTABLE)) => {
                let reason = if c == SHELL_NOT_FOUND {
                    "command not found (exit status 127)"
                } else {
                    "command not executable (exit status 126)"
                };
                let out = self.finish_spawn_failure(reason)?;
                self.exit_code = Some(c);
                Some(Err(out))
            }
            other => {
                if !self.settle(SessionState::Failed(FailureKind::Command)) {
                    return None;
                }
                self.exit_code = other;
                Some(Err(RunError::CommandFailed {
                    command: self.command.clone(),
                    code: other,
                    transcript: self.transcript.render(),
                }))
            }
        }
    }

    pub fn finish_spawn_failure(&mut self, reason: &str) -> Option<RunError> {
        if !self.settle(SessionState::Failed(FailureKind::Spawn)) {
            return None;
        }
        self.transcript.push_marker(format!(
            "Failed to start command \"{}\": {}\n",
            self.command, reason
        ));
        Some(RunError::SpawnFailed {
            command: self.command.clone(),
            reason: reason.to_string(),
            transcript: self.transcript.render(),
        })
    }

    pub fn finish_interrupted(&mut self) -> Option<RunError> {
        if !self.settle(SessionState::Interrupted) {
            return None;
        }
        self.interrupted = true;
        self.transcript.push_marker(INTERRUPT_MARKER);
        Some(RunError::Interrupted {
            command: self.command.clone(),
            transcript: self.transcript.render(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn running(cmd: &str) -> Session {
        let mut s = Session::new(cmd);
        assert!(s.start());
        s
    }

    #[test]
    fn clean_exit_resolves_with_command() {
        let mut s = running("echo hi");
        s.record_output(Stream::Stdout, Bytes::from_static(b"hi\n"));
        let out = s.finish_exit(Some(0)).unwrap().unwrap();
        assert_eq!(out.transcript, "hi\n");
        assert_eq!(out.command, "echo hi");
        assert_eq!(s.state(), SessionState::Completed);
        assert_eq!(s.exit_code(), Some(0));
    }

    #[test]
    fn settles_only_once() {
        let mut s = running("true");
        assert!(s.finish_exit(Some(0)).is_some());
        assert!(s.finish_exit(Some(1)).is_none());
        assert!(s.finish_interrupted().is_none());
        assert!(s.finish_spawn_failure("late").is_none());
        assert_eq!(s.state(), SessionState::Completed);
    }

    #[test]
    fn late_events_are_ignored() {
        let mut s = running("true");
        s.finish_exit(Some(0));
        assert!(!s.record_output(Stream::Stdout, Bytes::from_static(b"late")));
        assert!(!s.record_input("late"));
        assert!(!s.record_stdin_failure("late"));
        assert!(s.transcript().is_empty());
    }

    #[test]
    fn nonzero_exit_keeps_partial_transcript() {
        let mut s = running("exit 2");
        s.record_output(Stream::Stderr, Bytes::from_static(b"oops\n"));
        let err = s.finish_exit(Some(2)).unwrap().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CommandFailed);
        assert_eq!(err.transcript(), Some("oops\n"));
        assert_eq!(s.state(), SessionState::Failed(FailureKind::Command));
    }

    #[test]
    fn shell_not_found_is_a_spawn_failure() {
        let mut s = running("nope");
        let err = s.finish_exit(Some(127)).unwrap().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SpawnFailed);
        assert!(err
            .transcript()
            .unwrap()
            .ends_with("Failed to start command \"nope\": command not found (exit status 127)\n"));
        assert_eq!(s.exit_code(), Some(127));
    }

    #[test]
    fn interrupt_appends_marker() {
        let mut s = running("sleep 10");
        s.record_input("abc");
        let err = s.finish_interrupted().unwrap();
        assert!(err.transcript().unwrap().ends_with(INTERRUPT_MARKER));
        assert!(s.interrupted());
        assert_eq!(s.state(), SessionState::Interrupted);
    }

    #[test]
    fn start_only_from_idle() {
        let mut s = running("true");
        assert!(!s.start());
    }
}
