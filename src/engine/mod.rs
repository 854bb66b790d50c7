mod session;
mod transcript;

use session::Session;
use transcript::Origin;

use crate::error::RunError;
use crate::model::{OutputChunk, RunnerConfig, RunnerControl, SessionEvent, SessionOutput, Stream};
use bytes::Bytes;
use std::process::Stdio;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Bytes requested per pipe read.
const PIPE_READ_BUFFER: usize = 8192;

/// Runs one shell command with piped stdio and records a transcript of it.
pub struct CommandRunner {
    cfg: RunnerConfig,
}

impl CommandRunner {
    pub fn new(cfg: RunnerConfig) -> Self {
        Self { cfg }
    }

    /// Run `command` to completion.
    ///
    /// Output chunks are forwarded on `event_tx` as they arrive. Lines received on
    /// `input_rx` are echoed into the transcript and written to the child's stdin.
    /// A [`RunnerControl::Interrupt`] on `control_rx` signals the child and ends the
    /// session with [`RunError::Interrupted`].
    ///
    /// Output from the child's two pipes is recorded in the order this loop
    /// observes it. There is no global ordering between stdout and stderr.
    pub async fn run(
        self,
        command: &str,
        event_tx: mpsc::UnboundedSender<SessionEvent>,
        mut input_rx: mpsc::Receiver<String>,
        mut control_rx: mpsc::UnboundedReceiver<RunnerControl>,
    ) -> Result<SessionOutput, RunError> {
        if command.trim().is_empty() {
            return Err(RunError::EmptyCommand);
        }

        let mut session = Session::new(command);
        session.start();

        let spawned = Command::new(&self.cfg.shell)
            .arg(&self.cfg.shell_arg)
            .arg(command)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn();
        let mut child = match spawned {
            Ok(child) => child,
            Err(e) => {
                warn!(command, shell = %self.cfg.shell, error = %e, "failed to spawn command");
                return Err(spawn_failure(&mut session, &e.to_string()));
            }
        };

        let pid = child.id();
        info!(command, ?pid, "command started");
        let _ = event_tx.send(SessionEvent::Started {
            command: command.to_string(),
        });

        let mut stdin = child.stdin.take();
        let (chunk_tx, mut chunk_rx) = mpsc::unbounded_channel::<OutputChunk>();
        if let Some(out) = child.stdout.take() {
            spawn_pipe_reader(out, Stream::Stdout, chunk_tx.clone());
        }
        if let Some(err) = child.stderr.take() {
            spawn_pipe_reader(err, Stream::Stderr, chunk_tx.clone());
        }
        // Readers hold the only senders now, so the channel closes once both pipes hit EOF.
        drop(chunk_tx);

        let mut pipes_open = true;
        let mut input_open = true;
        let mut control_open = true;
        let mut exit: Option<Option<i32>> = None;

        let res = loop {
            tokio::select! {
                chunk = chunk_rx.recv(), if pipes_open => match chunk {
                    Some(OutputChunk { stream, data }) => {
                        if session.record_output(stream, data.clone()) {
                            let ev = match stream {
                                Stream::Stdout => SessionEvent::Stdout(data),
                                Stream::Stderr => SessionEvent::Stderr(data),
                            };
                            let _ = event_tx.send(ev);
                        }
                    }
                    None => pipes_open = false,
                },
                status = child.wait(), if exit.is_none() => {
                    let code = match status {
                        Ok(status) => status.code(),
                        Err(e) => {
                            warn!(error = %e, "failed to wait on child");
                            None
                        }
                    };
                    debug!(?code, "child exited");
                    exit = Some(code);
                    // Nothing reads stdin any more; later lines are skipped quietly.
                    stdin = None;
                },
                line = input_rx.recv(), if input_open => match line {
                    Some(line) => {
                        if session.record_input(&line) {
                            let _ = event_tx.send(SessionEvent::InputEchoed { line: line.clone() });
                        }
                        if let Some(pipe) = stdin.as_mut() {
                            if let Err(e) = write_line(pipe, &line).await {
                                let message = e.to_string();
                                warn!(error = %message, "write to child stdin failed");
                                session.record_stdin_failure(&message);
                                let _ = event_tx.send(SessionEvent::StdinWriteFailed { message });
                                stdin = None;
                            }
                        }
                    }
                    None => {
                        debug!("operator input closed");
                        input_open = false;
                        // Let the child see EOF.
                        stdin = None;
                    }
                },
                ctrl = control_rx.recv(), if control_open => match ctrl {
                    Some(RunnerControl::Interrupt) => {
                        info!(command, "interrupt requested");
                        if exit.is_none() {
                            interrupt_child(&mut child, pid);
                        }
                        let _ = event_tx.send(SessionEvent::Interrupted);
                        if let Some(err) = session.finish_interrupted() {
                            break Err(err);
                        }
                    }
                    None => control_open = false,
                },
                // The wait branch stays live until exit is recorded, and the check
                // below ends the loop once exit and pipe EOF have both been seen.
                else => unreachable!("runner loop ran with every branch disabled"),
            }

            if !pipes_open {
                if let Some(code) = exit {
                    let _ = event_tx.send(SessionEvent::Exited { code });
                    if let Some(res) = session.finish_exit(code) {
                        match &res {
                            Ok(_) => info!(command, bytes = session.transcript().len(), "command completed"),
                            Err(e) => warn!(command, error = %e, "command failed"),
                        }
                        break res;
                    }
                }
            }
        };

        debug!(
            state = ?session.state(),
            exit_code = ?session.exit_code(),
            interrupted = session.interrupted(),
            input_lines = session
                .transcript()
                .entries()
                .iter()
                .filter(|e| e.origin == Origin::Input)
                .count(),
            empty = session.transcript().is_empty(),
            "session settled"
        );
        res
    }
}

fn spawn_failure(session: &mut Session, reason: &str) -> RunError {
    session
        .finish_spawn_failure(reason)
        .unwrap_or_else(|| RunError::SpawnFailed {
            command: session.command().to_string(),
            reason: reason.to_string(),
            transcript: session.transcript().render(),
        })
}

/// Read a child pipe until EOF, forwarding each chunk as-is.
fn spawn_pipe_reader<R>(
    mut pipe: R,
    stream: Stream,
    tx: mpsc::UnboundedSender<OutputChunk>,
) -> tokio::task::JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = vec![0u8; PIPE_READ_BUFFER];
        loop {
            match pipe.read(&mut buf).await {
                Ok(0) => break,
                Ok(n) => {
                    let chunk = OutputChunk {
                        stream,
                        data: Bytes::copy_from_slice(&buf[..n]),
                    };
                    if tx.send(chunk).is_err() {
                        // Session already settled.
                        break;
                    }
                }
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    warn!(?stream, error = %e, "pipe read failed");
                    break;
                }
            }
        }
    })
}

async fn write_line(pipe: &mut ChildStdin, line: &str) -> std::io::Result<()> {
    pipe.write_all(line.as_bytes()).await?;
    pipe.write_all(b"\n").await?;
    pipe.flush().await
}

/// Deliver an interrupt to the child: SIGINT where available, a kill otherwise.
fn interrupt_child(child: &mut Child, pid: Option<u32>) {
    #[cfg(unix)]
    {
        if let Some(pid) = pid {
            // SAFETY: kill(2) with a pid we spawned and have not reaped yet.
            let rc = unsafe { libc::kill(pid as libc::pid_t, libc::SIGINT) };
            if rc == 0 {
                return;
            }
            warn!(pid, "SIGINT delivery failed, killing instead");
        }
    }
    #[cfg(not(unix))]
    let _ = pid;

    if let Err(e) = child.start_kill() {
        warn!(error = %e, "failed to kill child");
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::time::Duration;
    use tokio::time::timeout;

    struct Harness {
        event_rx: mpsc::UnboundedReceiver<SessionEvent>,
        input_tx: mpsc::Sender<String>,
        ctrl_tx: mpsc::UnboundedSender<RunnerControl>,
        handle: tokio::task::JoinHandle<Result<SessionOutput, RunError>>,
    }

    fn start(cmd: &str, cfg: RunnerConfig) -> Harness {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (input_tx, input_rx) = mpsc::channel(16);
        let (ctrl_tx, ctrl_rx) = mpsc::unbounded_channel();
        let cmd = cmd.to_string();
        let handle = tokio::spawn(async move {
            CommandRunner::new(cfg)
                .run(&cmd, event_tx, input_rx, ctrl_rx)
                .await
        });
        Harness {
            event_rx,
            input_tx,
            ctrl_tx,
            handle,
        }
    }

    async fn finish(h: Harness) -> Result<SessionOutput, RunError> {
        timeout(Duration::from_secs(10), h.handle)
            .await
            .expect("session hung")
            .expect("runner task panicked")
    }

    /// Wait until the child has written `needle` to stdout.
    async fn wait_for_stdout(h: &mut Harness, needle: &str) {
        let mut seen = String::new();
        timeout(Duration::from_secs(10), async {
            while let Some(ev) = h.event_rx.recv().await {
                if let SessionEvent::Stdout(data) = ev {
                    seen.push_str(&String::from_utf8_lossy(&data));
                    if seen.contains(needle) {
                        return;
                    }
                }
            }
            panic!("event stream ended before {needle:?}");
        })
        .await
        .expect("timed out waiting for output");
    }

    #[tokio::test]
    async fn clean_exit_returns_stdout_and_command() {
        let cmd = "printf 'a\\nb\\n'";
        let h = start(cmd, RunnerConfig::default());
        let out = finish(h).await.unwrap();
        assert_eq!(out.transcript, "a\nb\n");
        assert_eq!(out.command, cmd);
        assert_eq!(out.exit_code, 0);
    }

    #[tokio::test]
    async fn stderr_is_captured_alongside_stdout() {
        let h = start("echo out; echo err 1>&2", RunnerConfig::default());
        let out = finish(h).await.unwrap();
        assert!(out.transcript.contains("out\n"));
        assert!(out.transcript.contains("err\n"));
        assert_eq!(out.transcript.len(), "out\nerr\n".len());
    }

    #[tokio::test]
    async fn output_events_mirror_the_transcript() {
        let Harness {
            mut event_rx,
            handle,
            ..
        } = start("echo mirrored", RunnerConfig::default());
        let out = timeout(Duration::from_secs(10), handle)
            .await
            .expect("session hung")
            .expect("runner task panicked")
            .unwrap();

        let mut stdout = Vec::new();
        let mut started = false;
        let mut exited = None;
        while let Ok(ev) = event_rx.try_recv() {
            match ev {
                SessionEvent::Started { command } => {
                    assert_eq!(command, "echo mirrored");
                    started = true;
                }
                SessionEvent::Stdout(data) => stdout.extend_from_slice(&data),
                SessionEvent::Exited { code } => exited = Some(code),
                _ => {}
            }
        }
        assert!(started);
        assert_eq!(exited, Some(Some(0)));
        assert_eq!(String::from_utf8(stdout).unwrap(), out.transcript);
    }

    #[tokio::test]
    async fn input_line_is_echoed_then_forwarded() {
        let h = start("read line; echo \"got $line\"", RunnerConfig::default());
        h.input_tx.send("hello".into()).await.unwrap();
        let out = finish(h).await.unwrap();
        assert_eq!(out.transcript, "hello\ngot hello\n");
    }

    #[tokio::test]
    async fn nonzero_exit_is_command_failed_with_output() {
        let h = start("echo partial; exit 2", RunnerConfig::default());
        let err = finish(h).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CommandFailed);
        match &err {
            RunError::CommandFailed { code, .. } => assert_eq!(*code, Some(2)),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(err.transcript(), Some("partial\n"));
    }

    #[tokio::test]
    async fn unknown_command_is_spawn_failed() {
        let h = start("definitely-not-a-real-command-4d1f", RunnerConfig::default());
        let err = finish(h).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SpawnFailed);
        assert!(err
            .transcript()
            .unwrap()
            .contains("Failed to start command \"definitely-not-a-real-command-4d1f\""));
    }

    #[tokio::test]
    async fn missing_shell_is_spawn_failed() {
        let cfg = RunnerConfig {
            shell: "/nonexistent/shell-4d1f".into(),
            shell_arg: "-c".into(),
        };
        let h = start("echo hi", cfg);
        let err = finish(h).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SpawnFailed);
        assert!(err.transcript().unwrap().starts_with("Failed to start command \"echo hi\""));
    }

    #[tokio::test]
    async fn empty_command_is_rejected_before_spawn() {
        let h = start("   ", RunnerConfig::default());
        let err = finish(h).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EmptyCommand);
    }

    #[tokio::test]
    async fn interrupt_ends_session_with_marker() {
        let mut h = start("echo ready; sleep 5", RunnerConfig::default());
        wait_for_stdout(&mut h, "ready").await;
        h.ctrl_tx.send(RunnerControl::Interrupt).unwrap();

        let started = std::time::Instant::now();
        let input_tx = h.input_tx.clone();
        let err = finish(h).await.unwrap_err();
        assert!(started.elapsed() < Duration::from_secs(4));
        assert_eq!(err.kind(), ErrorKind::Interrupted);
        let transcript = err.transcript().unwrap();
        assert!(transcript.starts_with("ready\n"));
        assert!(transcript.ends_with(session::INTERRUPT_MARKER));
        // The input loop was torn down with the session.
        assert!(input_tx.send("after".into()).await.is_err());
    }

    #[tokio::test]
    async fn interrupt_reaches_the_child_as_sigint() {
        let dir = tempfile::tempdir().unwrap();
        let sentinel = dir.path().join("got-sigint");
        let cmd = format!(
            "trap \"touch '{}'; exit 0\" INT; echo ready; while :; do sleep 0.05; done",
            sentinel.display()
        );
        let mut h = start(&cmd, RunnerConfig::default());
        wait_for_stdout(&mut h, "ready").await;
        h.ctrl_tx.send(RunnerControl::Interrupt).unwrap();

        let err = finish(h).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Interrupted);

        // The session settles without waiting for the child; its trap runs shortly after.
        timeout(Duration::from_secs(5), async {
            while !sentinel.exists() {
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
        })
        .await
        .expect("child never ran its SIGINT trap");
    }

    #[tokio::test]
    async fn exit_after_pipes_close_reports_the_real_code() {
        let h = start("echo gone; exec >&- 2>&-; sleep 0.2; exit 4", RunnerConfig::default());
        let err = finish(h).await.unwrap_err();
        match &err {
            RunError::CommandFailed { code, transcript, .. } => {
                assert_eq!(*code, Some(4));
                assert!(transcript.starts_with("gone\n"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn background_writer_keeps_session_open_after_exit() {
        let h = start("(sleep 0.2; echo late) & exit 0", RunnerConfig::default());
        let out = finish(h).await.unwrap();
        assert_eq!(out.transcript, "late\n");
        assert_eq!(out.exit_code, 0);
    }

    #[tokio::test]
    async fn write_after_stdin_closed_does_not_end_session() {
        let mut h = start(
            "exec 0<&-; echo closed; sleep 0.3; echo done",
            RunnerConfig::default(),
        );
        wait_for_stdout(&mut h, "closed").await;
        h.input_tx.send("late".into()).await.unwrap();
        h.input_tx.send("later".into()).await.unwrap();

        let out = finish(h).await.unwrap();
        assert!(out.transcript.contains("late\n"));
        assert!(out.transcript.contains("Error writing to child stdin"));
        assert_eq!(out.transcript.matches("Error writing to child stdin").count(), 1);
        assert!(out.transcript.ends_with("done\n"));
    }
}
