//! Command session controller.
//!
//! Wires a [`CommandRunner`] to the real terminal: a stdin line pump, Ctrl-C
//! forwarding, and mirroring of child output through the output writer.

use crate::engine::CommandRunner;
use crate::error::RunError;
use crate::model::{RunnerConfig, RunnerControl, SessionEvent, SessionOutput};
use crate::output::{Output, OutputLine};
use std::io::BufRead;
use std::thread;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Lines buffered between the stdin thread and the session loop.
const INPUT_BUFFER: usize = 64;

const SEPARATOR: &str = "--------------------------------------";

/// Read the process's stdin line by line on a dedicated thread.
///
/// The thread stops at EOF, on a read error, or once the receiver is dropped
/// and the next line fails to send.
pub(crate) fn spawn_stdin_lines() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(INPUT_BUFFER);
    thread::spawn(move || {
        let stdin = std::io::stdin();
        forward_lines(stdin.lock(), &tx);
        debug!("stdin reader finished");
    });
    rx
}

/// Send each line of `reader` without its `\n` or `\r\n` terminator.
///
/// Bytes that are not valid UTF-8 become U+FFFD; the line is still sent and
/// reading continues.
fn forward_lines<R: BufRead>(mut reader: R, tx: &mpsc::Sender<String>) {
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                debug!(error = %e, "stdin read failed");
                break;
            }
        }
        let line = buf.strip_suffix(b"\n").unwrap_or(&buf[..]);
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        if tx.blocking_send(String::from_utf8_lossy(line).into_owned()).is_err() {
            break;
        }
    }
}

fn forward_event(sink: &mpsc::UnboundedSender<OutputLine>, ev: SessionEvent) {
    match ev {
        SessionEvent::Started { command } => debug!(%command, "session started"),
        SessionEvent::Stdout(data) => {
            let _ = sink.send(OutputLine::StdoutBytes(data));
        }
        SessionEvent::Stderr(data) => {
            let _ = sink.send(OutputLine::StderrBytes(data));
        }
        // The terminal already echoed what the operator typed.
        SessionEvent::InputEchoed { .. } => {}
        SessionEvent::StdinWriteFailed { message } => {
            let _ = sink.send(OutputLine::Stderr(format!(
                "Error writing to child stdin: {message}"
            )));
        }
        SessionEvent::Interrupted => {
            let _ = sink.send(OutputLine::Stderr(
                "\n--- Command Interrupted by User (Ctrl+C) ---".to_string(),
            ));
        }
        SessionEvent::Exited { code } => debug!(?code, "session exited"),
    }
}

/// Run `command` interactively against the real terminal.
///
/// Prints a header, proxies stdin/stdout/stderr until the session resolves,
/// then prints a separator. The runner's result is returned unchanged.
pub(crate) async fn run_command_session(
    cfg: &RunnerConfig,
    command: &str,
    out: &Output,
) -> Result<SessionOutput, RunError> {
    let command = command.trim();
    if command.is_empty() {
        return Err(RunError::EmptyCommand);
    }

    out.status(format!("\n--- Running Command: \"{command}\" ---"));
    out.status("Interact with the command below. Your input will be captured.");
    out.status(format!("{SEPARATOR}\n"));

    let sink = out.sender();
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<SessionEvent>();
    let (ctrl_tx, ctrl_rx) = mpsc::unbounded_channel::<RunnerControl>();
    let input_rx = spawn_stdin_lines();

    let runner = CommandRunner::new(cfg.clone());
    let run = runner.run(command, event_tx, input_rx, ctrl_rx);
    tokio::pin!(run);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut ctrl_c_armed = true;

    let res = loop {
        tokio::select! {
            res = &mut run => break res,
            Some(ev) = event_rx.recv() => forward_event(&sink, ev),
            sig = &mut ctrl_c, if ctrl_c_armed => {
                ctrl_c_armed = false;
                match sig {
                    Ok(()) => {
                        info!("Ctrl-C received, interrupting command");
                        let _ = ctrl_tx.send(RunnerControl::Interrupt);
                    }
                    Err(e) => warn!(error = %e, "failed to listen for Ctrl-C"),
                }
            }
        }
    };
    // The runner has returned; flush whatever it emitted after our last poll.
    while let Ok(ev) = event_rx.try_recv() {
        forward_event(&sink, ev);
    }

    out.status(format!("\n{SEPARATOR}"));
    res
}
