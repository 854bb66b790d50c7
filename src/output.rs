//! Terminal output routing.
//!
//! All writes to the real stdout/stderr go through one blocking writer task so
//! async code never blocks on a slow terminal and ordering within each stream
//! is preserved.

use bytes::Bytes;
use std::io::Write;
use tokio::sync::{mpsc, oneshot};

/// Output routing for the stdout/stderr writer.
pub(crate) enum OutputLine {
    Stdout(String),
    Stderr(String),
    /// Raw child output, written without adding a newline.
    StdoutBytes(Bytes),
    StderrBytes(Bytes),
    /// Machine-readable result; always goes to the real stdout.
    Result(String),
    /// Acknowledged once everything queued before it has been written.
    Sync(oneshot::Sender<()>),
}

/// Spawn a blocking writer for stdout/stderr.
///
/// With `stdout_to_stderr` set, everything destined for stdout is written to
/// stderr instead, leaving stdout free for machine-readable output.
fn spawn_output_writer(
    stdout_to_stderr: bool,
) -> (
    mpsc::UnboundedSender<OutputLine>,
    tokio::task::JoinHandle<()>,
) {
    let (tx, mut rx) = mpsc::unbounded_channel::<OutputLine>();
    let handle = tokio::task::spawn_blocking(move || {
        let stdout = std::io::stdout();
        let stderr = std::io::stderr();

        while let Some(line) = rx.blocking_recv() {
            let line = match line {
                OutputLine::Sync(ack) => {
                    let _ = ack.send(());
                    continue;
                }
                line => line,
            };
            let to_stderr = match line {
                OutputLine::Stderr(_) | OutputLine::StderrBytes(_) => true,
                OutputLine::Result(_) | OutputLine::Sync(_) => false,
                OutputLine::Stdout(_) | OutputLine::StdoutBytes(_) => stdout_to_stderr,
            };
            // Locks are taken per message so prompts written elsewhere are never blocked.
            let mut out;
            let mut err;
            let w: &mut dyn Write = if to_stderr {
                err = stderr.lock();
                &mut err
            } else {
                out = stdout.lock();
                &mut out
            };
            let res = match line {
                OutputLine::Stdout(msg) | OutputLine::Stderr(msg) | OutputLine::Result(msg) => {
                    writeln!(w, "{}", msg)
                }
                OutputLine::StdoutBytes(data) | OutputLine::StderrBytes(data) => w.write_all(&data),
                OutputLine::Sync(_) => Ok(()),
            };
            // Child prompts often lack a trailing newline; flush every message.
            if res.is_ok() {
                let _ = w.flush();
            }
        }
    });
    (tx, handle)
}

/// Handle to the writer task.
pub(crate) struct Output {
    tx: mpsc::UnboundedSender<OutputLine>,
    handle: tokio::task::JoinHandle<()>,
    machine_readable: bool,
}

impl Output {
    pub fn spawn(machine_readable: bool) -> Self {
        let (tx, handle) = spawn_output_writer(machine_readable);
        Self {
            tx,
            handle,
            machine_readable,
        }
    }

    pub fn sender(&self) -> mpsc::UnboundedSender<OutputLine> {
        self.tx.clone()
    }

    /// Human-facing status line.
    pub fn status(&self, msg: impl Into<String>) {
        let _ = self.tx.send(OutputLine::Stdout(msg.into()));
    }

    /// Write to the real stdout even when status output is diverted.
    pub fn result(&self, msg: impl Into<String>) {
        let _ = self.tx.send(OutputLine::Result(msg.into()));
    }

    /// Wait until everything queued so far is on the terminal, e.g. before a prompt.
    pub async fn sync(&self) {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.tx.send(OutputLine::Sync(ack_tx)).is_ok() {
            let _ = ack_rx.await;
        }
    }

    pub fn is_machine_readable(&self) -> bool {
        self.machine_readable
    }

    /// Close the channel and wait for everything queued to be written.
    pub async fn finish(self) {
        drop(self.tx);
        let _ = self.handle.await;
    }
}
