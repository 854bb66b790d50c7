//! System clipboard access.
//!
//! On Linux the clipboard contents live only as long as the process that set
//! them owns the selection, so the `Clipboard` is kept alive for a hold period
//! after writing to give clipboard managers time to take over.

use anyhow::Result;
use std::time::Duration;

/// A clipboard write that is still being held open.
pub(crate) struct ClipboardHold {
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl ClipboardHold {
    /// Wait for the hold period to elapse.
    pub async fn release(mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

/// Put `text` on the system clipboard.
///
/// Resolves once the write has succeeded or failed; the returned hold keeps
/// ownership of the clipboard for `hold` in a background blocking task.
#[cfg(feature = "clipboard")]
pub(crate) async fn copy_to_clipboard(text: &str, hold: Duration) -> Result<ClipboardHold> {
    use anyhow::Context;
    use tokio::sync::oneshot;

    let text = text.to_string();
    let (ready_tx, ready_rx) = oneshot::channel::<Result<(), String>>();

    let handle = tokio::task::spawn_blocking(move || {
        let mut clipboard = match arboard::Clipboard::new() {
            Ok(c) => c,
            Err(e) => {
                let _ = ready_tx.send(Err(e.to_string()));
                return;
            }
        };
        if let Err(e) = clipboard.set_text(text) {
            let _ = ready_tx.send(Err(e.to_string()));
            return;
        }
        let _ = ready_tx.send(Ok(()));
        std::thread::sleep(hold);
        // Clipboard is dropped here
    });

    match ready_rx.await.context("clipboard task ended unexpectedly")? {
        Ok(()) => {
            tracing::debug!(hold_ms = hold.as_millis() as u64, "clipboard set");
            Ok(ClipboardHold {
                handle: Some(handle),
            })
        }
        Err(e) => {
            let _ = handle.await;
            Err(anyhow::anyhow!("failed to set clipboard: {e}"))
        }
    }
}

#[cfg(not(feature = "clipboard"))]
pub(crate) async fn copy_to_clipboard(_text: &str, _hold: Duration) -> Result<ClipboardHold> {
    Err(anyhow::anyhow!(
        "clipboard support is not available in this build"
    ))
}
