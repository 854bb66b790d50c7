//! Post-capture processing.
//!
//! Copies the capture to the clipboard, checks the renderer, and opens the
//! render page. Failures become messages; nothing here aborts the run.

use crate::config::Config;
use crate::handoff;
use crate::model::Capture;
use tracing::{info, warn};

/// Outcome of the handoff, ready for presentation layers.
#[derive(Debug)]
pub(crate) struct ProcessedCapture {
    pub url: String,
    pub clipboard_copied: bool,
    pub browser_opened: bool,
    pub messages: Vec<String>,
}

/// Hand a finished capture to the renderer according to `cfg`.
pub(crate) async fn process_capture(cfg: &Config, capture: &Capture) -> ProcessedCapture {
    let url = handoff::build_render_url(
        &cfg.renderer.url,
        &cfg.renderer.source,
        &capture.extension,
        &capture.file_name,
    );
    let mut messages = Vec::new();

    let mut hold = None;
    let mut clipboard_copied = false;
    if cfg.clipboard.enabled {
        match handoff::copy_to_clipboard(&capture.text, cfg.clipboard.hold).await {
            Ok(h) => {
                clipboard_copied = true;
                hold = Some(h);
                messages.push(format!(
                    "Copied {} characters to the clipboard.",
                    capture.text.chars().count()
                ));
            }
            Err(e) => {
                warn!(error = %format!("{e:#}"), "clipboard copy failed");
                messages.push(format!("Clipboard copy failed: {e:#}"));
            }
        }
    }

    let mut browser_opened = false;
    if cfg.renderer.open_browser {
        match handoff::probe_renderer(&cfg.renderer.url, cfg.renderer.probe_timeout).await {
            Ok(status) => info!(status, url = %cfg.renderer.url, "renderer reachable"),
            Err(e) => {
                warn!(error = %format!("{e:#}"), "renderer probe failed");
                messages.push(format!(
                    "Warning: renderer at {} did not respond; is it running?",
                    cfg.renderer.url
                ));
            }
        }
        match handoff::open_in_browser(&url) {
            Ok(()) => {
                browser_opened = true;
                info!(%url, "browser launched");
                messages.push(format!("Opened {url}"));
            }
            Err(e) => {
                warn!(error = %format!("{e:#}"), "browser launch failed");
                messages.push(format!("Could not open browser: {e:#}"));
                messages.push(format!("Open this URL manually: {url}"));
            }
        }
    } else {
        messages.push(format!("Render URL: {url}"));
    }

    if let Some(hold) = hold {
        hold.release().await;
    }

    ProcessedCapture {
        url,
        clipboard_copied,
        browser_opened,
        messages,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::model::SourceKind;

    #[tokio::test]
    async fn disabled_handoff_only_reports_url() {
        let mut cfg = Config::default();
        cfg.clipboard.enabled = false;
        cfg.renderer.open_browser = false;
        cfg.renderer.url = "http://127.0.0.1:9/render".into();

        let capture = Capture {
            text: "fn main() {}\n".into(),
            extension: "rs".into(),
            file_name: "main.rs".into(),
            source: SourceKind::File,
            command: None,
            exit_code: None,
            captured_at: String::new(),
        };
        let processed = process_capture(&cfg, &capture).await;
        assert_eq!(
            processed.url,
            "http://127.0.0.1:9/render?source=cli&extension=rs&fileName=main.rs"
        );
        assert!(!processed.clipboard_copied);
        assert!(!processed.browser_opened);
        assert_eq!(processed.messages, vec![format!("Render URL: {}", processed.url)]);
    }
}
