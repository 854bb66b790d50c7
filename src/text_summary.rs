//! Text summary builder for CLI output.
//!
//! Formats the obtained content and the handoff outcome as human-readable lines.

use crate::model::{Capture, SourceKind};
use crate::orchestrator::ProcessedCapture;

/// Pre-formatted lines for text output.
pub(crate) struct TextSummary {
    pub lines: Vec<String>,
}

/// Frame the captured text between start and end markers.
pub(crate) fn build_content_summary(capture: &Capture) -> TextSummary {
    let mut lines = vec!["\n--- Obtained Content for Screenshot ---".to_string()];
    lines.push(capture.text.trim_end_matches('\n').to_string());
    lines.push("--- End of Obtained Content ---\n".to_string());
    TextSummary { lines }
}

/// Describe the capture and what the handoff did with it.
pub(crate) fn build_handoff_summary(capture: &Capture, processed: &ProcessedCapture) -> TextSummary {
    let mut lines = Vec::new();

    let origin = match (capture.source, capture.command.as_deref()) {
        (SourceKind::Command, Some(cmd)) => format!("command `{cmd}`"),
        (source, _) => source.as_str().to_string(),
    };
    lines.push(format!(
        "Captured {} lines from {origin} as {} ({})",
        capture.text.lines().count(),
        capture.file_name,
        if capture.extension.is_empty() {
            "no extension"
        } else {
            capture.extension.as_str()
        }
    ));
    lines.extend(processed.messages.iter().cloned());
    if !processed.clipboard_copied && !processed.browser_opened {
        lines.push("Nothing was handed off; use --print or --json to get the content.".to_string());
    }

    TextSummary { lines }
}
