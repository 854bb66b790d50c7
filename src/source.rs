//! Capture sources: a file on disk, a finished command session, or literal text.

use crate::config::CaptureDefaults;
use crate::error::SourceError;
use crate::model::{now_rfc3339, Capture, SessionOutput, SourceKind};
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::{debug, info};

/// Normalize a path as typed, pasted, or drag-and-dropped into a terminal.
///
/// Trims whitespace, strips one pair of matching single or double quotes, and
/// strips a leading `& ` (PowerShell drag-and-drop) whether it sits outside
/// or inside the quotes. Every path source goes through this one function.
pub fn clean_path(raw: &str) -> String {
    let mut path = strip_call_operator(raw.trim());
    for quote in ['\'', '"'] {
        if path.len() >= 2 && path.starts_with(quote) && path.ends_with(quote) {
            path = path[1..path.len() - 1].trim();
        }
    }
    strip_call_operator(path).to_string()
}

fn strip_call_operator(path: &str) -> &str {
    path.strip_prefix("& ").map(str::trim).unwrap_or(path)
}

/// Last path component, splitting on both `/` and `\`.
pub fn file_name_of(path: &str) -> &str {
    path.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or(path)
}

/// Text after the last `.` of the file name; empty when there is none.
pub fn extension_of(file_name: &str) -> &str {
    match file_name.rfind('.') {
        Some(idx) => &file_name[idx + 1..],
        None => "",
    }
}

/// Read a file into a capture.
pub fn read_file_capture(raw_path: &str) -> Result<Capture, SourceError> {
    let cleaned = clean_path(raw_path);
    if cleaned.is_empty() {
        return Err(SourceError::EmptyPath);
    }
    let path = PathBuf::from(&cleaned);
    debug!(path = %path.display(), "reading file");

    let bytes = std::fs::read(&path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => SourceError::NotFound(path.clone()),
        ErrorKind::PermissionDenied => SourceError::PermissionDenied(path.clone()),
        _ => SourceError::Read {
            path: path.clone(),
            source: e,
        },
    })?;
    let text = String::from_utf8_lossy(&bytes).into_owned();

    let file_name = file_name_of(&cleaned).to_string();
    let extension = extension_of(&file_name).to_string();
    info!(path = %path.display(), bytes = bytes.len(), %extension, "file captured");

    Ok(Capture {
        text,
        extension,
        file_name,
        source: SourceKind::File,
        command: None,
        exit_code: None,
        captured_at: now_rfc3339(),
    })
}

/// Turn a finished command session into a capture.
pub fn command_capture(output: SessionOutput, defaults: &CaptureDefaults) -> Capture {
    Capture {
        text: output.transcript,
        extension: defaults.command_extension.clone(),
        file_name: defaults.command_file_name.clone(),
        source: SourceKind::Command,
        command: Some(output.command),
        exit_code: Some(output.exit_code),
        captured_at: now_rfc3339(),
    }
}

/// Literal text, with an optional extension override.
pub fn custom_capture(text: String, extension: Option<&str>, defaults: &CaptureDefaults) -> Capture {
    let extension = extension
        .map(str::trim)
        .map(|e| e.trim_start_matches('.'))
        .filter(|e| !e.is_empty())
        .unwrap_or(defaults.custom_extension.as_str())
        .to_string();
    Capture {
        text,
        extension,
        file_name: defaults.custom_file_name.clone(),
        source: SourceKind::Custom,
        command: None,
        exit_code: None,
        captured_at: now_rfc3339(),
    }
}
