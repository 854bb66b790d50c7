//! Application-level orchestration.
//!
//! The controller runs a command session against the real terminal; post-processing
//! hands a finished capture to the renderer. CLI and menu layers call into this
//! module and stay free of session plumbing.

mod controller;
mod post_process;

pub(crate) use controller::run_command_session;
pub(crate) use post_process::{process_capture, ProcessedCapture};
