//! Handing a capture to the renderer: clipboard, URL, browser.

mod browser;
mod clipboard;

pub(crate) use browser::{build_render_url, open_in_browser, probe_renderer};
pub(crate) use clipboard::copy_to_clipboard;
