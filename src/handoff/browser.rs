//! Renderer page URL, reachability probe, and browser launch.

use anyhow::{Context, Result};
use std::time::Duration;

/// Build the renderer page URL for a capture.
///
/// Query values are percent-encoded. If `base` already carries a query string
/// the parameters are appended to it.
pub(crate) fn build_render_url(base: &str, source: &str, extension: &str, file_name: &str) -> String {
    let sep = if base.contains('?') {
        if base.ends_with('?') || base.ends_with('&') {
            ""
        } else {
            "&"
        }
    } else {
        "?"
    };
    format!(
        "{base}{sep}source={}&extension={}&fileName={}",
        urlencoding::encode(source),
        urlencoding::encode(extension),
        urlencoding::encode(file_name),
    )
}

/// GET the renderer base URL and return the HTTP status.
///
/// Any response counts as reachable; only connection failures and timeouts
/// are errors.
pub(crate) async fn probe_renderer(url: &str, timeout: Duration) -> Result<u16> {
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout)
        .user_agent(concat!("snappet-cli/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("failed to build HTTP client")?;
    let resp = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("renderer at {url} is not reachable"))?;
    Ok(resp.status().as_u16())
}

/// Open `url` in the default browser without waiting for it to exit.
pub(crate) fn open_in_browser(url: &str) -> Result<()> {
    let mut cmd = browser_command(url)?;
    cmd.stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null());
    cmd.spawn()
        .with_context(|| format!("failed to launch browser for {url}"))?;
    Ok(())
}

#[cfg(target_os = "macos")]
fn browser_command(url: &str) -> Result<std::process::Command> {
    let mut cmd = std::process::Command::new("open");
    cmd.arg(url);
    Ok(cmd)
}

#[cfg(any(
    target_os = "linux",
    target_os = "freebsd",
    target_os = "openbsd",
    target_os = "netbsd",
    target_os = "dragonfly"
))]
fn browser_command(url: &str) -> Result<std::process::Command> {
    let mut cmd = std::process::Command::new("xdg-open");
    cmd.arg(url);
    Ok(cmd)
}

// `cmd /C start` splits the URL on `&`, so hand it to the URL protocol handler directly.
#[cfg(target_os = "windows")]
fn browser_command(url: &str) -> Result<std::process::Command> {
    let mut cmd = std::process::Command::new("rundll32");
    cmd.args(["url.dll,FileProtocolHandler", url]);
    Ok(cmd)
}

#[cfg(not(any(
    target_os = "macos",
    target_os = "windows",
    target_os = "linux",
    target_os = "freebsd",
    target_os = "openbsd",
    target_os = "netbsd",
    target_os = "dragonfly"
)))]
fn browser_command(_url: &str) -> Result<std::process::Command> {
    anyhow::bail!("opening a browser is not supported on this platform")
}
