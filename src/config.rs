//! Configuration at `<config dir>/snappet-cli/config.toml`.
//!
//! Every field has a default, so a missing file or a partial file both work.
//! CLI flags always override config file values.

use crate::model::RunnerConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub renderer: RendererConfig,
    #[serde(default)]
    pub clipboard: ClipboardConfig,
    #[serde(default)]
    pub runner: RunnerConfig,
    #[serde(default)]
    pub capture: CaptureDefaults,
}

/// Where captures are sent for rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RendererConfig {
    #[serde(default = "default_renderer_url")]
    pub url: String,
    /// Value of the `source` query parameter.
    #[serde(default = "default_source")]
    pub source: String,
    #[serde(default = "default_probe_timeout", with = "humantime_serde")]
    pub probe_timeout: Duration,
    #[serde(default = "default_true")]
    pub open_browser: bool,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            url: default_renderer_url(),
            source: default_source(),
            probe_timeout: default_probe_timeout(),
            open_browser: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClipboardConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// How long to keep owning the clipboard after writing it.
    #[serde(default = "default_clipboard_hold", with = "humantime_serde")]
    pub hold: Duration,
}

impl Default for ClipboardConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            hold: default_clipboard_hold(),
        }
    }
}

/// Metadata used when the capture has no file behind it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureDefaults {
    #[serde(default = "default_txt")]
    pub command_extension: String,
    #[serde(default = "default_command_file_name")]
    pub command_file_name: String,
    #[serde(default = "default_txt")]
    pub custom_extension: String,
    #[serde(default = "default_custom_file_name")]
    pub custom_file_name: String,
}

impl Default for CaptureDefaults {
    fn default() -> Self {
        Self {
            command_extension: default_txt(),
            command_file_name: default_command_file_name(),
            custom_extension: default_txt(),
            custom_file_name: default_custom_file_name(),
        }
    }
}

fn default_renderer_url() -> String {
    "http://localhost:3000/".to_string()
}

fn default_source() -> String {
    "cli".to_string()
}

fn default_probe_timeout() -> Duration {
    Duration::from_secs(2)
}

fn default_clipboard_hold() -> Duration {
    Duration::from_secs(2)
}

fn default_true() -> bool {
    true
}

fn default_txt() -> String {
    "txt".to_string()
}

fn default_command_file_name() -> String {
    "output".to_string()
}

fn default_custom_file_name() -> String {
    "snippet".to_string()
}

/// Default config file location, if the platform has a config directory.
pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("snappet-cli").join("config.toml"))
}

impl Config {
    /// Load configuration from a TOML file, returning defaults if the file
    /// does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config at {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("failed to parse config at {}", path.display()))?;

        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }
}
