use crate::config::{self, Config};
use crate::error::RunError;
use crate::model::Capture;
use crate::orchestrator::{process_capture, run_command_session};
use crate::output::Output;
use crate::source;
use anyhow::{Context, Result};
use clap::{ArgGroup, Parser};
use crossterm::style::Stylize;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

#[derive(Debug, Parser, Clone)]
#[command(
    name = "snappet-cli",
    version,
    about = "Capture code, command output, or custom text and open it in the Snappet.io renderer",
    after_help = "If no source option is provided, the tool launches in interactive mode.",
    group(ArgGroup::new("source").args(["file", "command", "custom"]))
)]
pub struct Cli {
    /// Generate a screenshot from code in a file
    #[arg(short = 'f', value_name = "FILE_PATH")]
    pub file: Option<String>,

    /// Generate a screenshot from the output of a command (all remaining arguments form the command)
    #[arg(
        short = 'o',
        value_name = "COMMAND",
        num_args = 1..,
        allow_hyphen_values = true
    )]
    pub command: Option<Vec<String>>,

    /// Generate a screenshot from custom text (enclose in quotes)
    #[arg(short = 'c', value_name = "CUSTOM_TEXT", allow_hyphen_values = true)]
    pub custom: Option<String>,

    /// Print the capture as JSON and skip the clipboard/browser handoff
    #[arg(long)]
    pub json: bool,

    /// Print the obtained content before handing it off
    #[arg(long)]
    pub print: bool,

    /// Do not open the renderer in a browser
    #[arg(long)]
    pub no_browser: bool,

    /// Do not copy the content to the clipboard
    #[arg(long)]
    pub no_clipboard: bool,

    /// Renderer page URL (overrides the config file)
    #[arg(long, value_name = "URL")]
    pub renderer_url: Option<String>,

    /// Renderer reachability probe timeout
    #[arg(long, value_name = "DURATION")]
    pub probe_timeout: Option<humantime::Duration>,

    /// How long to keep owning the clipboard after copying
    #[arg(long, value_name = "DURATION")]
    pub clipboard_hold: Option<humantime::Duration>,

    /// Path to the config file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

impl Cli {
    /// The `-o` arguments joined into one shell command.
    pub fn command_line(&self) -> Option<String> {
        self.command.as_ref().map(|parts| parts.join(" "))
    }
}

/// Load the config file and apply CLI overrides.
pub fn build_config(args: &Cli) -> Result<Config> {
    let mut cfg = match args.config.clone().or_else(config::default_path) {
        Some(path) => Config::load(&path)?,
        None => Config::default(),
    };
    if let Some(url) = args.renderer_url.as_deref() {
        cfg.renderer.url = url.to_string();
    }
    if let Some(timeout) = args.probe_timeout {
        cfg.renderer.probe_timeout = Duration::from(timeout);
    }
    if let Some(hold) = args.clipboard_hold {
        cfg.clipboard.hold = Duration::from(hold);
    }
    if args.no_browser {
        cfg.renderer.open_browser = false;
    }
    if args.no_clipboard {
        cfg.clipboard.enabled = false;
    }
    Ok(cfg)
}

pub async fn run(args: Cli) -> Result<()> {
    let cfg = build_config(&args)?;
    let out = Output::spawn(args.json);

    let res = run_with_output(&args, &cfg, &out).await;
    if let Err(e) = &res {
        if out.is_machine_readable() {
            report_json_error(&out, e);
        }
    }
    out.finish().await;
    res
}

async fn run_with_output(args: &Cli, cfg: &Config, out: &Output) -> Result<()> {
    if !out.is_machine_readable() {
        welcome(out);
    }

    let capture = if let Some(path) = args.file.as_deref() {
        out.status(format!("Reading file: {}", source::clean_path(path)).yellow().to_string());
        Some(source::read_file_capture(path)?)
    } else if let Some(command) = args.command_line() {
        let output = run_command_session(&cfg.runner, &command, out).await?;
        Some(source::command_capture(output, &cfg.capture))
    } else if let Some(text) = args.custom.clone() {
        Some(source::custom_capture(text, None, &cfg.capture))
    } else {
        interactive(cfg, out).await?
    };

    match capture {
        Some(capture) => deliver(args, cfg, out, capture).await,
        None => Ok(()),
    }
}

fn welcome(out: &Output) {
    out.status("Snappet.io".bold().magenta().to_string());
    out.status("\nWelcome to the Snappet.io CLI!".italic().bold().to_string());
    out.status("Made by Waleed Nasir\n".italic().to_string());
}

#[cfg(feature = "interactive")]
async fn interactive(cfg: &Config, out: &Output) -> Result<Option<Capture>> {
    use crate::menu::{self, MenuChoice};

    // Prompts write to the terminal directly; let queued lines land first.
    out.sync().await;
    let choice = prompt(menu::choose_source).await?;
    info!(?choice, "interactive mode");

    let capture = match choice {
        MenuChoice::File => {
            let path = prompt(menu::prompt_file_path).await?;
            Some(source::read_file_capture(&path)?)
        }
        MenuChoice::Command => {
            let command = prompt(menu::prompt_command).await?;
            let output = run_command_session(&cfg.runner, &command, out).await?;
            Some(source::command_capture(output, &cfg.capture))
        }
        MenuChoice::Custom => {
            let text = prompt(menu::prompt_custom_text).await?;
            let default_ext = cfg.capture.custom_extension.clone();
            let ext = prompt(move || menu::prompt_extension(&default_ext)).await?;
            Some(source::custom_capture(text, Some(ext.as_str()), &cfg.capture))
        }
        MenuChoice::Quit => {
            out.status("Goodbye!".bold().magenta().to_string());
            None
        }
    };
    Ok(capture)
}

#[cfg(feature = "interactive")]
async fn prompt<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .context("prompt task failed")?
}

#[cfg(not(feature = "interactive"))]
async fn interactive(_cfg: &Config, _out: &Output) -> Result<Option<Capture>> {
    anyhow::bail!("no source given: pass -f, -o or -c (interactive mode is not available in this build)")
}

/// Print or hand off a finished capture.
async fn deliver(args: &Cli, cfg: &Config, out: &Output, capture: Capture) -> Result<()> {
    info!(
        source = capture.source.as_str(),
        extension = %capture.extension,
        chars = capture.text.len(),
        "capture ready"
    );

    if args.json {
        let json = serde_json::to_string_pretty(&capture).context("failed to serialize capture")?;
        out.result(json);
        return Ok(());
    }

    if args.print {
        let summary = crate::text_summary::build_content_summary(&capture);
        for line in summary.lines {
            out.status(line);
        }
    }

    let processed = process_capture(cfg, &capture).await;
    info!(
        url = %processed.url,
        clipboard = processed.clipboard_copied,
        browser = processed.browser_opened,
        "handoff finished"
    );
    let summary = crate::text_summary::build_handoff_summary(&capture, &processed);
    for line in summary.lines {
        out.status(line);
    }
    out.status("\nHappy Editing!".bold().magenta().to_string());
    Ok(())
}

fn report_json_error(out: &Output, err: &anyhow::Error) {
    let run_err = err.downcast_ref::<RunError>();
    let body = serde_json::json!({
        "error": format!("{err:#}"),
        "kind": run_err.map(RunError::kind),
        "transcript": run_err.and_then(RunError::transcript),
    });
    out.result(body.to_string());
}
