mod cli;
mod config;
mod engine;
mod error;
mod handoff;
mod logging;
#[cfg(feature = "interactive")]
mod menu;
mod model;
mod orchestrator;
mod output;
mod source;
mod text_summary;

use clap::error::ErrorKind as ClapErrorKind;
use clap::Parser;
use crossterm::style::Stylize;
use error::RunError;

const EXIT_FAILURE: i32 = 1;
/// 128 + SIGINT, as shells report it.
const EXIT_INTERRUPTED: i32 = 130;

fn exit_code_for(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<RunError>() {
        Some(RunError::Interrupted { .. }) => EXIT_INTERRUPTED,
        _ => EXIT_FAILURE,
    }
}

#[tokio::main]
async fn main() {
    let args = match cli::Cli::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let code = match e.kind() {
                ClapErrorKind::DisplayHelp | ClapErrorKind::DisplayVersion => 0,
                _ => EXIT_FAILURE,
            };
            let _ = e.print();
            std::process::exit(code);
        }
    };

    let guard = logging::init_logging(args.verbose);

    let code = match cli::run(args).await {
        Ok(()) => 0,
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "run failed");
            eprintln!("{}", format!("Error: {e:#}").red());
            exit_code_for(&e)
        }
    };

    // Flush pending log lines before exiting; process::exit skips destructors.
    drop(guard);
    std::process::exit(code);
}
