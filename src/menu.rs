//! Interactive mode: choose a source and answer its prompts.

use anyhow::{Context, Result};
use dialoguer::{Editor, Input, Select};
use tracing::debug;

/// What the operator picked from the top-level menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MenuChoice {
    File,
    Command,
    Custom,
    Quit,
}

const CHOICES: [(&str, MenuChoice); 4] = [
    ("Code from a file", MenuChoice::File),
    ("Output of a command", MenuChoice::Command),
    ("Custom code", MenuChoice::Custom),
    ("Quit/Exit", MenuChoice::Quit),
];

pub(crate) fn choose_source() -> Result<MenuChoice> {
    let labels: Vec<&str> = CHOICES.iter().map(|(label, _)| *label).collect();
    let idx = Select::new()
        .with_prompt("What would you like to generate a screenshot of?")
        .items(&labels)
        .default(0)
        .interact()
        .context("menu prompt failed")?;
    let choice = CHOICES.get(idx).map(|(_, c)| *c).unwrap_or(MenuChoice::Quit);
    debug!(?choice, "menu choice");
    Ok(choice)
}

/// Prompt until the answer is non-empty.
fn prompt_non_empty(prompt: &str, empty_message: &'static str) -> Result<String> {
    let answer: String = Input::new()
        .with_prompt(prompt)
        .validate_with(move |input: &String| -> Result<(), &'static str> {
            if input.trim().is_empty() {
                Err(empty_message)
            } else {
                Ok(())
            }
        })
        .interact_text()
        .context("input prompt failed")?;
    Ok(answer)
}

pub(crate) fn prompt_file_path() -> Result<String> {
    prompt_non_empty(
        "Enter the path to the file for which you want to generate a screenshot",
        "File path cannot be empty.",
    )
}

pub(crate) fn prompt_command() -> Result<String> {
    prompt_non_empty(
        "Enter the command (or interactive script) to run",
        "Command cannot be empty.",
    )
    .map(|c| c.trim().to_string())
}

/// Collect custom text in the operator's editor, or from a single line if no
/// editor can be launched.
pub(crate) fn prompt_custom_text() -> Result<String> {
    match Editor::new().extension(".txt").edit("") {
        Ok(Some(text)) if !text.trim().is_empty() => return Ok(text),
        Ok(_) => debug!("editor returned no text, falling back to line input"),
        Err(e) => debug!(error = %e, "editor unavailable, falling back to line input"),
    }
    prompt_non_empty("Enter the custom code", "Custom code cannot be empty.")
}

pub(crate) fn prompt_extension(default: &str) -> Result<String> {
    let ext: String = Input::new()
        .with_prompt("File extension for syntax highlighting")
        .default(default.to_string())
        .interact_text()
        .context("input prompt failed")?;
    Ok(ext)
}
