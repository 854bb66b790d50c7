use assert_cmd::Command;
use std::path::Path;

/// Binary under test with config, data and log locations inside `home`.
fn snappet(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("snappet-cli").unwrap();
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join("config"))
        .env("XDG_DATA_HOME", home.join("data"))
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .arg("--config")
        .arg(home.join("config.toml"));
    cmd
}

fn stdout_json(output: &std::process::Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn help_exits_zero() {
    let home = tempfile::tempdir().unwrap();
    let output = snappet(home.path()).arg("--help").output().unwrap();
    assert!(output.status.success());
    let text = String::from_utf8_lossy(&output.stdout);
    assert!(text.contains("-f <FILE_PATH>"));
    assert!(text.contains("-o <COMMAND>"));
    assert!(text.contains("interactive mode"));
}

#[test]
fn unknown_flag_exits_one() {
    let home = tempfile::tempdir().unwrap();
    snappet(home.path()).arg("--bogus").assert().code(1);
}

#[test]
fn conflicting_sources_exit_one() {
    let home = tempfile::tempdir().unwrap();
    snappet(home.path())
        .args(["-f", "a.rs", "-c", "text"])
        .assert()
        .code(1);
}

#[test]
fn missing_file_exits_one() {
    let home = tempfile::tempdir().unwrap();
    let missing = home.path().join("nope.rs");
    let output = snappet(home.path())
        .arg("-f")
        .arg(&missing)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    let err = String::from_utf8_lossy(&output.stderr);
    assert!(err.contains("file not found"), "stderr was: {err}");
}

#[test]
fn custom_text_as_json() {
    let home = tempfile::tempdir().unwrap();
    let output = snappet(home.path())
        .args(["--json", "-c", "fn main() {}"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let capture = stdout_json(&output);
    assert_eq!(capture["text"], "fn main() {}");
    assert_eq!(capture["source"], "custom");
    assert_eq!(capture["extension"], "txt");
    assert_eq!(capture["file_name"], "snippet");
}

#[test]
fn file_as_json_keeps_name_and_extension() {
    let home = tempfile::tempdir().unwrap();
    let file = home.path().join("lib.rs");
    std::fs::write(&file, "pub fn add() {}\n").unwrap();

    let output = snappet(home.path())
        .arg("--json")
        .arg("-f")
        .arg(format!("'{}'", file.display()))
        .output()
        .unwrap();
    assert!(output.status.success());
    let capture = stdout_json(&output);
    assert_eq!(capture["text"], "pub fn add() {}\n");
    assert_eq!(capture["extension"], "rs");
    assert_eq!(capture["file_name"], "lib.rs");
    assert_eq!(capture["source"], "file");
}

#[test]
fn print_frames_content_without_handoff() {
    let home = tempfile::tempdir().unwrap();
    let output = snappet(home.path())
        .args(["--print", "--no-browser", "--no-clipboard", "-c", "hello"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let text = String::from_utf8_lossy(&output.stdout);
    assert!(text.contains("--- Obtained Content for Screenshot ---\nhello\n--- End of Obtained Content ---"));
    assert!(text.contains("Render URL: http://localhost:3000/?source=cli&extension=txt&fileName=snippet"));
}

#[cfg(unix)]
#[test]
fn command_output_as_json() {
    let home = tempfile::tempdir().unwrap();
    let output = snappet(home.path())
        .args(["--json", "-o", "echo", "hi", "&&", "echo", "err", ">&2"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let capture = stdout_json(&output);
    assert_eq!(capture["command"], "echo hi && echo err >&2");
    assert_eq!(capture["source"], "command");
    assert_eq!(capture["exit_code"], 0);
    let text = capture["text"].as_str().unwrap();
    assert!(text.contains("hi\n") && text.contains("err\n"));

    // Child output is mirrored to stderr so stdout stays parseable.
    let err = String::from_utf8_lossy(&output.stderr);
    assert!(err.contains("--- Running Command: \"echo hi && echo err >&2\" ---"));
    assert!(err.contains("hi\n"));
}

#[cfg(unix)]
#[test]
fn invalid_utf8_input_line_keeps_stdin_open() {
    let home = tempfile::tempdir().unwrap();
    let output = snappet(home.path())
        .args(["--json", "-o", "cat"])
        .write_stdin(b"caf\xe9\nsecond\n".to_vec())
        .output()
        .unwrap();
    assert!(output.status.success());
    let capture = stdout_json(&output);
    let text = capture["text"].as_str().unwrap();
    // Each line appears twice: the input echo and cat's copy of it.
    assert_eq!(text.matches("caf\u{FFFD}\n").count(), 2, "transcript was: {text:?}");
    assert_eq!(text.matches("second\n").count(), 2, "transcript was: {text:?}");
}

#[cfg(unix)]
#[test]
fn failing_command_exits_one_with_transcript() {
    let home = tempfile::tempdir().unwrap();
    let output = snappet(home.path())
        .args(["--json", "-o", "echo", "partial;", "exit", "3"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    let body = stdout_json(&output);
    assert_eq!(body["kind"], "command_failed");
    assert_eq!(body["transcript"], "partial\n");
    assert!(body["error"].as_str().unwrap().contains("exited with code 3"));
}

#[cfg(unix)]
#[test]
fn unknown_command_is_a_spawn_failure() {
    let home = tempfile::tempdir().unwrap();
    let output = snappet(home.path())
        .args(["--json", "-o", "definitely-not-a-real-command-xyz"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(stdout_json(&output)["kind"], "spawn_failed");
}
