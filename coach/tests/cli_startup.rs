//! CLI tests: spawn the coach binary and check startup behavior.

use std::fs;
use std::process::Command;

use coach::io::config::{CoachConfig, load_config};

fn coach() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_coach"));
    cmd.env_remove("COACH_API_KEY")
        .env_remove("VSEGPT_API_KEY")
        .env_remove("TAVILY_API_KEY");
    cmd
}

#[test]
fn init_config_writes_defaults() {
    let temp = tempfile::tempdir().expect("tempdir");

    let status = coach()
        .current_dir(temp.path())
        .arg("init-config")
        .status()
        .expect("coach init-config");

    assert!(status.success());
    let cfg = load_config(&temp.path().join("coach.toml")).expect("load");
    assert_eq!(cfg, CoachConfig::default());
}

#[test]
fn missing_api_key_exits_with_error() {
    let temp = tempfile::tempdir().expect("tempdir");

    let output = coach()
        .current_dir(temp.path())
        .arg("interview")
        .output()
        .expect("coach interview");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("COACH_API_KEY"));
}

#[test]
fn invalid_config_exits_with_error() {
    let temp = tempfile::tempdir().expect("tempdir");
    fs::write(temp.path().join("coach.toml"), "temperature = 9.0\n").expect("write");

    let output = coach()
        .current_dir(temp.path())
        .env("COACH_API_KEY", "test")
        .output()
        .expect("coach");

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("temperature"));
}
