//! Helpers for running the `opscli` binary.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

/// Runs `opscli` against the mock database with `args`, feeding `stdin`.
/// A config path that does not exist keeps the user's own file out of it.
pub fn run_opscli(args: &[&str], stdin: &str) -> (i32, String, String) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    run_opscli_with_config(&dir.path().join("missing.toml"), args, stdin)
}

/// Like [`run_opscli`], reading settings from `config`.
pub fn run_opscli_with_config(config: &Path, args: &[&str], stdin: &str) -> (i32, String, String) {
    let mut child = Command::new(env!("CARGO_BIN_EXE_opscli"))
        .arg("--mock-db")
        .arg("--config")
        .arg(config)
        .args(args)
        .env_remove("OPSCLI_SERVER")
        .env_remove("RUST_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to start opscli");

    child
        .stdin
        .take()
        .expect("stdin is piped")
        .write_all(stdin.as_bytes())
        .expect("Failed to write stdin");
    let output = child.wait_with_output().expect("Failed to wait for opscli");

    let exit_code = output.status.code().unwrap_or(-1);
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (exit_code, stdout, stderr)
}
