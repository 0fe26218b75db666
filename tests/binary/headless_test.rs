//! Headless sessions through the binary.

use pretty_assertions::assert_eq;

use super::common::{run_opscli, run_opscli_with_config};

#[test]
fn test_commands_from_arguments() {
    let (code, stdout, _) = run_opscli(
        &["-c", "configure terminal", "-c", "vlan 10", "-c", "pwc"],
        "",
    );
    assert_eq!(code, 0);
    assert_eq!(
        stdout,
        "switch> configure terminal\n\
         switch(config)# vlan 10\n\
         switch(vlan-10)# pwc\n\
         config\n  vlan 10\n"
    );
}

#[test]
fn test_commands_from_stdin() {
    let (code, stdout, _) = run_opscli(&["--headless"], "show vlan summary\nquit\nshow vlan\n");
    assert_eq!(code, 0);
    assert_eq!(
        stdout,
        "switch> show vlan summary\nNumber of existing VLANs: 1\nswitch> quit\n"
    );
}

#[test]
fn test_errors_keep_exit_code_zero() {
    let (code, stdout, _) = run_opscli(&["-c", "bogus"], "");
    assert_eq!(code, 0);
    assert!(stdout.contains("% No such command."));
}

#[test]
fn test_bad_config_file_fails_startup() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    std::fs::write(&path, "[server]\ntimeout_ms = 0\n").unwrap();

    let (code, _, stderr) = run_opscli_with_config(&path, &["-c", "pwc"], "");
    assert_eq!(code, 1);
    assert!(stderr.contains("timeout_ms"));
}
