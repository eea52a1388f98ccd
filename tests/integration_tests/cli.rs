//! Behaviour of the binary as seen from the outside.

use std::fs;
use std::os::unix::process::CommandExt;
use std::path::Path;
use std::process::{Command, Stdio};

use crate::common::starter_command;
use nix::unistd::getuid;
use rstest::rstest;
use sui_starter::process::TARGET_NAME;
use sui_starter::server::APP_PROCESS;

/// `nobody`, for checking the refusal when tests run as root.
const NOBODY: u32 = 65534;

#[rstest]
#[case::no_args(&[])]
#[case::missing_data_dir(&["/data/adb/sui/sui.dex"])]
#[case::extra_positional(&["/data/adb/sui/sui.dex", "/data/adb/sui", "extra"])]
fn test_usage_errors_exit_before_launch(#[case] args: &[&str]) {
    let output = starter_command().args(args).output().unwrap();

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Usage"), "stderr: {stderr}");
    assert!(!stderr.contains("starter begin"), "stderr: {stderr}");
}

#[test]
fn test_help_names_both_paths() {
    let output = starter_command().arg("--help").output().unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("<PAYLOAD>"), "stdout: {stdout}");
    assert!(stdout.contains("<DATA_DIR>"), "stdout: {stdout}");
}

#[test]
fn test_non_root_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let payload = dir.path().join("sui.dex");
    let mut cmd = starter_command();
    let uid = if getuid().is_root() {
        cmd.uid(NOBODY).gid(NOBODY);
        NOBODY
    } else {
        getuid().as_raw()
    };

    let output = cmd.arg(&payload).arg(dir.path()).output().unwrap();

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains(&format!("uid={uid}")), "stderr: {stderr}");
    assert!(!stderr.contains("starter begin"), "stderr: {stderr}");
}

#[test]
fn test_malformed_config_still_launches() {
    // Only root gets past the uid check, and a real app_process would be run
    if !getuid().is_root() || Path::new(APP_PROCESS).exists() {
        return;
    }

    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("starter.toml"), "poll_interval_ms = \"soon\"\n").unwrap();
    let mut zygote = Command::new("sleep")
        .arg0(TARGET_NAME)
        .arg("30")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .unwrap();

    // Output is read until the daemonized child exits too
    let output = starter_command()
        .arg(dir.path().join("sui.dex"))
        .arg(dir.path())
        .output()
        .unwrap();
    let zygote_pid = zygote.id();
    zygote.kill().unwrap();
    zygote.wait().unwrap();

    assert_eq!(output.status.code(), Some(0));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("invalid config"), "stderr: {stderr}");
    assert!(stderr.contains("using defaults"), "stderr: {stderr}");
    assert!(
        stderr.contains(&format!("found zygote {zygote_pid}")),
        "stderr: {stderr}"
    );
    assert!(stderr.contains("exec app_process..."), "stderr: {stderr}");
}
