//! The launch sequence up to exec, driven through a fake process table.

use crate::common::FakeProc;
use nix::unistd::Pid;
use sui_starter::config::StarterConfig;
use sui_starter::process::{ProcScanner, ProcessHandle, ProcessSource, TARGET_NAME};
use sui_starter::server::{ArgumentBuilder, DEBUGGABLE, LaunchParameters};
use sui_starter::starter::prepare;
use sui_starter::StarterError;

// The test runner's pid may collide with a fake one; exclude something unused instead.
const NOT_A_FAKE_PID: Pid = Pid::from_raw(1_000_000);

/// Starts zygote in the fake table once `boot_scans` scans have come up empty.
struct Booting<'a> {
    proc: &'a FakeProc,
    scanner: ProcScanner,
    boot_scans: usize,
    scans: usize,
}

impl<'a> Booting<'a> {
    fn new(proc: &'a FakeProc, boot_scans: usize) -> Self {
        Self {
            proc,
            scanner: ProcScanner::with_root(proc.root()).excluding(NOT_A_FAKE_PID),
            boot_scans,
            scans: 0,
        }
    }
}

impl ProcessSource for Booting<'_> {
    fn scan(&mut self, predicate: &mut dyn FnMut(&ProcessHandle) -> bool) -> Option<ProcessHandle> {
        if self.scans == self.boot_scans {
            self.proc.spawn(
                642,
                &[TARGET_NAME, "-Xzygote", "/system/bin", "--zygote", "--start-system-server"],
            );
        }
        self.scans += 1;
        self.scanner.scan(predicate)
    }
}

fn early_boot() -> FakeProc {
    let proc = FakeProc::new();
    proc.spawn(1, &["/init", "second_stage"]);
    proc.spawn(2, &[]);
    proc.spawn(310, &["/system/bin/servicemanager"]);
    proc.spawn(322, &["/system/bin/surfaceflinger"]);
    proc
}

fn fast_config() -> StarterConfig {
    StarterConfig {
        poll_interval_ms: 1,
        api_level: Some(33),
        ..StarterConfig::default()
    }
}

#[test]
fn test_sui_launch_when_zygote_already_running() {
    let proc = early_boot();
    proc.spawn(642, &[TARGET_NAME, "-Xzygote"]);
    let params = LaunchParameters::new("/data/adb/sui/sui.dex", "/data/adb/sui");

    let detector = fast_config().detector();
    let mut scanner = ProcScanner::with_root(proc.root()).excluding(NOT_A_FAKE_PID);
    assert_eq!(detector.wait_for(&mut scanner), Ok(Pid::from_raw(642)));

    let argv = ArgumentBuilder::new(&params)
        .debuggable(false)
        .build()
        .unwrap();
    let slots: Vec<Option<&str>> = argv
        .as_slice()
        .iter()
        .map(|slot| slot.as_deref().map(|arg| arg.to_str().unwrap()))
        .collect();
    assert_eq!(
        slots,
        vec![
            Some("/system/bin/app_process"),
            Some("-Djava.class.path=/data/adb/sui/sui.dex"),
            Some("-Djava.library.path=/data/adb/sui"),
            Some("/system/bin"),
            Some("--nice-name=sui"),
            Some("rikka.sui.server.Starter"),
            Some("--files-path=/data/adb/sui"),
            None,
        ]
    );
}

#[test]
fn test_prepare_waits_for_zygote_to_boot() {
    let proc = early_boot();
    let mut source = Booting::new(&proc, 5);
    let params = LaunchParameters::new("/data/adb/sui/sui.dex", "/data/adb/sui");

    let argv = prepare(&params, &fast_config(), &mut source).unwrap();

    assert_eq!(source.scans, 6);
    let args = argv.to_strings();
    assert_eq!(args[0], "/system/bin/app_process");
    assert_eq!(args.iter().any(|arg| arg == "--debug"), DEBUGGABLE);
    if DEBUGGABLE {
        assert!(args.contains(&"-XjdwpProvider:adbconnection".to_string()));
    } else {
        assert_eq!(args.len(), 7);
    }
}

#[test]
fn test_wrong_word_size_zygote_is_not_the_target() {
    let proc = early_boot();
    let other = if TARGET_NAME == "zygote64" { "zygote" } else { "zygote64" };
    proc.spawn(700, &[other, "--zygote"]);

    let config = StarterConfig {
        max_attempts: Some(3),
        ..fast_config()
    };
    let params = LaunchParameters::new("/data/adb/sui/sui.dex", "/data/adb/sui");
    let mut scanner = ProcScanner::with_root(proc.root()).excluding(NOT_A_FAKE_PID);

    let err = prepare(&params, &config, &mut scanner).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<StarterError>(),
        Some(StarterError::TargetNotFound { attempts: 3, .. })
    ));
}

#[test]
fn test_config_file_in_data_dir_bounds_the_wait() {
    let data_dir = tempfile::tempdir().unwrap();
    std::fs::write(
        data_dir.path().join("starter.toml"),
        "poll_interval_ms = 1\nmax_attempts = 2\n",
    )
    .unwrap();
    let config = StarterConfig::load_with_env(data_dir.path(), Some(Default::default())).unwrap();

    let proc = early_boot();
    let params = LaunchParameters::new(data_dir.path().join("sui.dex"), data_dir.path());
    let mut source = Booting::new(&proc, usize::MAX);

    assert!(prepare(&params, &config, &mut source).is_err());
    assert_eq!(source.scans, 2);
}
