//! Process table access.
//!
//! This module provides:
//! - [`ProcessHandle`], a pid plus the command name read from its metadata
//! - [`ProcessSource`], the seam the detector polls (real `/proc` or a test double)
//! - [`ProcScanner`], the `/proc` implementation
//! - [`TargetDetector`], the zygote polling loop

mod detect;
mod scan;

use nix::unistd::Pid;

pub use detect::{TARGET_NAME, TargetDetector};
pub use scan::{CMDLINE_READ_LIMIT, PROC_ROOT, ProcScanner};

/// A live process observed during one scan.
///
/// Handles are built fresh for every candidate and are not meant to be kept
/// across scans: the pid may be reused once the process exits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessHandle {
    pid: Pid,
    command: String,
}

impl ProcessHandle {
    pub fn new(pid: Pid, command: impl Into<String>) -> Self {
        Self {
            pid,
            command: command.into(),
        }
    }

    pub fn pid(&self) -> Pid {
        self.pid
    }

    /// First NUL-delimited segment of the process's command line.
    ///
    /// Empty when the metadata could not be read (kernel threads, processes
    /// that exited mid-scan, permission failures).
    pub fn command(&self) -> &str {
        &self.command
    }
}

/// Something that can enumerate processes for a predicate.
///
/// `scan` hands each candidate to `predicate` and stops at the first one for
/// which it returns `true`, returning that candidate. Implementations never
/// pass the caller's own process to the predicate.
pub trait ProcessSource {
    fn scan(&mut self, predicate: &mut dyn FnMut(&ProcessHandle) -> bool) -> Option<ProcessHandle>;
}
