use std::ffi::OsStr;
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};

use nix::unistd::Pid;

use super::{ProcessHandle, ProcessSource};

pub const PROC_ROOT: &str = "/proc";

/// Bytes of `cmdline` read per candidate. Long enough for any process name we match.
pub const CMDLINE_READ_LIMIT: usize = 64;

/// Enumerates processes by listing a procfs root.
///
/// Entries that are not numeric, or whose metadata cannot be read, never abort
/// the scan. Iteration order is whatever `read_dir` yields.
#[derive(Debug, Clone)]
pub struct ProcScanner {
    root: PathBuf,
    exclude: Option<Pid>,
}

impl ProcScanner {
    pub fn new() -> Self {
        Self::with_root(PROC_ROOT)
    }

    /// Scan an alternative procfs-shaped directory.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            exclude: None,
        }
    }

    /// Treat `pid` as the scanner's own process.
    ///
    /// By default the current pid is looked up at each scan, so a scanner built
    /// before `fork`/`daemon` still skips the process that ends up running it.
    pub fn excluding(mut self, pid: Pid) -> Self {
        self.exclude = Some(pid);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Default for ProcScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessSource for ProcScanner {
    fn scan(&mut self, predicate: &mut dyn FnMut(&ProcessHandle) -> bool) -> Option<ProcessHandle> {
        let own_pid = self.exclude.unwrap_or_else(Pid::this);

        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(err) => {
                log::debug!("Cannot list {}: {}", self.root.display(), err);
                return None;
            }
        };

        for entry in entries {
            let Ok(entry) = entry else {
                continue;
            };
            let Some(pid) = parse_pid(&entry.file_name()) else {
                continue;
            };
            if pid == own_pid {
                continue;
            }

            let handle = ProcessHandle::new(pid, read_command_name(&entry.path().join("cmdline")));
            if predicate(&handle) {
                return Some(handle);
            }
        }

        None
    }
}

fn parse_pid(name: &OsStr) -> Option<Pid> {
    let pid: i32 = name.to_str()?.parse().ok()?;
    (pid > 0).then(|| Pid::from_raw(pid))
}

/// Read the leading command-line segment, closing the file before returning.
///
/// A failed or empty read yields an empty name rather than an error.
fn read_command_name(path: &Path) -> String {
    let mut buf = [0u8; CMDLINE_READ_LIMIT];
    let read = match File::open(path).and_then(|mut file| file.read(&mut buf)) {
        Ok(read) => read,
        Err(err) => {
            log::debug!("Skipping unreadable {}: {}", path.display(), err);
            return String::new();
        }
    };

    let bytes = &buf[..read];
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}
