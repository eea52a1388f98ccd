//! Starter error types and formatting
//!
//! - **`StarterError`** - A typed enum for the launcher's fatal conditions. It can be
//!   pattern-matched and tested. Use `.into()` to convert to `anyhow::Error` while
//!   preserving the type for downcasting in `main`.
//!
//! Every variant is fatal: the launcher has no caller once it has forked, so errors
//! only ever surface as a log line plus exit status 1.

use std::path::PathBuf;

use nix::errno::Errno;

/// Fatal launcher conditions.
///
/// ```ignore
/// return Err(StarterError::NotPrivileged { uid: 2000 }.into());
///
/// if let Some(StarterError::ExecFailed { errno, .. }) = err.downcast_ref() {
///     log::error!("exec failed with {errno}");
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StarterError {
    NotPrivileged {
        uid: u32,
    },
    ForkFailed {
        errno: Errno,
    },
    DaemonizeFailed {
        errno: Errno,
    },
    /// An argument or environment value could not be passed to exec.
    InvalidArgument {
        argument: String,
    },
    ExecFailed {
        program: String,
        errno: Errno,
    },
    /// The configured attempt bound ran out before the target appeared.
    TargetNotFound {
        name: String,
        attempts: u32,
    },
    Config {
        path: Option<PathBuf>,
        message: String,
    },
}

impl std::error::Error for StarterError {}

impl std::fmt::Display for StarterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StarterError::NotPrivileged { uid } => {
                write!(f, "run Sui from uid={uid}, must be started as root")
            }
            StarterError::ForkFailed { errno } => write!(f, "fork: {}", describe(*errno)),
            StarterError::DaemonizeFailed { errno } => {
                write!(f, "daemon: {}", describe(*errno))
            }
            StarterError::InvalidArgument { argument } => {
                write!(f, "argument contains a NUL byte: {argument:?}")
            }
            StarterError::ExecFailed { program, errno } => {
                write!(f, "execvp {program}: {}", describe(*errno))
            }
            StarterError::TargetNotFound { name, attempts } => {
                write!(f, "{name} not found after {attempts} scans, giving up")
            }
            StarterError::Config { path, message } => match path {
                Some(path) => write!(f, "invalid config {}: {message}", path.display()),
                None => write!(f, "invalid config: {message}"),
            },
        }
    }
}

/// Format an errno the way `perror` would, keeping the symbolic name for grepping.
fn describe(errno: Errno) -> String {
    format!("{} ({errno:?})", errno.desc())
}
