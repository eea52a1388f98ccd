//! Background detachment.

use nix::unistd::daemon;

use crate::error::StarterError;

/// Detach from the controlling terminal and continue in the background.
///
/// Follows `daemon(3)`: the caller forks once more, the intermediate process
/// exits, and the survivor becomes a session leader reparented to init. The
/// working directory and the standard descriptors are left untouched so log
/// output keeps flowing wherever the launcher's stderr went.
pub fn detach() -> Result<(), StarterError> {
    daemon(true, true).map_err(|errno| StarterError::DaemonizeFailed { errno })
}
