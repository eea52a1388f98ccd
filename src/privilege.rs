//! Caller identity check.

use nix::unistd::Uid;

use crate::error::StarterError;

/// Require the real uid to be root.
///
/// This is the only authorization the launcher performs; it must run before
/// anything forks or touches `/proc`.
pub fn ensure_privileged(uid: Uid) -> Result<(), StarterError> {
    if uid.is_root() {
        Ok(())
    } else {
        Err(StarterError::NotPrivileged { uid: uid.as_raw() })
    }
}
