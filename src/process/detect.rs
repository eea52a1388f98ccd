use std::num::NonZeroU32;
use std::thread;
use std::time::Duration;

use nix::unistd::Pid;

use super::{ProcessHandle, ProcessSource};
use crate::error::StarterError;

/// Name of the zygote matching this build's word size.
#[cfg(target_pointer_width = "64")]
pub const TARGET_NAME: &str = "zygote64";
#[cfg(not(target_pointer_width = "64"))]
pub const TARGET_NAME: &str = "zygote";

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Polls a [`ProcessSource`] until zygote shows up.
///
/// Without an attempt bound the loop never gives up: zygote may take
/// arbitrarily long to start on a slow boot.
#[derive(Debug, Clone)]
pub struct TargetDetector {
    interval: Duration,
    max_attempts: Option<NonZeroU32>,
}

impl TargetDetector {
    pub fn new() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_attempts: None,
        }
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Give up after `attempts` scans. `None` polls forever.
    pub fn max_attempts(mut self, attempts: Option<NonZeroU32>) -> Self {
        self.max_attempts = attempts;
        self
    }

    pub fn name(&self) -> &'static str {
        TARGET_NAME
    }

    /// Exact comparison against the leading `cmdline` segment.
    ///
    /// `zygote` must not match `zygote64` (and vice versa), and an empty name
    /// from unreadable metadata never matches.
    pub fn matches(&self, handle: &ProcessHandle) -> bool {
        handle.command() == TARGET_NAME
    }

    /// Block until the target is observed and return its pid.
    pub fn wait_for<S: ProcessSource + ?Sized>(&self, source: &mut S) -> Result<Pid, StarterError> {
        let mut attempts: u32 = 0;
        loop {
            attempts = attempts.saturating_add(1);

            if let Some(found) = source.scan(&mut |handle| self.matches(handle)) {
                log::info!("found zygote {}", found.pid());
                return Ok(found.pid());
            }

            if let Some(limit) = self.max_attempts
                && attempts >= limit.get()
            {
                return Err(StarterError::TargetNotFound {
                    name: TARGET_NAME.to_string(),
                    attempts,
                });
            }

            log::trace!(
                "{} not started, wait {}ms...",
                TARGET_NAME,
                self.interval.as_millis()
            );
            thread::sleep(self.interval);
        }
    }
}

impl Default for TargetDetector {
    fn default() -> Self {
        Self::new()
    }
}
