//! Android platform version lookup.

use std::fmt;
use std::fs;
use std::path::Path;
use std::process::{Command, Stdio};

/// System property holding the SDK level.
pub const SDK_PROPERTY: &str = "ro.build.version.sdk";

const BUILD_PROP: &str = "/system/build.prop";

/// Android SDK level (`Build.VERSION.SDK_INT`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct ApiLevel(u32);

impl ApiLevel {
    /// Used when the level cannot be determined; selects the oldest behaviour.
    pub const UNKNOWN: ApiLevel = ApiLevel(0);

    pub const fn new(level: u32) -> Self {
        Self(level)
    }

    pub const fn get(self) -> u32 {
        self.0
    }

    /// Ask the running system for its SDK level.
    ///
    /// Tries `getprop` first, then `/system/build.prop`. Falls back to
    /// [`ApiLevel::UNKNOWN`] when neither answers.
    pub fn query() -> Self {
        if let Some(level) = from_getprop() {
            return level;
        }
        if let Some(level) = from_build_prop(Path::new(BUILD_PROP)) {
            return level;
        }
        log::warn!("Cannot read {SDK_PROPERTY}, assuming legacy platform");
        Self::UNKNOWN
    }

    fn parse(value: &str) -> Option<Self> {
        value.trim().parse().ok().map(Self)
    }
}

impl fmt::Display for ApiLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

fn from_getprop() -> Option<ApiLevel> {
    let output = Command::new("getprop")
        .arg(SDK_PROPERTY)
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output();
    let output = match output {
        Ok(output) if output.status.success() => output,
        Ok(output) => {
            log::debug!("getprop exited with {}", output.status);
            return None;
        }
        Err(err) => {
            log::debug!("getprop unavailable: {}", err);
            return None;
        }
    };
    ApiLevel::parse(&String::from_utf8_lossy(&output.stdout))
}

fn from_build_prop(path: &Path) -> Option<ApiLevel> {
    match fs::read_to_string(path) {
        Ok(contents) => parse_build_prop(&contents),
        Err(err) => {
            log::debug!("Cannot read {}: {}", path.display(), err);
            None
        }
    }
}

/// Find the SDK level in `build.prop` syntax (`key=value`, `#` comments).
///
/// When the key repeats, the last assignment wins, as with property loading.
pub fn parse_build_prop(contents: &str) -> Option<ApiLevel> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .filter(|(key, _)| key.trim() == SDK_PROPERTY)
        .filter_map(|(_, value)| ApiLevel::parse(value))
        .last()
}
