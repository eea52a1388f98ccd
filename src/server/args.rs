use std::ffi::{CStr, CString, OsStr};
use std::os::unix::ffi::OsStrExt;

use super::{APP_PROCESS, APP_PROCESS_DIR, LaunchParameters};
use crate::error::StarterError;
use crate::platform::ApiLevel;

/// Whether this build passes JDWP options to the server.
pub const DEBUGGABLE: bool = cfg!(feature = "debuggable");

/// Owned, NULL-terminated argument list for `execvp`.
///
/// The trailing `None` slot is present from construction on; [`push`](Self::push)
/// always inserts in front of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentVector {
    slots: Vec<Option<CString>>,
}

impl ArgumentVector {
    pub fn new() -> Self {
        Self { slots: vec![None] }
    }

    /// Append a copy of `arg`.
    ///
    /// Fails if `arg` contains a NUL byte, since exec would silently truncate it.
    pub fn push(&mut self, arg: impl Into<Vec<u8>>) -> Result<(), StarterError> {
        let arg = CString::new(arg).map_err(|err| StarterError::InvalidArgument {
            argument: String::from_utf8_lossy(&err.into_vec()).into_owned(),
        })?;
        let terminator = self.slots.len() - 1;
        self.slots.insert(terminator, Some(arg));
        Ok(())
    }

    /// Append `prefix` immediately followed by the raw bytes of `value`.
    pub fn push_with_prefix(&mut self, prefix: &str, value: &OsStr) -> Result<(), StarterError> {
        let mut arg = Vec::with_capacity(prefix.len() + value.len());
        arg.extend_from_slice(prefix.as_bytes());
        arg.extend_from_slice(value.as_bytes());
        self.push(arg)
    }

    /// Every slot, the trailing `None` included.
    pub fn as_slice(&self) -> &[Option<CString>] {
        &self.slots
    }

    /// The arguments without the terminator.
    pub fn args(&self) -> impl Iterator<Item = &CStr> {
        self.slots.iter().flatten().map(CString::as_c_str)
    }

    /// `argv[0]`, which is also the program `execvp` looks up.
    pub fn program(&self) -> Option<&CStr> {
        self.args().next()
    }

    pub fn len(&self) -> usize {
        self.slots.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Lossy rendering for logs.
    pub fn to_strings(&self) -> Vec<String> {
        self.args()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect()
    }
}

impl Default for ArgumentVector {
    fn default() -> Self {
        Self::new()
    }
}

/// JDWP setup supported by the running Android release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum ApiBracket {
    /// Android 11+: jdwp through the adbconnection plugin.
    AdbConnection,
    /// Android 9 and 10: ART's internal jdwp provider.
    Internal,
    /// Older releases: the jdwp agent library.
    Legacy,
}

impl ApiBracket {
    pub fn for_level(level: ApiLevel) -> Self {
        match level.get() {
            30.. => Self::AdbConnection,
            28..=29 => Self::Internal,
            _ => Self::Legacy,
        }
    }

    pub fn vm_options(self) -> &'static [&'static str] {
        match self {
            Self::AdbConnection => &[
                "-Xcompiler-option",
                "--debuggable",
                "-XjdwpProvider:adbconnection",
                "-XjdwpOptions:suspend=n,server=y",
            ],
            Self::Internal => &[
                "-Xcompiler-option",
                "--debuggable",
                "-XjdwpProvider:internal",
                "-XjdwpOptions:transport=dt_android_adb,suspend=n,server=y",
            ],
            Self::Legacy => &[
                "-Xcompiler-option",
                "--debuggable",
                "-agentlib:jdwp=transport=dt_android_adb,suspend=n,server=y",
            ],
        }
    }
}

/// Builds the `app_process` command line for the server.
#[derive(Debug, Clone)]
pub struct ArgumentBuilder<'a> {
    params: &'a LaunchParameters,
    debuggable: bool,
    api_level: ApiLevel,
}

impl<'a> ArgumentBuilder<'a> {
    pub fn new(params: &'a LaunchParameters) -> Self {
        Self {
            params,
            debuggable: DEBUGGABLE,
            api_level: ApiLevel::UNKNOWN,
        }
    }

    pub fn debuggable(mut self, debuggable: bool) -> Self {
        self.debuggable = debuggable;
        self
    }

    /// Only consulted when debuggable.
    pub fn api_level(mut self, api_level: ApiLevel) -> Self {
        self.api_level = api_level;
        self
    }

    pub fn build(&self) -> Result<ArgumentVector, StarterError> {
        let params = self.params;
        let data_dir = params.data_dir().as_os_str();

        let mut argv = ArgumentVector::new();
        argv.push(APP_PROCESS)?;
        argv.push_with_prefix("-Djava.class.path=", params.payload().as_os_str())?;
        argv.push_with_prefix("-Djava.library.path=", data_dir)?;
        if self.debuggable {
            let bracket = ApiBracket::for_level(self.api_level);
            log::debug!(
                "debuggable build, api {} uses {bracket} jdwp",
                self.api_level
            );
            for option in bracket.vm_options() {
                argv.push(*option)?;
            }
        }
        argv.push(APP_PROCESS_DIR)?;
        argv.push(format!("--nice-name={}", params.process_name()))?;
        argv.push(params.main_class())?;
        if self.debuggable {
            argv.push("--debug")?;
        }
        argv.push_with_prefix("--files-path=", data_dir)?;
        Ok(argv)
    }
}
