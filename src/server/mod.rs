//! The Sui server invocation.
//!
//! This module provides:
//! - [`LaunchParameters`], the fixed identity of the server plus the two install paths
//! - [`ArgumentBuilder`] and [`ArgumentVector`], the `app_process` command line
//! - [`replace_image`], the final `execvp`

mod args;
mod exec;

use std::path::{Path, PathBuf};

pub use args::{ApiBracket, ArgumentBuilder, ArgumentVector, DEBUGGABLE};
pub use exec::{exec_vector, replace_image};

/// Android's Java process launcher.
pub const APP_PROCESS: &str = "/system/bin/app_process";
/// Parent directory argument `app_process` expects before the class name.
pub const APP_PROCESS_DIR: &str = "/system/bin";
/// Display name of the server process (`--nice-name`).
pub const SERVER_NAME: &str = "sui";
/// Entry point class inside the payload dex.
pub const SERVER_CLASS: &str = "rikka.sui.server.Starter";
/// Environment variable carrying the payload to the new image.
pub const CLASSPATH_ENV: &str = "CLASSPATH";

/// What to launch and where its files live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchParameters {
    payload: PathBuf,
    data_dir: PathBuf,
    main_class: &'static str,
    process_name: &'static str,
}

impl LaunchParameters {
    /// `payload` is the server dex; `data_dir` is the writable directory that
    /// doubles as the native library path.
    pub fn new(payload: impl Into<PathBuf>, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            payload: payload.into(),
            data_dir: data_dir.into(),
            main_class: SERVER_CLASS,
            process_name: SERVER_NAME,
        }
    }

    pub fn payload(&self) -> &Path {
        &self.payload
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn main_class(&self) -> &'static str {
        self.main_class
    }

    pub fn process_name(&self) -> &'static str {
        self.process_name
    }
}
