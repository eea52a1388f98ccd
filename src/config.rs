use std::num::NonZeroU32;
use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, ConfigError, Environment, File, Map};
use serde::Deserialize;

use crate::error::StarterError;
use crate::platform::ApiLevel;
use crate::process::TargetDetector;

/// Name of the optional override file inside the data directory.
pub const CONFIG_FILE_NAME: &str = "starter.toml";

/// Prefix for environment overrides, e.g. `SUI_STARTER_MAX_ATTEMPTS=120`.
pub const ENV_PREFIX: &str = "SUI_STARTER";

/// Launcher tuning.
///
/// None of these settings change the `app_process` command line; they only
/// affect how the launcher waits for zygote and which JDWP options a
/// debuggable build picks.
///
/// ```toml
/// # <data dir>/starter.toml
/// poll_interval_ms = 500
/// max_attempts = 600      # give up after ~5 minutes
/// api_level = 30          # skip querying ro.build.version.sdk
/// ```
///
/// Sources, later ones overriding earlier ones:
/// 1. Default values
/// 2. `<data dir>/starter.toml`, if present
/// 3. Environment variables (`SUI_STARTER_*`)
///
/// The launcher itself uses [`load_or_default`](Self::load_or_default): a
/// broken override never stops zygote from getting its server.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StarterConfig {
    /// Sleep between process table scans.
    pub poll_interval_ms: u64,

    /// Stop waiting for zygote after this many scans. Unset waits forever.
    #[serde(default)]
    pub max_attempts: Option<u32>,

    /// Platform version to assume instead of asking the system.
    #[serde(default)]
    pub api_level: Option<u32>,
}

impl Default for StarterConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1000,
            max_attempts: None,
            api_level: None,
        }
    }
}

impl StarterConfig {
    /// Load configuration for the given data directory from the file and the
    /// process environment.
    pub fn load(data_dir: &Path) -> Result<Self, StarterError> {
        Self::load_with_env(data_dir, None)
    }

    /// Like [`load`](Self::load), reading environment overrides from `env`
    /// instead of the process environment when given.
    pub fn load_with_env(
        data_dir: &Path,
        env: Option<Map<String, String>>,
    ) -> Result<Self, StarterError> {
        let path = config_path(data_dir);
        let file = path.exists().then_some(path);

        let config = build(file.as_deref(), env).map_err(|err| StarterError::Config {
            path: file.clone(),
            message: err.to_string(),
        })?;
        config.validate().map_err(|message| StarterError::Config {
            path: file,
            message,
        })?;
        Ok(config)
    }

    /// Load configuration, warning and using the defaults if any source is
    /// unusable.
    pub fn load_or_default(data_dir: &Path) -> Self {
        Self::or_default(Self::load(data_dir))
    }

    /// Like [`load_or_default`](Self::load_or_default), reading environment
    /// overrides from `env` when given.
    pub fn load_with_env_or_default(data_dir: &Path, env: Option<Map<String, String>>) -> Self {
        Self::or_default(Self::load_with_env(data_dir, env))
    }

    fn or_default(loaded: Result<Self, StarterError>) -> Self {
        loaded.unwrap_or_else(|err| {
            log::warn!("{err}, using defaults");
            Self::default()
        })
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn api_level_override(&self) -> Option<ApiLevel> {
        self.api_level.map(ApiLevel::new)
    }

    /// A detector using this configuration's polling policy.
    pub fn detector(&self) -> TargetDetector {
        TargetDetector::new()
            .poll_interval(self.poll_interval())
            .max_attempts(self.max_attempts.and_then(NonZeroU32::new))
    }

    fn validate(&self) -> Result<(), String> {
        if self.poll_interval_ms == 0 {
            return Err("poll_interval_ms must be positive".to_string());
        }
        if self.max_attempts == Some(0) {
            return Err("max_attempts must be positive when set".to_string());
        }
        Ok(())
    }
}

pub fn config_path(data_dir: &Path) -> PathBuf {
    data_dir.join(CONFIG_FILE_NAME)
}

fn build(
    file: Option<&Path>,
    env: Option<Map<String, String>>,
) -> Result<StarterConfig, ConfigError> {
    let defaults = StarterConfig::default();

    let mut builder = Config::builder()
        .set_default("poll_interval_ms", defaults.poll_interval_ms)?;

    if let Some(file) = file {
        builder = builder.add_source(File::from(file));
    }

    // `__` as the nesting separator keeps single underscores inside key names
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
            .source(env),
    );

    builder.build()?.try_deserialize()
}
