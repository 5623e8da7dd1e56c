// config.rs
// Process-wide logging configuration: what gets recorded and what gets logged

use crate::errors::{LogError, LogResult, RecoverReadLock, RecoverWriteLock};
use crate::severity::Severity;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::RwLock;

/// Environment prefix consulted by [`LoggingConfig::load`].
pub const ENV_PREFIX: &str = "LEVELED_";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Include the severity in rendered output
    pub record_level: bool,
    /// Stamp new errors with the current time
    pub record_time: bool,
    /// Lowest severity that log/fatal output includes
    pub minimum_level: Severity,
    /// Store a caller trace under the `caller` metadata key
    pub record_caller: bool,
    /// Frames to step back before the first frame of the caller trace
    pub caller_skip_frames: usize,
    /// Number of frames shown in the caller trace
    pub caller_frames_to_show: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            record_level: true,
            record_time: true,
            minimum_level: Severity::Info,
            record_caller: false,
            caller_skip_frames: 2,
            caller_frames_to_show: 2,
        }
    }
}

impl LoggingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unset minimum level means INFO.
    pub fn normalized(mut self) -> Self {
        if self.minimum_level.is_unset() {
            self.minimum_level = Severity::Info;
        }
        self
    }

    /// Layer defaults, an optional TOML file and `LEVELED_*` env vars.
    pub fn load(path: Option<&Path>) -> LogResult<Self> {
        let mut figment = Figment::from(Serialized::defaults(LoggingConfig::default()));
        if let Some(path) = path {
            figment = figment.merge(Toml::file(path));
        }
        figment = figment.merge(Env::prefixed(ENV_PREFIX));

        let config: LoggingConfig = figment.extract()?;
        if config.record_caller && config.caller_frames_to_show == 0 {
            return Err(LogError::config(
                "caller_frames_to_show must be at least 1 when record_caller is set",
            ));
        }

        Ok(config.normalized())
    }
}

lazy_static! {
    static ref CONFIG: RwLock<LoggingConfig> = RwLock::new(LoggingConfig::default());
}

/// Snapshot of the current process-wide configuration.
pub fn config() -> LoggingConfig {
    *CONFIG.recover_read()
}

/// Replace the process-wide configuration wholesale.
pub fn set_config(new_config: LoggingConfig) {
    let new_config = new_config.normalized();
    *CONFIG.recover_write() = new_config;
    tracing::debug!(?new_config, "logging config replaced");
}

pub fn reset_config() {
    set_config(LoggingConfig::default());
}
