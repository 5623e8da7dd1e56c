//! A single leveled error event.
//!
//! A `LeveledError` carries a severity, a message, an optional timestamp and a
//! flat string-to-string metadata map. What gets stamped at construction
//! (time, caller trace) and what gets rendered (severity) follows the
//! process-wide [`LoggingConfig`](crate::config::LoggingConfig).

use crate::config::{config, LoggingConfig};
use crate::errors::{LogError, LogResult};
use crate::exit_hook::{terminate, FATAL_EXIT_CODE};
use crate::log_sink::{write_line, write_line_to};
use crate::severity::Severity;
use crate::trace::capture_caller;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::io::Write;

/// Metadata key holding the caller trace.
pub const CALLER_KEY: &str = "caller";

/// Message of the sentinel returned when a collection has nothing to give.
pub const NO_ERROR_FOUND_MESSAGE: &str = "no error found";

/// Build a [`LeveledError`] from a level, a message and flat key/value pairs.
///
/// Any `Display` value works as a key or value:
///
/// ```
/// use leveled_errors::{leveled, Severity};
///
/// let err = leveled!(Severity::Error, "boom", "user", 42, "retry", true);
/// assert_eq!(err.metadata["user"], "42");
/// assert_eq!(err.metadata["retry"], "true");
/// ```
#[macro_export]
macro_rules! leveled {
    ($level:expr, $msg:expr $(, $arg:expr)* $(,)?) => {
        $crate::LeveledError::new(
            $level,
            $msg,
            &[$(&$arg as &dyn ::std::fmt::Display),*],
        )
    };
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LeveledError {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<DateTime<Utc>>,
    #[serde(rename = "level", default, skip_serializing_if = "Severity::is_unset")]
    pub severity: Severity,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

/// Borrowed view of an error as it is written out
#[derive(Serialize)]
pub(crate) struct Rendered<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    time: Option<&'a DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    level: Option<Severity>,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    metadata: Option<&'a BTreeMap<String, String>>,
}

impl LeveledError {
    /// Create a new error, stamping time and caller per the current config.
    ///
    /// `pairs` is a flat `[key, value, key, value, ...]` list; see
    /// [`add_metadata`](Self::add_metadata).
    #[inline(never)]
    pub fn new(severity: Severity, message: impl Into<String>, pairs: &[&dyn fmt::Display]) -> Self {
        let cfg = config();
        let mut err = LeveledError {
            time: None,
            severity,
            message: message.into(),
            metadata: BTreeMap::new(),
        };

        if cfg.record_time {
            err.time = Some(Utc::now());
        }

        if cfg.record_caller {
            let trace = capture_caller(cfg.caller_skip_frames, cfg.caller_frames_to_show);
            err.metadata.insert(CALLER_KEY.to_string(), trace);
        }

        err.add_metadata(pairs);
        err
    }

    /// The value handed out by an empty collection's `first`/`last`.
    pub fn no_error_found() -> Self {
        LeveledError {
            message: NO_ERROR_FOUND_MESSAGE.to_string(),
            ..Default::default()
        }
    }

    /// Fold flat key/value pairs into the metadata. Existing keys are
    /// overwritten; a trailing key without a value is dropped.
    pub fn add_metadata(&mut self, pairs: &[&dyn fmt::Display]) {
        for pair in pairs.chunks_exact(2) {
            self.metadata.insert(pair[0].to_string(), pair[1].to_string());
        }
    }

    pub fn with_metadata(mut self, key: impl fmt::Display, value: impl fmt::Display) -> Self {
        self.metadata.insert(key.to_string(), value.to_string());
        self
    }

    /// Compare severity, message and metadata. Time is ignored.
    pub fn equal(&self, other: &LeveledError) -> bool {
        self.severity == other.severity
            && self.message == other.message
            && self.metadata == other.metadata
    }

    pub fn is_error(&self) -> bool {
        self.severity.is_error()
    }

    pub fn is_fatal(&self) -> bool {
        self.severity.is_fatal()
    }

    pub(crate) fn rendered<'a>(&'a self, cfg: &LoggingConfig) -> Rendered<'a> {
        Rendered {
            time: self.time.as_ref(),
            level: (cfg.record_level && !self.severity.is_unset()).then_some(self.severity),
            message: &self.message,
            metadata: (!self.metadata.is_empty()).then_some(&self.metadata),
        }
    }

    /// JSON rendering, surfacing encode failures.
    pub fn try_render(&self) -> LogResult<String> {
        serde_json::to_string(&self.rendered(&config()))
            .map_err(|e| LogError::serialization("rendering leveled error", e))
    }

    /// JSON rendering; an encode failure yields an empty string.
    pub fn render(&self) -> String {
        self.try_render().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "leveled error could not be rendered");
            String::new()
        })
    }

    /// Whether the current config lets this error through to the log.
    pub fn meets_minimum(&self) -> bool {
        self.severity >= config().minimum_level
    }

    /// Write to the process-wide sink if at or above the minimum level.
    pub fn log(&self) -> LogResult<()> {
        if self.meets_minimum() {
            write_line(&self.render())?;
        }
        Ok(())
    }

    pub fn log_to(&self, sink: &mut dyn Write) -> LogResult<()> {
        if self.meets_minimum() {
            write_line_to(sink, &self.render())?;
        }
        Ok(())
    }

    /// Escalate to FATAL, write, and terminate. Errors without a message are
    /// left untouched.
    pub fn fatal(&mut self) -> LogResult<()> {
        if self.message.is_empty() {
            return Ok(());
        }
        self.severity = Severity::Fatal;
        let written = write_line(&self.render());
        terminate(FATAL_EXIT_CODE);
        written
    }

    pub fn fatal_to(&mut self, sink: &mut dyn Write) -> LogResult<()> {
        if self.message.is_empty() {
            return Ok(());
        }
        self.severity = Severity::Fatal;
        let written = write_line_to(sink, &self.render());
        terminate(FATAL_EXIT_CODE);
        written
    }

    /// Emit as a `tracing` event, subject to the minimum level.
    pub fn emit(&self) {
        let Some(level) = self.severity.to_tracing_level() else {
            return;
        };
        if !self.meets_minimum() {
            return;
        }
        let message = self.message.as_str();
        let metadata = &self.metadata;
        if level == tracing::Level::ERROR {
            tracing::error!(severity = %self.severity, ?metadata, "{message}");
        } else if level == tracing::Level::WARN {
            tracing::warn!(?metadata, "{message}");
        } else if level == tracing::Level::INFO {
            tracing::info!(?metadata, "{message}");
        } else {
            tracing::debug!(?metadata, "{message}");
        }
    }
}

impl PartialEq for LeveledError {
    fn eq(&self, other: &Self) -> bool {
        self.equal(other)
    }
}

impl Eq for LeveledError {}

impl fmt::Display for LeveledError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl std::error::Error for LeveledError {}
