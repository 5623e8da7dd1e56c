//! Ordered aggregate of leveled errors.
//!
//! `ErrorCollection` keeps insertion order and caches the highest severity it
//! has seen so callers can decide to continue, log or exit without walking the
//! list. `stack` puts the other collection's errors in front (they become the
//! oldest); `append` puts them at the back.

use crate::config::config;
use crate::errors::{LogError, LogResult};
use crate::exit_hook::{terminate, FATAL_EXIT_CODE};
use crate::leveled_error::LeveledError;
use crate::log_sink::{write_line, write_line_to, write_lines};
use crate::severity::Severity;
use serde::Serialize;
use std::fmt;
use std::io::Write;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorCollection {
    errors: Vec<LeveledError>,
    level: Severity,
}

impl ErrorCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn errors(&self) -> &[LeveledError] {
        &self.errors
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LeveledError> {
        self.errors.iter()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Cached highest severity, or whatever `set_level` last forced.
    pub fn level(&self) -> Severity {
        self.level
    }

    /// Append `err`, raising the level if needed. Errors with no severity or
    /// an empty message are ignored; returns whether `err` was kept.
    pub fn add(&mut self, err: LeveledError) -> bool {
        if err.severity.is_unset() || err.message.is_empty() {
            tracing::debug!(severity = %err.severity, "ignoring degenerate error");
            return false;
        }
        if err.severity > self.level {
            self.level = err.severity;
        }
        self.errors.push(err);
        true
    }

    /// Construct a `LeveledError` and add it in one step.
    pub fn new_error(
        &mut self,
        severity: Severity,
        message: impl Into<String>,
        pairs: &[&dyn fmt::Display],
    ) -> bool {
        self.add(LeveledError::new(severity, message, pairs))
    }

    /// Remove the first error equal to `err` and resync the level.
    pub fn remove(&mut self, err: &LeveledError) -> bool {
        match self.errors.iter().position(|e| e.equal(err)) {
            Some(index) => {
                self.errors.remove(index);
                self.update_level();
                true
            }
            None => false,
        }
    }

    /// Recompute the level from the errors held, discarding any override.
    pub fn update_level(&mut self) -> Severity {
        self.level = self
            .errors
            .iter()
            .map(|e| e.severity)
            .max()
            .unwrap_or_default();
        self.level
    }

    /// Number of errors held and whether there are any.
    pub fn check(&self) -> (usize, bool) {
        let count = self.errors.len();
        (count, count > 0)
    }

    /// Oldest error, or the "no error found" sentinel.
    pub fn first(&self) -> LeveledError {
        self.errors
            .first()
            .cloned()
            .unwrap_or_else(LeveledError::no_error_found)
    }

    /// Newest error, or the "no error found" sentinel.
    pub fn last(&self) -> LeveledError {
        self.errors
            .last()
            .cloned()
            .unwrap_or_else(LeveledError::no_error_found)
    }

    pub fn is_error(&self) -> bool {
        self.level.is_error()
    }

    pub fn is_fatal(&self) -> bool {
        self.level.is_fatal()
    }

    /// Force the level. Later adds only ever raise it.
    pub fn set_level(&mut self, level: Severity) {
        self.level = level;
    }

    pub fn clear(&mut self) {
        self.errors.clear();
        self.level = Severity::Unset;
    }

    /// Put `other`'s errors in front of ours.
    pub fn stack(&mut self, other: &ErrorCollection) {
        self.merge(other, true);
    }

    /// Put `other`'s errors after ours.
    pub fn append(&mut self, other: &ErrorCollection) {
        self.merge(other, false);
    }

    fn merge(&mut self, other: &ErrorCollection, in_front: bool) {
        let level = self.level.max(other.level);
        if self.errors.is_empty() {
            self.errors = other.errors.clone();
        } else if in_front {
            self.errors.splice(0..0, other.errors.iter().cloned());
        } else {
            self.errors.extend(other.errors.iter().cloned());
        }
        self.level = level;
    }

    /// Errors in order, optionally dropping those below the minimum level.
    pub fn to_filtered_array(&self, enforce_minimum: bool) -> Vec<&LeveledError> {
        let minimum = config().minimum_level;
        self.errors
            .iter()
            .filter(|e| !enforce_minimum || e.severity >= minimum)
            .collect()
    }

    /// Every error rendered as JSON.
    pub fn to_array(&self) -> Vec<String> {
        self.to_filtered_array(false)
            .into_iter()
            .map(LeveledError::render)
            .collect()
    }

    /// Errors at or above the minimum level rendered as JSON.
    pub fn to_log_array(&self) -> Vec<String> {
        self.to_filtered_array(true)
            .into_iter()
            .map(LeveledError::render)
            .collect()
    }

    /// JSON array of the log array's strings.
    pub fn marshal(&self) -> String {
        serde_json::to_string(&self.to_log_array()).unwrap_or_default()
    }

    /// `{"errors":[...],"level":...}` over every error held.
    pub fn try_render(&self) -> LogResult<String> {
        #[derive(Serialize)]
        struct Rendered<'a> {
            errors: Vec<crate::leveled_error::Rendered<'a>>,
            #[serde(skip_serializing_if = "Option::is_none")]
            level: Option<Severity>,
        }

        let cfg = config();
        let rendered = Rendered {
            errors: self.errors.iter().map(|e| e.rendered(&cfg)).collect(),
            level: (!self.level.is_unset()).then_some(self.level),
        };
        serde_json::to_string(&rendered)
            .map_err(|e| LogError::serialization("rendering error collection", e))
    }

    pub fn render(&self) -> String {
        self.try_render().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "error collection could not be rendered");
            String::new()
        })
    }

    /// Write the log array to the process-wide sink, one line per error.
    pub fn log(&self) -> LogResult<()> {
        if self.is_empty() {
            return Ok(());
        }
        let lines = self.to_log_array();
        write_lines(lines.iter().map(String::as_str))
    }

    pub fn log_to(&self, sink: &mut dyn Write) -> LogResult<()> {
        if self.is_empty() {
            return Ok(());
        }
        for line in self.to_log_array() {
            write_line_to(sink, &line)?;
        }
        Ok(())
    }

    /// Write `prefix` followed by the log array and terminate, even when empty.
    pub fn fatal(&self, prefix: &str) -> LogResult<()> {
        let written = write_line(&self.fatal_text(prefix));
        terminate(FATAL_EXIT_CODE);
        written
    }

    pub fn fatal_to(&self, sink: &mut dyn Write, prefix: &str) -> LogResult<()> {
        let written = write_line_to(sink, &self.fatal_text(prefix));
        terminate(FATAL_EXIT_CODE);
        written
    }

    fn fatal_text(&self, prefix: &str) -> String {
        format!("{prefix}{}", self.to_log_array().join("\n"))
    }
}

impl fmt::Display for ErrorCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.marshal())
    }
}

impl std::error::Error for ErrorCollection {}

impl<'a> IntoIterator for &'a ErrorCollection {
    type Item = &'a LeveledError;
    type IntoIter = std::slice::Iter<'a, LeveledError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}

impl Extend<LeveledError> for ErrorCollection {
    fn extend<I: IntoIterator<Item = LeveledError>>(&mut self, iter: I) {
        for err in iter {
            self.add(err);
        }
    }
}

impl FromIterator<LeveledError> for ErrorCollection {
    fn from_iter<I: IntoIterator<Item = LeveledError>>(iter: I) -> Self {
        let mut collection = ErrorCollection::new();
        collection.extend(iter);
        collection
    }
}
