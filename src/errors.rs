//! Error handling for the leveled error library itself
//!
//! `LeveledError` and `ErrorCollection` are the vocabulary handed to callers.
//! `LogError` only covers the few ways the library can fail internally:
//! encoding, writing to a sink, and loading configuration.

use std::sync::{Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use thiserror::Error;

/// Internal failure raised while rendering, writing or configuring
#[derive(Error, Debug)]
pub enum LogError {
    #[error("Serialization failed: {context}")]
    Serialization {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("I/O operation failed: {operation}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Configuration load failed: {0}")]
    Figment(#[from] Box<figment::Error>),
}

/// Type alias for Result with LogError
pub type LogResult<T> = Result<T, LogError>;

impl LogError {
    /// Create a serialization error
    pub fn serialization(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Serialization {
            context: context.into(),
            source,
        }
    }

    /// Create an I/O error
    pub fn io(operation: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            source,
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for LogError {
    fn from(err: serde_json::Error) -> Self {
        LogError::serialization("json_operation", err)
    }
}

impl From<std::io::Error> for LogError {
    fn from(err: std::io::Error) -> Self {
        LogError::io("io_operation", err)
    }
}

impl From<figment::Error> for LogError {
    fn from(err: figment::Error) -> Self {
        LogError::Figment(Box::new(err))
    }
}

/// Lock access for process-wide state.
///
/// A poisoned lock still holds a complete value (every writer replaces it
/// wholesale), so the guard is recovered rather than turned into a panic.
pub trait RecoverLock<T: ?Sized> {
    fn recover_lock(&self) -> MutexGuard<'_, T>;
}

impl<T: ?Sized> RecoverLock<T> for Mutex<T> {
    fn recover_lock(&self) -> MutexGuard<'_, T> {
        self.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Read side of a recovered `RwLock`
pub trait RecoverReadLock<T: ?Sized> {
    fn recover_read(&self) -> RwLockReadGuard<'_, T>;
}

impl<T: ?Sized> RecoverReadLock<T> for RwLock<T> {
    fn recover_read(&self) -> RwLockReadGuard<'_, T> {
        self.read().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Write side of a recovered `RwLock`
pub trait RecoverWriteLock<T: ?Sized> {
    fn recover_write(&self) -> RwLockWriteGuard<'_, T>;
}

impl<T: ?Sized> RecoverWriteLock<T> for RwLock<T> {
    fn recover_write(&self) -> RwLockWriteGuard<'_, T> {
        self.write().unwrap_or_else(PoisonError::into_inner)
    }
}
