//! Library root for the `leveled_errors` crate
//!
//! Leveled, metadata-bearing errors, collections that track the highest
//! severity seen, and the process-wide settings deciding what gets recorded
//! and where log output goes.

// Core error handling
pub mod errors;

// Error vocabulary
pub mod error_collection;
pub mod leveled_error;
pub mod severity;

// Configuration
pub mod config;

// Output & termination
pub mod exit_hook;
pub mod log_sink;

// Caller traces
pub mod trace;

pub use config::{config, reset_config, set_config, LoggingConfig};
pub use error_collection::ErrorCollection;
pub use errors::{LogError, LogResult};
pub use exit_hook::{reset_exit_hook, set_exit_hook};
pub use leveled_error::{LeveledError, CALLER_KEY, NO_ERROR_FOUND_MESSAGE};
pub use log_sink::set_log_output;
pub use severity::Severity;
pub use trace::{reset_trace_capture, set_trace_capture, TraceCapture};
