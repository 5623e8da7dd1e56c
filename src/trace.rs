//! Caller traces for newly constructed errors.
//!
//! A trace is a short `function{line}->function{line}` string naming the code
//! that built the error. Resolution is best-effort: a frame without symbol or
//! line information renders as a blank segment, never as a failure.

use crate::errors::{RecoverReadLock, RecoverWriteLock};
use lazy_static::lazy_static;
use std::backtrace::Backtrace;
use std::sync::{Arc, RwLock};

/// Produces a caller trace `count` frames long, starting `skip` frames above
/// the capture point.
pub trait TraceCapture: Send + Sync {
    fn capture(&self, skip: usize, count: usize) -> String;
}

impl<F> TraceCapture for F
where
    F: Fn(usize, usize) -> String + Send + Sync,
{
    fn capture(&self, skip: usize, count: usize) -> String {
        self(skip, count)
    }
}

/// One resolved stack frame
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frame {
    pub function: String,
    pub line: Option<u32>,
}

impl Frame {
    fn render(&self) -> String {
        if self.function.is_empty() {
            return String::new();
        }
        format!("{}{{{}}}", self.function, self.line.unwrap_or(0))
    }
}

/// Default capturer backed by `std::backtrace`.
///
/// Frame 0 is [`capture_caller`]; frames belonging to the backtrace machinery
/// and to the capturer itself are dropped before `skip` is applied.
#[derive(Debug, Default, Clone, Copy)]
pub struct BacktraceCapture;

impl TraceCapture for BacktraceCapture {
    fn capture(&self, skip: usize, count: usize) -> String {
        let rendered = Backtrace::force_capture().to_string();
        let frames: Vec<Frame> = parse_frames(&rendered)
            .into_iter()
            .filter(|f| !is_machinery(&f.function))
            .collect();
        format_trace(&frames, skip, count)
    }
}

fn is_machinery(function: &str) -> bool {
    function.starts_with("std::backtrace")
        || function.starts_with("backtrace::")
        || function.contains("as leveled_errors::trace::TraceCapture>")
        || function.starts_with("leveled_errors::trace::BacktraceCapture")
        || function.starts_with("leveled_errors::error_collection::ErrorCollection::new_error")
}

/// Parse the `Display` form of a `std::backtrace::Backtrace`.
///
/// Frame headers look like `  3: crate::module::function` and are optionally
/// followed by `at path/to/file.rs:42:5`.
pub fn parse_frames(rendered: &str) -> Vec<Frame> {
    let mut frames: Vec<Frame> = Vec::new();

    for line in rendered.lines() {
        let trimmed = line.trim();
        if let Some(location) = trimmed.strip_prefix("at ") {
            if let Some(frame) = frames.last_mut() {
                if frame.line.is_none() {
                    frame.line = parse_line_number(location);
                }
            }
            continue;
        }

        let Some((index, symbol)) = trimmed.split_once(": ") else {
            continue;
        };
        if index.is_empty() || !index.bytes().all(|b| b.is_ascii_digit()) {
            continue;
        }
        frames.push(Frame {
            function: strip_hash(symbol.trim()).to_string(),
            line: None,
        });
    }

    frames
}

fn parse_line_number(location: &str) -> Option<u32> {
    // path:line:column, where the path itself may contain ':'
    let mut parts = location.rsplitn(3, ':');
    let _column = parts.next()?;
    parts.next()?.parse().ok()
}

fn strip_hash(symbol: &str) -> &str {
    match symbol.rsplit_once("::h") {
        Some((head, hash)) if hash.len() == 16 && hash.bytes().all(|b| b.is_ascii_hexdigit()) => head,
        _ => symbol,
    }
}

/// Upper bound on segments in a single trace.
pub const MAX_TRACE_FRAMES: usize = 64;

/// Select `count` frames from `skip` and join them oldest first.
pub fn format_trace(frames: &[Frame], skip: usize, count: usize) -> String {
    let count = count.min(MAX_TRACE_FRAMES);
    let mut segments: Vec<String> = frames
        .iter()
        .skip(skip)
        .take(count)
        .map(Frame::render)
        .collect();
    segments.resize(count, String::new());
    segments.reverse();
    segments.join("->")
}

lazy_static! {
    static ref CAPTURER: RwLock<Arc<dyn TraceCapture>> = RwLock::new(Arc::new(BacktraceCapture));
}

/// Install a replacement capturer (typically a fixed string in tests).
pub fn set_trace_capture(capturer: impl TraceCapture + 'static) {
    *CAPTURER.recover_write() = Arc::new(capturer);
    tracing::debug!("trace capturer replaced");
}

pub fn reset_trace_capture() {
    *CAPTURER.recover_write() = Arc::new(BacktraceCapture);
}

/// Capture the trace of whoever called the error constructor.
#[inline(never)]
pub fn capture_caller(skip: usize, count: usize) -> String {
    let capturer = Arc::clone(&CAPTURER.recover_read());
    capturer.capture(skip, count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const SAMPLE: &str = "   0: std::backtrace_rs::backtrace::libunwind::trace
             at /rustc/abc/library/std/src/../../backtrace/src/backtrace/libunwind.rs:116:5
   1: std::backtrace::Backtrace::create
             at /rustc/abc/library/std/src/backtrace.rs:331:13
   2: leveled_errors::trace::capture_caller::h0123456789abcdef
             at ./src/trace.rs:140:5
   3: leveled_errors::leveled_error::LeveledError::new
             at ./src/leveled_error.rs:60:28
   4: app::handlers::load_user
             at ./src/handlers.rs:17:9
   5: app::main
   6: core::ops::function::FnOnce::call_once
             at C:\\rust\\library\\core\\src\\ops\\function.rs:250:5";

    #[test]
    fn parses_symbols_and_lines() {
        let frames = parse_frames(SAMPLE);
        assert_eq!(frames.len(), 7);
        assert_eq!(frames[2].function, "leveled_errors::trace::capture_caller");
        assert_eq!(frames[4].line, Some(17));
        assert_eq!(frames[5].line, None);
        assert_eq!(frames[6].line, Some(250));
    }

    #[test]
    fn formats_oldest_first() {
        let frames: Vec<Frame> = parse_frames(SAMPLE)
            .into_iter()
            .filter(|f| !is_machinery(&f.function))
            .collect();

        let trace = format_trace(&frames, 2, 2);
        assert_eq!(trace, "app::main{0}->app::handlers::load_user{17}");
    }

    #[test]
    fn missing_frames_are_blank() {
        let frames = vec![Frame {
            function: "only::frame".to_string(),
            line: Some(3),
        }];
        assert_eq!(format_trace(&frames, 0, 3), "->->only::frame{3}");
        assert_eq!(format_trace(&[], 2, 2), "->");
        assert_eq!(format_trace(&frames, 0, 0), "");
    }

    #[test]
    fn oversized_skip_and_count_stay_bounded() {
        let frames = parse_frames(SAMPLE);
        assert_eq!(format_trace(&frames, usize::MAX, 2), "->");

        let trace = format_trace(&frames, 0, usize::MAX);
        assert_eq!(trace.split("->").count(), MAX_TRACE_FRAMES);
    }

    #[test]
    fn collection_constructor_frame_is_skipped() {
        let sample = "   0: leveled_errors::trace::capture_caller
   1: leveled_errors::leveled_error::LeveledError::new
   2: leveled_errors::error_collection::ErrorCollection::new_error::h0123456789abcdef
             at ./src/error_collection.rs:71:9
   3: app::handlers::load_user
             at ./src/handlers.rs:17:9
   4: app::main";
        let frames: Vec<Frame> = parse_frames(sample)
            .into_iter()
            .filter(|f| !is_machinery(&f.function))
            .collect();

        assert_eq!(format_trace(&frames, 2, 2), "app::main{0}->app::handlers::load_user{17}");
    }

    #[test]
    #[serial]
    fn replacement_capturer_is_used() {
        set_trace_capture(|skip: usize, count: usize| format!("stub{{{skip}:{count}}}"));
        assert_eq!(capture_caller(2, 3), "stub{2:3}");
        reset_trace_capture();
    }

    #[test]
    #[serial]
    fn real_capture_never_fails() {
        reset_trace_capture();
        let trace = capture_caller(0, 2);
        assert!(trace.contains("->"));
    }
}
