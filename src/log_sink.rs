// log_sink.rs
// Destination for rendered error lines; standard error unless replaced

use crate::errors::{LogError, LogResult, RecoverLock};
use lazy_static::lazy_static;
use std::io::{self, Write};
use std::sync::Mutex;

lazy_static! {
    static ref SINK: Mutex<Box<dyn Write + Send>> = Mutex::new(Box::new(io::stderr()));
}

/// Set where `log`/`fatal` output goes. `None` restores standard error.
pub fn set_log_output(writer: Option<Box<dyn Write + Send>>) {
    let mut sink = SINK.recover_lock();
    match writer {
        Some(w) => {
            *sink = w;
            tracing::debug!("log output replaced");
        }
        None => {
            *sink = Box::new(io::stderr());
            tracing::debug!("log output reset to stderr");
        }
    }
}

/// Write one line (newline appended) to `sink` and flush it.
pub fn write_line_to(sink: &mut dyn Write, line: &str) -> LogResult<()> {
    sink.write_all(line.as_bytes())
        .and_then(|_| sink.write_all(b"\n"))
        .and_then(|_| sink.flush())
        .map_err(|e| LogError::io("writing log line", e))
}

/// Write one line to the process-wide sink.
pub fn write_line(line: &str) -> LogResult<()> {
    let mut sink = SINK.recover_lock();
    write_line_to(&mut **sink, line)
}

/// Write several lines under a single lock so they are not interleaved.
pub fn write_lines<'a, I>(lines: I) -> LogResult<()>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut sink = SINK.recover_lock();
    for line in lines {
        write_line_to(&mut **sink, line)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    struct Broken;

    impl Write for Broken {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn write_line_appends_newline() {
        let mut buf: Vec<u8> = Vec::new();
        write_line_to(&mut buf, "{\"message\":\"x\"}").unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "{\"message\":\"x\"}\n");
    }

    #[test]
    fn write_failures_are_reported() {
        let result = write_line_to(&mut Broken, "lost");
        assert!(matches!(result, Err(LogError::Io { .. })));
    }

    #[test]
    #[serial]
    fn global_sink_can_be_replaced_and_reset() {
        let captured = Captured::default();
        set_log_output(Some(Box::new(captured.clone())));

        write_lines(["a", "b"]).unwrap();
        write_line("c").unwrap();
        assert_eq!(
            String::from_utf8(captured.0.lock().unwrap().clone()).unwrap(),
            "a\nb\nc\n"
        );

        set_log_output(None);
        write_line("to stderr").unwrap();
        assert_eq!(captured.0.lock().unwrap().len(), 6);
    }
}
