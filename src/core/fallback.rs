//! Last-resort output for entries a transport could not deliver
//!
//! Reports go to process stderr unless a [`FallbackSink`] is given another
//! writer. Write errors are swallowed: there is nowhere further to fall back to.

use super::log_entry::LogEntry;
use parking_lot::Mutex;
use std::fmt::{self, Display};
use std::io::Write;
use std::sync::Arc;

/// Destination for failure reports
///
/// Each report is one warning line, `Logging transport failed: <transport>: <reason>`,
/// followed by one JSON line per affected entry.
#[derive(Clone, Default)]
pub struct FallbackSink {
    writer: Option<Arc<Mutex<Box<dyn Write + Send>>>>,
}

impl FallbackSink {
    /// Reports go to stderr
    pub fn stderr() -> Self {
        Self::default()
    }

    /// Reports go to `writer`
    pub fn with_writer<W: Write + Send + 'static>(writer: W) -> Self {
        Self {
            writer: Some(Arc::new(Mutex::new(Box::new(writer)))),
        }
    }

    /// Report a failure together with the entries it concerned
    pub fn report(&self, transport: &str, reason: &dyn Display, entries: &[LogEntry]) {
        let lines: Vec<String> = entries
            .iter()
            .map(|entry| {
                entry
                    .to_json()
                    .unwrap_or_else(|_| format!("[{}] {}", entry.level, entry.message))
            })
            .collect();
        self.report_lines(transport, reason, &lines);
    }

    /// Report a failure together with already serialized entry lines
    pub fn report_lines(&self, transport: &str, reason: &dyn Display, lines: &[String]) {
        match self.writer {
            Some(ref writer) => write_report(&mut *writer.lock(), transport, reason, lines),
            None => write_report(&mut std::io::stderr().lock(), transport, reason, lines),
        }
    }
}

impl fmt::Debug for FallbackSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let target = if self.writer.is_some() { "writer" } else { "stderr" };
        f.debug_struct("FallbackSink").field("target", &target).finish()
    }
}

fn write_report<W: Write + ?Sized>(out: &mut W, transport: &str, reason: &dyn Display, lines: &[String]) {
    let _ = writeln!(out, "Logging transport failed: {}: {}", transport, reason);
    for line in lines {
        let _ = writeln!(out, "{}", line);
    }
    let _ = out.flush();
}

/// Extract a readable message from a caught panic payload
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

/// In-memory writer for asserting on fallback output in tests
#[cfg(test)]
#[derive(Clone, Default)]
pub(crate) struct CapturedOutput(Arc<Mutex<Vec<u8>>>);

#[cfg(test)]
impl CapturedOutput {
    pub(crate) fn sink(&self) -> FallbackSink {
        FallbackSink::with_writer(self.clone())
    }

    pub(crate) fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }
}

#[cfg(test)]
impl Write for CapturedOutput {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
