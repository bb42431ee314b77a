//! Console transport implementation

use crate::core::{LogEntry, LogLevel, OutputFormat, Result, Transport};
use parking_lot::Mutex;
use std::io::Write;

enum Target {
    /// stdout, with ERROR and FATAL routed to stderr
    Std,
    Writer(Mutex<Box<dyn Write + Send>>),
}

/// Writes each entry synchronously as one JSON line or one pretty line.
/// Never buffers.
pub struct ConsoleTransport {
    output_format: OutputFormat,
    use_colors: bool,
    target: Target,
}

impl ConsoleTransport {
    pub fn new() -> Self {
        Self {
            output_format: OutputFormat::default(),
            use_colors: false,
            target: Target::Std,
        }
    }

    /// Human-readable output with colored levels
    pub fn pretty() -> Self {
        Self::new().with_output_format(OutputFormat::Pretty).with_colors(true)
    }

    /// Send output to `writer` instead of stdout/stderr
    ///
    /// # Example
    ///
    /// ```
    /// use rust_structured_logger::transports::ConsoleTransport;
    ///
    /// let transport = ConsoleTransport::with_writer(std::io::sink());
    /// ```
    pub fn with_writer<W: Write + Send + 'static>(writer: W) -> Self {
        Self {
            target: Target::Writer(Mutex::new(Box::new(writer))),
            ..Self::new()
        }
    }

    #[must_use]
    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = format;
        self
    }

    /// Colors apply to the pretty format only
    #[must_use]
    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }

    pub fn output_format(&self) -> OutputFormat {
        self.output_format
    }
}

impl Default for ConsoleTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for ConsoleTransport {
    fn log(&self, entry: &LogEntry) -> Result<()> {
        let output = self.output_format.format(entry, self.use_colors);

        match &self.target {
            Target::Std => match entry.level {
                LogLevel::Error | LogLevel::Fatal => {
                    writeln!(std::io::stderr().lock(), "{}", output)?;
                }
                _ => {
                    writeln!(std::io::stdout().lock(), "{}", output)?;
                }
            },
            Target::Writer(writer) => {
                writeln!(writer.lock(), "{}", output)?;
            }
        }
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        match &self.target {
            Target::Std => {
                std::io::stdout().flush()?;
                std::io::stderr().flush()?;
            }
            Target::Writer(writer) => writer.lock().flush()?,
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "console"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::LogContext;
    use std::sync::Arc;

    /// Writer handing its bytes to a shared buffer
    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuf {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().clone()).unwrap()
        }
    }

    #[test]
    fn test_json_lines() {
        let buf = SharedBuf::default();
        let transport = ConsoleTransport::with_writer(buf.clone());

        transport.log(&LogEntry::new(LogLevel::Info, "one")).unwrap();
        transport.log(&LogEntry::new(LogLevel::Error, "two")).unwrap();

        let text = buf.text();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        let second: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second["message"], "two");
    }

    #[test]
    fn test_pretty_without_colors() {
        let buf = SharedBuf::default();
        let transport = ConsoleTransport::with_writer(buf.clone())
            .with_output_format(OutputFormat::Pretty);

        let entry = LogEntry::new(LogLevel::Warn, "disk almost full")
            .with_context(LogContext::new().with_component("storage"));
        transport.log(&entry).unwrap();

        assert!(buf.text().contains("[WARN] [storage] disk almost full"));
    }

    #[test]
    fn test_std_target_does_not_fail() {
        let transport = ConsoleTransport::pretty();
        assert_eq!(transport.output_format(), OutputFormat::Pretty);
        assert!(transport.log(&LogEntry::new(LogLevel::Info, "to stdout")).is_ok());
        assert!(transport.flush().is_ok());
    }
}
