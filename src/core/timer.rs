//! Scoped operation timer

use super::log_context::LogContext;
use super::log_level::LogLevel;
use super::logger::StructuredLogger;
use std::collections::BTreeSet;
use std::time::{Duration, Instant};

/// Times one named operation against the logger that created it.
///
/// Creation emits a DEBUG `Started operation: <operation>` entry. Every later
/// call measures from the same start instant and attaches `operation` to the
/// context and the elapsed milliseconds as the entry's `duration`. The timer
/// is not single-use: `end` may be called more than once and each call emits
/// its own completion entry.
///
/// # Example
///
/// ```
/// use rust_structured_logger::prelude::*;
///
/// let logger = StructuredLogger::builder().build();
/// let timer = logger.create_timer("load_profile");
/// // ... do the work ...
/// timer.end();
/// ```
pub struct LogTimer<'a> {
    logger: &'a StructuredLogger,
    operation: String,
    start: Instant,
}

impl<'a> LogTimer<'a> {
    pub(crate) fn start(logger: &'a StructuredLogger, operation: String) -> Self {
        let timer = Self {
            logger,
            operation,
            start: Instant::now(),
        };
        timer.logger.dispatch(
            LogLevel::Debug,
            format!("Started operation: {}", timer.operation),
            &LogContext::new().with_operation(timer.operation.clone()),
            None,
            None,
            BTreeSet::new(),
        );
        timer
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn info(&self, message: impl Into<String>, context: LogContext) {
        self.emit(LogLevel::Info, message.into(), context);
    }

    pub fn warn(&self, message: impl Into<String>, context: LogContext) {
        self.emit(LogLevel::Warn, message.into(), context);
    }

    pub fn error(&self, message: impl Into<String>, context: LogContext) {
        self.emit(LogLevel::Error, message.into(), context);
    }

    /// Emit `Completed operation: <operation>` at INFO with `completed: true`
    pub fn end(&self) {
        self.end_with(format!("Completed operation: {}", self.operation), LogContext::new());
    }

    pub fn end_with(&self, message: impl Into<String>, context: LogContext) {
        self.emit(
            LogLevel::Info,
            message.into(),
            context.with_metadata("completed", true),
        );
    }

    fn emit(&self, level: LogLevel, message: String, context: LogContext) {
        let duration_ms = self.start.elapsed().as_secs_f64() * 1000.0;
        let context = context.with_operation(self.operation.clone());
        self.logger
            .dispatch(level, message, &context, None, Some(duration_ms), BTreeSet::new());
    }
}

#[cfg(test)]
mod tests {
    use crate::core::{LogEntry, LogLevel, Result, StructuredLogger, Transport};
    use crate::core::log_context::LogContext;
    use parking_lot::Mutex;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    #[derive(Default)]
    struct SpyTransport {
        entries: Mutex<Vec<LogEntry>>,
    }

    impl Transport for SpyTransport {
        fn log(&self, entry: &LogEntry) -> Result<()> {
            self.entries.lock().push(entry.clone());
            Ok(())
        }

        fn name(&self) -> &str {
            "spy"
        }
    }

    fn logger(level: LogLevel) -> (StructuredLogger, Arc<SpyTransport>) {
        let spy = Arc::new(SpyTransport::default());
        let logger = StructuredLogger::builder()
            .min_level(level)
            .shared_transport(spy.clone())
            .build();
        (logger, spy)
    }

    #[test]
    fn test_timer_emits_started_entry() {
        let (logger, spy) = logger(LogLevel::Debug);
        let timer = logger.create_timer("import");

        let entries = spy.entries.lock();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].level, LogLevel::Debug);
        assert_eq!(entries[0].message, "Started operation: import");
        assert_eq!(entries[0].context.operation.as_deref(), Some("import"));
        assert_eq!(timer.operation(), "import");
    }

    #[test]
    fn test_started_entry_respects_level_gate() {
        let (logger, spy) = logger(LogLevel::Info);
        let timer = logger.create_timer("import");
        assert_eq!(spy.entries.lock().len(), 0);

        timer.end();
        assert_eq!(spy.entries.lock().len(), 1);
    }

    #[test]
    fn test_durations_non_decreasing() {
        let (logger, spy) = logger(LogLevel::Debug);
        let timer = logger.create_timer("sync");

        timer.info("step one", LogContext::new());
        std::thread::sleep(Duration::from_millis(5));
        timer.warn("step two", LogContext::new());
        std::thread::sleep(Duration::from_millis(5));
        timer.end();

        let durations: Vec<f64> = spy
            .entries
            .lock()
            .iter()
            .filter_map(|e| e.duration)
            .collect();
        assert_eq!(durations.len(), 3);
        assert!(durations.windows(2).all(|w| w[0] <= w[1]));
        assert!(durations[0] >= 0.0);
        assert!(durations[2] >= 10.0);
    }

    #[test]
    fn test_end_marks_completed() {
        let (logger, spy) = logger(LogLevel::Info);
        let timer = logger.create_timer("checkout");
        timer.end();

        let entry = spy.entries.lock()[0].clone();
        assert_eq!(entry.level, LogLevel::Info);
        assert_eq!(entry.message, "Completed operation: checkout");
        assert_eq!(entry.context.operation.as_deref(), Some("checkout"));
        assert_eq!(entry.context.metadata.unwrap()["completed"], json!(true));
    }

    #[test]
    fn test_end_may_repeat() {
        let (logger, spy) = logger(LogLevel::Info);
        let timer = logger.create_timer("retry");
        timer.end();
        timer.end_with("done again", LogContext::new().with_metadata("attempt", 2));

        let entries = spy.entries.lock();
        assert_eq!(entries.len(), 2);
        assert!(entries[1].duration >= entries[0].duration);
        let metadata = entries[1].context.metadata.clone().unwrap();
        assert_eq!(metadata["attempt"], json!(2));
        assert_eq!(metadata["completed"], json!(true));
    }

    #[test]
    fn test_timer_error_level() {
        let (logger, spy) = logger(LogLevel::Info);
        let timer = logger.create_timer("upload");
        timer.error("upload failed", LogContext::new().with_component("storage"));

        let entry = spy.entries.lock()[0].clone();
        assert_eq!(entry.level, LogLevel::Error);
        assert_eq!(entry.context.component.as_deref(), Some("storage"));
        assert!(entry.duration.is_some());
    }
}
