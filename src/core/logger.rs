//! Main logger implementation

use super::{
    entry_builder::EntryBuilder,
    error::{LoggerError, Result},
    fallback::{self, FallbackSink},
    log_context::{LogContext, MetadataMerge},
    log_entry::{ErrorInfo, LogEntry},
    log_level::LogLevel,
    metrics::LoggerMetrics,
    redactor::Redactor,
    timer::LogTimer,
    transport::Transport,
};
use std::collections::BTreeSet;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// State shared by a root logger and every logger derived from it
struct Shared {
    transports: Vec<Arc<dyn Transport>>,
    redactor: Redactor,
    metadata_merge: MetadataMerge,
    metrics: LoggerMetrics,
    fallback: FallbackSink,
    closed: AtomicBool,
}

/// Structured logger: level gate, context merge, correlation id, redaction and
/// fan-out to every configured transport.
///
/// Configuration is fixed at construction. Loggers derived with
/// [`with_context`](Self::with_context) share the transports of their root;
/// only the root closes them, either through [`shutdown`](Self::shutdown) or
/// when it is dropped.
pub struct StructuredLogger {
    min_level: LogLevel,
    base_context: LogContext,
    shared: Arc<Shared>,
    is_root: bool,
}

impl StructuredLogger {
    /// Create a builder for StructuredLogger
    ///
    /// # Example
    /// ```
    /// use rust_structured_logger::prelude::*;
    ///
    /// let logger = StructuredLogger::builder()
    ///     .min_level(LogLevel::Debug)
    ///     .environment("staging")
    ///     .build();
    /// assert!(logger.is_level_enabled(LogLevel::Debug));
    /// ```
    #[must_use]
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::new()
    }

    pub fn min_level(&self) -> LogLevel {
        self.min_level
    }

    #[inline]
    pub fn is_level_enabled(&self, level: LogLevel) -> bool {
        level >= self.min_level
    }

    pub fn base_context(&self) -> &LogContext {
        &self.base_context
    }

    pub fn is_root(&self) -> bool {
        self.is_root
    }

    pub fn transport_count(&self) -> usize {
        self.shared.transports.len()
    }

    /// Get the metrics shared across this logger's family
    pub fn metrics(&self) -> &LoggerMetrics {
        &self.shared.metrics
    }

    /// Derive a logger whose base context is this logger's context merged
    /// with `context`. The derived logger shares transports and level.
    #[must_use]
    pub fn with_context(&self, context: LogContext) -> StructuredLogger {
        StructuredLogger {
            min_level: self.min_level,
            base_context: self.base_context.merge(&context, self.shared.metadata_merge),
            shared: Arc::clone(&self.shared),
            is_root: false,
        }
    }

    /// Start a scoped timer for `operation`; emits a DEBUG "started" entry
    pub fn create_timer(&self, operation: impl Into<String>) -> LogTimer<'_> {
        LogTimer::start(self, operation.into())
    }

    /// Start a fluent entry at `level`
    pub fn entry(&self, level: LogLevel, message: impl Into<String>) -> EntryBuilder<'_> {
        EntryBuilder::new(self, level, message.into())
    }

    pub fn log(&self, level: LogLevel, message: impl Into<String>) {
        self.log_with_context(level, message, LogContext::default());
    }

    pub fn log_with_context(&self, level: LogLevel, message: impl Into<String>, context: LogContext) {
        if !self.is_level_enabled(level) {
            self.shared.metrics.record_suppressed();
            return;
        }
        self.dispatch(level, message.into(), &context, None, None, BTreeSet::new());
    }

    /// Full emission path shared by the plain methods, timers and builders.
    /// The level gate has already been passed or is re-checked here.
    pub(crate) fn dispatch(
        &self,
        level: LogLevel,
        message: String,
        context: &LogContext,
        error: Option<ErrorInfo>,
        duration: Option<f64>,
        tags: BTreeSet<String>,
    ) {
        if !self.is_level_enabled(level) {
            self.shared.metrics.record_suppressed();
            return;
        }

        let mut merged = self.base_context.merge(context, self.shared.metadata_merge);
        if merged.correlation_id.is_none() {
            merged.correlation_id = Some(uuid::Uuid::new_v4().to_string());
        }

        let mut raw = LogEntry::new(level, message).with_context(merged);
        raw.error = error;
        raw.duration = duration;
        raw.tags = tags;

        let entry = self.shared.redactor.sanitize(&raw);
        self.fan_out(&entry);
    }

    /// Deliver to every transport in registration order.
    ///
    /// **Per-transport isolation**: an error or a panic in one transport is
    /// reported to the fallback sink and the loop moves on.
    fn fan_out(&self, entry: &LogEntry) {
        let metrics = &self.shared.metrics;
        metrics.record_emitted();

        for transport in &self.shared.transports {
            let result = catch_unwind(AssertUnwindSafe(|| transport.log(entry)));

            match result {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    metrics.record_transport_failure();
                    self.shared.fallback.report(
                        transport.name(),
                        &e,
                        std::slice::from_ref(entry),
                    );
                }
                Err(panic_info) => {
                    metrics.record_transport_panic();
                    let reason = format!("panicked: {}", fallback::panic_message(panic_info.as_ref()));
                    self.shared.fallback.report(
                        transport.name(),
                        &reason,
                        std::slice::from_ref(entry),
                    );
                }
            }
        }
    }

    #[inline]
    pub fn trace(&self, message: impl Into<String>) {
        self.log(LogLevel::Trace, message);
    }

    #[inline]
    pub fn debug(&self, message: impl Into<String>) {
        self.log(LogLevel::Debug, message);
    }

    #[inline]
    pub fn info(&self, message: impl Into<String>) {
        self.log(LogLevel::Info, message);
    }

    #[inline]
    pub fn warn(&self, message: impl Into<String>) {
        self.log(LogLevel::Warn, message);
    }

    #[inline]
    pub fn error(&self, message: impl Into<String>) {
        self.log(LogLevel::Error, message);
    }

    #[inline]
    pub fn fatal(&self, message: impl Into<String>) {
        self.log(LogLevel::Fatal, message);
    }

    /// Log an error value at ERROR level, capturing its name, message and
    /// source chain
    pub fn error_with_source<E>(&self, message: impl Into<String>, error: &E, context: LogContext)
    where
        E: std::error::Error + ?Sized,
    {
        if !self.is_level_enabled(LogLevel::Error) {
            self.shared.metrics.record_suppressed();
            return;
        }
        self.dispatch(
            LogLevel::Error,
            message.into(),
            &context,
            Some(ErrorInfo::from_error(error)),
            None,
            BTreeSet::new(),
        );
    }

    /// Flush every transport, continuing past failures. Returns the first error.
    pub fn flush(&self) -> Result<()> {
        let mut first_error = None;
        for transport in &self.shared.transports {
            if let Err(e) = transport.flush() {
                eprintln!("[LOGGER ERROR] Transport '{}' flush failed: {}", transport.name(), e);
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Flush and close every shared transport.
    ///
    /// Only the root logger may do this; a second call is a no-op.
    pub fn shutdown(&self) -> Result<()> {
        if !self.is_root {
            return Err(LoggerError::DerivedLoggerShutdown);
        }
        if self.shared.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        let mut first_error = None;
        for transport in &self.shared.transports {
            if let Err(e) = transport.close() {
                eprintln!("[LOGGER ERROR] Transport '{}' close failed: {}", transport.name(), e);
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

impl Drop for StructuredLogger {
    fn drop(&mut self) {
        if !self.is_root {
            return;
        }
        if let Err(e) = self.shutdown() {
            eprintln!("[LOGGER ERROR] Failed to close transports during shutdown: {}", e);
        }

        let failures = self.shared.metrics.transport_failures() + self.shared.metrics.transport_panics();
        if failures > 0 {
            eprintln!(
                "[LOGGER WARNING] Logger shutting down after {} failed deliveries (failure rate: {:.2}%)",
                failures,
                self.shared.metrics.failure_rate(self.shared.transports.len())
            );
        }
    }
}

/// Builder for constructing a root StructuredLogger with a fluent API
///
/// # Example
/// ```
/// use rust_structured_logger::prelude::*;
///
/// let logger = StructuredLogger::builder()
///     .min_level(LogLevel::Debug)
///     .transport(ConsoleTransport::new())
///     .version("1.4.0")
///     .build();
/// ```
pub struct LoggerBuilder {
    min_level: LogLevel,
    transports: Vec<Arc<dyn Transport>>,
    context: LogContext,
    redactor: Redactor,
    metadata_merge: MetadataMerge,
    fallback: FallbackSink,
}

impl LoggerBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self {
            min_level: LogLevel::Info,
            transports: Vec::new(),
            context: LogContext::default(),
            redactor: Redactor::default(),
            metadata_merge: MetadataMerge::default(),
            fallback: FallbackSink::stderr(),
        }
    }

    /// Set minimum log level
    #[must_use = "builder methods return a new value"]
    pub fn min_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    /// Add a transport; transports receive entries in the order added
    #[must_use = "builder methods return a new value"]
    pub fn transport<T: Transport + 'static>(mut self, transport: T) -> Self {
        self.transports.push(Arc::new(transport));
        self
    }

    /// Add a transport the caller keeps a handle to
    #[must_use = "builder methods return a new value"]
    pub fn shared_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transports.push(transport);
        self
    }

    /// Set the base context merged into every entry
    #[must_use = "builder methods return a new value"]
    pub fn context(mut self, context: LogContext) -> Self {
        self.context = context;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn environment(mut self, environment: impl Into<String>) -> Self {
        self.context.environment = Some(environment.into());
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.context.version = Some(version.into());
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn redactor(mut self, redactor: Redactor) -> Self {
        self.redactor = redactor;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn metadata_merge(mut self, policy: MetadataMerge) -> Self {
        self.metadata_merge = policy;
        self
    }

    /// Where failed deliveries are reported; stderr by default
    #[must_use = "builder methods return a new value"]
    pub fn fallback(mut self, sink: FallbackSink) -> Self {
        self.fallback = sink;
        self
    }

    /// Build the root logger
    pub fn build(self) -> StructuredLogger {
        StructuredLogger {
            min_level: self.min_level,
            base_context: self.context,
            shared: Arc::new(Shared {
                transports: self.transports,
                redactor: self.redactor,
                metadata_merge: self.metadata_merge,
                metrics: LoggerMetrics::new(),
                fallback: self.fallback,
                closed: AtomicBool::new(false),
            }),
            is_root: true,
        }
    }
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
