//! Fluent construction of a single log entry
//!
//! Use it when an entry needs more than a message and a context: an error,
//! a measured duration, or tags.

use super::log_context::LogContext;
use super::log_entry::ErrorInfo;
use super::log_level::LogLevel;
use super::logger::StructuredLogger;
use serde_json::Value;
use std::collections::BTreeSet;

/// Builder for one structured entry
///
/// # Example
///
/// ```
/// use rust_structured_logger::prelude::*;
///
/// let logger = StructuredLogger::builder().build();
///
/// logger.entry(LogLevel::Warn, "Slow response")
///     .context(LogContext::new().with_component("gateway"))
///     .field("route", "/orders")
///     .duration_ms(812.0)
///     .tag("latency")
///     .log();
/// ```
pub struct EntryBuilder<'a> {
    logger: &'a StructuredLogger,
    level: LogLevel,
    message: String,
    context: LogContext,
    error: Option<ErrorInfo>,
    duration: Option<f64>,
    tags: BTreeSet<String>,
}

impl<'a> EntryBuilder<'a> {
    pub(crate) fn new(logger: &'a StructuredLogger, level: LogLevel, message: String) -> Self {
        Self {
            logger,
            level,
            message,
            context: LogContext::new(),
            error: None,
            duration: None,
            tags: BTreeSet::new(),
        }
    }

    /// Set the call context, replacing any fields added so far
    #[must_use]
    pub fn context(mut self, context: LogContext) -> Self {
        self.context = context;
        self
    }

    /// Add a metadata field
    #[must_use]
    pub fn field<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.context = self.context.with_metadata(key, value);
        self
    }

    #[must_use]
    pub fn error<E>(mut self, error: &E) -> Self
    where
        E: std::error::Error + ?Sized,
    {
        self.error = Some(ErrorInfo::from_error(error));
        self
    }

    #[must_use]
    pub fn error_info(mut self, error: ErrorInfo) -> Self {
        self.error = Some(error);
        self
    }

    #[must_use]
    pub fn duration_ms(mut self, duration: f64) -> Self {
        self.duration = Some(duration);
        self
    }

    #[must_use]
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    /// Build and send the entry
    pub fn log(self) {
        self.logger.dispatch(
            self.level,
            self.message,
            &self.context,
            self.error,
            self.duration,
            self.tags,
        );
    }
}
