//! Logging macros for ergonomic log message formatting.
//!
//! These macros provide a convenient interface for logging with automatic
//! string formatting, similar to `println!` and `format!`.
//!
//! # Examples
//!
//! ```
//! use rust_structured_logger::prelude::*;
//! use rust_structured_logger::info;
//!
//! let logger = StructuredLogger::builder().build();
//!
//! // Basic logging
//! info!(logger, "Server started");
//!
//! // With format arguments
//! let port = 8080;
//! info!(logger, "Server listening on port {}", port);
//!
//! // Complex formatting
//! let user_id = 42;
//! let action = "login";
//! info!(logger, "User {} performed action: {}", user_id, action);
//!
//! // With a per-call context
//! let ctx = LogContext::new().with_request_id("req-1");
//! info!(logger, context: ctx, "Handled in {}ms", 12);
//! ```

/// Log a message with automatic formatting.
///
/// # Examples
///
/// ```
/// # use rust_structured_logger::prelude::*;
/// # let logger = StructuredLogger::builder().build();
/// use rust_structured_logger::log;
/// log!(logger, LogLevel::Info, "Simple message");
/// log!(logger, LogLevel::Error, "Error code: {}", 500);
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, context: $ctx:expr, $($arg:tt)+) => {
        $logger.log_with_context($level, format!($($arg)+), $ctx)
    };
    ($logger:expr, $level:expr, $($arg:tt)+) => {
        $logger.log($level, format!($($arg)+))
    };
}

/// Log a trace-level message.
///
/// # Examples
///
/// ```
/// # use rust_structured_logger::prelude::*;
/// # let logger = StructuredLogger::builder().min_level(LogLevel::Trace).build();
/// use rust_structured_logger::trace;
/// trace!(logger, "Entering function: calculate()");
/// trace!(logger, "Variable value: {}", 42);
/// ```
#[macro_export]
macro_rules! trace {
    ($logger:expr, context: $ctx:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Trace, context: $ctx, $($arg)+)
    };
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Trace, $($arg)+)
    };
}

/// Log a debug-level message.
///
/// # Examples
///
/// ```
/// # use rust_structured_logger::prelude::*;
/// # let logger = StructuredLogger::builder().build();
/// use rust_structured_logger::debug;
/// debug!(logger, "Debug information");
/// debug!(logger, "Counter value: {}", 10);
/// ```
#[macro_export]
macro_rules! debug {
    ($logger:expr, context: $ctx:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Debug, context: $ctx, $($arg)+)
    };
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Debug, $($arg)+)
    };
}

/// Log an info-level message.
///
/// # Examples
///
/// ```
/// # use rust_structured_logger::prelude::*;
/// # let logger = StructuredLogger::builder().build();
/// use rust_structured_logger::info;
/// info!(logger, "Application started");
/// info!(logger, "Processing {} items", 100);
/// ```
#[macro_export]
macro_rules! info {
    ($logger:expr, context: $ctx:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Info, context: $ctx, $($arg)+)
    };
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Info, $($arg)+)
    };
}

/// Log a warning-level message.
///
/// # Examples
///
/// ```
/// # use rust_structured_logger::prelude::*;
/// # let logger = StructuredLogger::builder().build();
/// use rust_structured_logger::warn;
/// warn!(logger, "Low disk space");
/// warn!(logger, "Retry attempt {} of {}", 3, 5);
/// ```
#[macro_export]
macro_rules! warn {
    ($logger:expr, context: $ctx:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Warn, context: $ctx, $($arg)+)
    };
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Warn, $($arg)+)
    };
}

/// Log an error-level message.
///
/// # Examples
///
/// ```
/// # use rust_structured_logger::prelude::*;
/// # let logger = StructuredLogger::builder().build();
/// use rust_structured_logger::error;
/// error!(logger, "Failed to connect to database");
/// error!(logger, "Error code: {}, message: {}", 500, "Internal error");
/// ```
#[macro_export]
macro_rules! error {
    ($logger:expr, context: $ctx:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Error, context: $ctx, $($arg)+)
    };
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Error, $($arg)+)
    };
}

/// Log a fatal-level message.
///
/// # Examples
///
/// ```
/// # use rust_structured_logger::prelude::*;
/// # let logger = StructuredLogger::builder().build();
/// use rust_structured_logger::fatal;
/// fatal!(logger, "Critical system failure");
/// fatal!(logger, "Unable to recover from error: {}", "disk full");
/// ```
#[macro_export]
macro_rules! fatal {
    ($logger:expr, context: $ctx:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Fatal, context: $ctx, $($arg)+)
    };
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Fatal, $($arg)+)
    };
}

#[cfg(test)]
mod tests {
    use crate::core::{LogEntry, LogLevel, Result, StructuredLogger, Transport};
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Default)]
    struct SpyTransport {
        messages: Mutex<Vec<(LogLevel, String)>>,
    }

    impl Transport for SpyTransport {
        fn log(&self, entry: &LogEntry) -> Result<()> {
            self.messages.lock().push((entry.level, entry.message.clone()));
            Ok(())
        }

        fn name(&self) -> &str {
            "spy"
        }
    }

    fn logger() -> (StructuredLogger, Arc<SpyTransport>) {
        let spy = Arc::new(SpyTransport::default());
        let logger = StructuredLogger::builder()
            .min_level(LogLevel::Trace)
            .shared_transport(spy.clone())
            .build();
        (logger, spy)
    }

    #[test]
    fn test_log_macro() {
        let (logger, spy) = logger();
        log!(logger, LogLevel::Info, "Test message");
        log!(logger, LogLevel::Info, "Formatted: {}", 42);

        let messages = spy.messages.lock();
        assert_eq!(messages[0].1, "Test message");
        assert_eq!(messages[1].1, "Formatted: 42");
    }

    #[test]
    fn test_level_macros() {
        let (logger, spy) = logger();
        trace!(logger, "Value: {}", 10);
        debug!(logger, "Count: {}", 5);
        info!(logger, "Items: {}", 100);
        warn!(logger, "Retry {} of {}", 1, 3);
        error!(logger, "Code: {}", 500);
        fatal!(logger, "Critical failure: {}", "system");

        let levels: Vec<LogLevel> = spy.messages.lock().iter().map(|(l, _)| *l).collect();
        assert_eq!(levels, LogLevel::ALL.to_vec());
        assert_eq!(spy.messages.lock()[3].1, "Retry 1 of 3");
    }

    #[test]
    fn test_context_arm() {
        use crate::core::LogContext;

        let spy = Arc::new(ContextSpy::default());
        let logger = StructuredLogger::builder().shared_transport(spy.clone()).build();
        info!(logger, context: LogContext::new().with_request_id("req-9"), "handled {}", "ok");

        let entry = spy.entries.lock()[0].clone();
        assert_eq!(entry.message, "handled ok");
        assert_eq!(entry.context.request_id.as_deref(), Some("req-9"));
    }

    #[derive(Default)]
    struct ContextSpy {
        entries: Mutex<Vec<LogEntry>>,
    }

    impl Transport for ContextSpy {
        fn log(&self, entry: &LogEntry) -> Result<()> {
            self.entries.lock().push(entry.clone());
            Ok(())
        }

        fn name(&self) -> &str {
            "context-spy"
        }
    }

    #[test]
    fn test_macro_respects_level_gate() {
        let spy = Arc::new(SpyTransport::default());
        let logger = StructuredLogger::builder()
            .min_level(LogLevel::Warn)
            .shared_transport(spy.clone())
            .build();

        info!(logger, "dropped {}", 1);
        warn!(logger, "kept {}", 2);

        assert_eq!(spy.messages.lock().len(), 1);
    }
}
