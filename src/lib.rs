//! # Rust Structured Logger
//!
//! A structured logging pipeline: every call is level-gated, merged with the
//! logger's base context, stamped with a correlation id, redacted, and fanned
//! out to any number of transports.
//!
//! ## Features
//!
//! - **Context Propagation**: Derived loggers carry correlation, user and request ids
//! - **Redaction**: Sensitive metadata keys and `password=...` style message fragments are masked
//! - **Multiple Transports**: Console (JSON or pretty), rotating file, batched remote HTTP
//! - **Failure Isolation**: A failing transport never stops the others or the caller
//! - **Operation Timers**: Durations attached to entries for a named operation
//!
//! ## Example
//!
//! ```
//! use rust_structured_logger::prelude::*;
//!
//! let logger = StructuredLogger::builder()
//!     .min_level(LogLevel::Debug)
//!     .transport(ConsoleTransport::new())
//!     .environment("production")
//!     .build();
//!
//! let request_logger = logger.with_context(
//!     LogContext::new()
//!         .with_request_id("req-42")
//!         .with_user_id("user-7"),
//! );
//! request_logger.info("Request received");
//!
//! let timer = request_logger.create_timer("load_profile");
//! timer.end();
//! ```

pub mod config;
pub mod core;
pub mod macros;
pub mod transports;

pub mod prelude {
    pub use crate::config::LoggerConfig;
    pub use crate::core::{
        EntryBuilder, ErrorInfo, FallbackSink, LogContext, LogEntry, LogLevel, LogTimer,
        LoggerBuilder, LoggerError, LoggerMetrics, Metadata, MetadataMerge, OutputFormat, Redactor,
        Result, StructuredLogger, Transport,
    };
    pub use crate::transports::{
        BatchSender, ConsoleTransport, FileTransport, RemoteOptions, RemoteTransport,
        RotationPolicy,
    };
    #[cfg(feature = "remote")]
    pub use crate::transports::HttpBatchSender;
}

pub use crate::config::LoggerConfig;
pub use crate::core::{
    EntryBuilder, ErrorInfo, FallbackSink, LogContext, LogEntry, LogLevel, LogTimer, LoggerBuilder,
    LoggerError, LoggerMetrics, Metadata, MetadataMerge, OutputFormat, Redactor, Result,
    StructuredLogger, Transport, REDACTED,
};
pub use crate::transports::{ConsoleTransport, FileTransport, RemoteTransport, RotationPolicy};
