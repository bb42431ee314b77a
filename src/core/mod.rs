//! Core logger types and traits

pub mod entry_builder;
pub mod error;
pub mod fallback;
pub mod log_context;
pub mod log_entry;
pub mod log_level;
pub mod logger;
pub mod metrics;
pub mod output_format;
pub mod redactor;
pub mod timer;
pub mod transport;

pub use entry_builder::EntryBuilder;
pub use error::{LoggerError, Result};
pub use fallback::FallbackSink;
pub use log_context::{LogContext, Metadata, MetadataMerge};
pub use log_entry::{ErrorInfo, LogEntry};
pub use log_level::LogLevel;
pub use logger::{LoggerBuilder, StructuredLogger};
pub use metrics::LoggerMetrics;
pub use output_format::OutputFormat;
pub use redactor::{Redactor, REDACTED};
pub use timer::LogTimer;
pub use transport::Transport;
