//! Transport trait for log output destinations

use super::{error::Result, log_entry::LogEntry};

/// A sink that delivers sanitized entries to one destination.
///
/// Transports are shared by reference between a root logger and every logger
/// derived from it, so all methods take `&self` and implementations guard
/// their own mutable state. `log` must not block on network or disk I/O.
///
/// # Example
///
/// ```
/// use rust_structured_logger::core::{LogEntry, Result, Transport};
/// use parking_lot::Mutex;
///
/// struct MemoryTransport {
///     entries: Mutex<Vec<LogEntry>>,
/// }
///
/// impl Transport for MemoryTransport {
///     fn log(&self, entry: &LogEntry) -> Result<()> {
///         self.entries.lock().push(entry.clone());
///         Ok(())
///     }
///
///     fn name(&self) -> &str {
///         "memory"
///     }
/// }
/// ```
pub trait Transport: Send + Sync {
    /// Accept one entry. Errors are reported to the fallback sink by the
    /// logger and never reach the code that emitted the entry.
    fn log(&self, entry: &LogEntry) -> Result<()>;

    /// Wait until everything accepted so far has been delivered
    fn flush(&self) -> Result<()> {
        Ok(())
    }

    /// Flush, release the underlying resource and refuse further entries
    fn close(&self) -> Result<()> {
        self.flush()
    }

    fn name(&self) -> &str;
}
