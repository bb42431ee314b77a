//! Remote transport for centralized logging
//!
//! Entries are buffered in memory and shipped in batches by a background
//! worker. A batch leaves when the buffer reaches the batch size or when the
//! periodic flush timer finds a non-empty buffer. Failed batches are not
//! retried: their entries are written to the fallback sink and dropped.
//!
//! At most `max_pending_batches` full batches wait for the worker. When that
//! queue is full the overflowing batch goes to the fallback sink instead of
//! growing memory without bound.

use crate::core::fallback::{self, FallbackSink};
use crate::core::{LogEntry, LoggerError, Result, Transport};
use crossbeam_channel::{bounded, select, tick, unbounded, Receiver, Sender, TrySendError};
use parking_lot::Mutex;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Default number of entries per batch
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Default period of the flush timer
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_millis(5000);

/// Default number of full batches allowed to wait for the worker
pub const DEFAULT_MAX_PENDING_BATCHES: usize = 64;

/// Delivers one batch of entries to the collector.
///
/// Success means the call returned `Ok`; no response body is consumed.
pub trait BatchSender: Send {
    fn send_batch(&mut self, entries: &[LogEntry]) -> Result<()>;
}

/// Delivery counters for a remote transport
#[derive(Debug, Default)]
pub struct RemoteStats {
    batches_sent: AtomicU64,
    entries_sent: AtomicU64,
    batches_failed: AtomicU64,
    entries_dropped: AtomicU64,
}

impl RemoteStats {
    pub fn batches_sent(&self) -> u64 {
        self.batches_sent.load(Ordering::Relaxed)
    }

    pub fn entries_sent(&self) -> u64 {
        self.entries_sent.load(Ordering::Relaxed)
    }

    pub fn batches_failed(&self) -> u64 {
        self.batches_failed.load(Ordering::Relaxed)
    }

    pub fn entries_dropped(&self) -> u64 {
        self.entries_dropped.load(Ordering::Relaxed)
    }
}

/// Batching, queueing and failure reporting settings
#[derive(Debug, Clone)]
pub struct RemoteOptions {
    pub batch_size: usize,
    pub flush_interval: Duration,
    pub max_pending_batches: usize,
    /// Receives batches that failed, panicked or overflowed the queue
    pub fallback: FallbackSink,
}

impl Default for RemoteOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            flush_interval: DEFAULT_FLUSH_INTERVAL,
            max_pending_batches: DEFAULT_MAX_PENDING_BATCHES,
            fallback: FallbackSink::stderr(),
        }
    }
}

impl RemoteOptions {
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    #[must_use]
    pub fn with_flush_interval(mut self, interval: Duration) -> Self {
        self.flush_interval = interval;
        self
    }

    #[must_use]
    pub fn with_max_pending_batches(mut self, max: usize) -> Self {
        self.max_pending_batches = max;
        self
    }

    #[must_use]
    pub fn with_fallback(mut self, sink: FallbackSink) -> Self {
        self.fallback = sink;
        self
    }
}

enum Control {
    Flush(Sender<()>),
    Shutdown,
}

/// State shared between `log()` callers and the worker
struct Buffer {
    entries: Mutex<Vec<LogEntry>>,
    batches: Sender<Vec<LogEntry>>,
}

impl Buffer {
    /// Everything waiting for delivery, oldest first: batches already handed
    /// to the worker, then the live buffer. Taking the buffer lock first keeps
    /// this in order with concurrent `log()` calls, which enqueue under it.
    fn drain_all(&self, queued: &Receiver<Vec<LogEntry>>) -> Vec<Vec<LogEntry>> {
        let mut entries = self.entries.lock();
        let mut batches: Vec<Vec<LogEntry>> = queued.try_iter().collect();
        if !entries.is_empty() {
            batches.push(std::mem::take(&mut *entries));
        }
        batches
    }
}

/// Buffers entries and ships them in batches through a [`BatchSender`]
///
/// # Example
///
/// ```no_run
/// # #[cfg(feature = "remote")]
/// # fn main() -> rust_structured_logger::Result<()> {
/// use rust_structured_logger::transports::{HttpBatchSender, RemoteOptions, RemoteTransport};
/// use std::time::Duration;
///
/// let sender = HttpBatchSender::new("https://logs.example.com/ingest")?
///     .with_bearer_token("secret");
/// let transport = RemoteTransport::new(
///     sender,
///     RemoteOptions::default().with_flush_interval(Duration::from_secs(2)),
/// )?;
/// # Ok(())
/// # }
/// # #[cfg(not(feature = "remote"))]
/// # fn main() {}
/// ```
pub struct RemoteTransport {
    buffer: Arc<Buffer>,
    control: Sender<Control>,
    worker: Mutex<Option<thread::JoinHandle<()>>>,
    stats: Arc<RemoteStats>,
    fallback: FallbackSink,
    batch_size: usize,
    max_pending_batches: usize,
    closed: AtomicBool,
}

impl RemoteTransport {
    pub fn new<S: BatchSender + 'static>(sender: S, options: RemoteOptions) -> Result<Self> {
        if options.batch_size == 0 {
            return Err(LoggerError::config("RemoteTransport", "batch size must be positive"));
        }
        if options.flush_interval.is_zero() {
            return Err(LoggerError::config("RemoteTransport", "flush interval must be positive"));
        }
        if options.max_pending_batches == 0 {
            return Err(LoggerError::config(
                "RemoteTransport",
                "max pending batches must be positive",
            ));
        }

        let (batch_tx, batch_rx) = bounded(options.max_pending_batches);
        let (control_tx, control_rx) = unbounded();
        let buffer = Arc::new(Buffer {
            entries: Mutex::new(Vec::with_capacity(options.batch_size)),
            batches: batch_tx,
        });
        let stats = Arc::new(RemoteStats::default());

        let mut worker = Worker {
            sender: Box::new(sender),
            buffer: Arc::clone(&buffer),
            stats: Arc::clone(&stats),
            fallback: options.fallback.clone(),
        };
        let interval = options.flush_interval;
        let handle = thread::Builder::new()
            .name("remote-transport".to_string())
            .spawn(move || worker.run(batch_rx, control_rx, interval))
            .map_err(|e| LoggerError::io_operation("spawn worker thread", "remote transport", e))?;

        Ok(Self {
            buffer,
            control: control_tx,
            worker: Mutex::new(Some(handle)),
            stats,
            fallback: options.fallback,
            batch_size: options.batch_size,
            max_pending_batches: options.max_pending_batches,
            closed: AtomicBool::new(false),
        })
    }

    /// Entries waiting in the live buffer
    pub fn buffered(&self) -> usize {
        self.buffer.entries.lock().len()
    }

    pub fn stats(&self) -> &RemoteStats {
        &self.stats
    }

    /// The batch could not be queued. Everything but the newest entry goes to
    /// the fallback sink; the newest is left to the caller via the error.
    fn reject_batch(&self, mut batch: Vec<LogEntry>, error: LoggerError) -> LoggerError {
        self.stats.batches_failed.fetch_add(1, Ordering::Relaxed);
        self.stats
            .entries_dropped
            .fetch_add(batch.len() as u64, Ordering::Relaxed);
        batch.pop();
        if !batch.is_empty() {
            let reason = format!("{} ({} entries dropped)", error, batch.len() + 1);
            self.fallback.report("remote", &reason, &batch);
        }
        error
    }
}

impl Transport for RemoteTransport {
    fn log(&self, entry: &LogEntry) -> Result<()> {
        let mut entries = self.buffer.entries.lock();
        if self.closed.load(Ordering::Acquire) {
            return Err(LoggerError::closed("remote"));
        }
        entries.push(entry.clone());
        if entries.len() >= self.batch_size {
            let batch = std::mem::take(&mut *entries);
            match self.buffer.batches.try_send(batch) {
                Ok(()) => {}
                Err(TrySendError::Full(batch)) => {
                    let error =
                        LoggerError::queue_full(self.max_pending_batches, self.max_pending_batches);
                    return Err(self.reject_batch(batch, error));
                }
                Err(TrySendError::Disconnected(batch)) => {
                    return Err(self.reject_batch(batch, LoggerError::ChannelSendError));
                }
            }
        }
        Ok(())
    }

    /// Ship everything buffered and wait for the attempt to finish
    fn flush(&self) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Ok(());
        }
        let (ack_tx, ack_rx) = bounded(1);
        self.control
            .send(Control::Flush(ack_tx))
            .map_err(|_| LoggerError::ChannelSendError)?;
        ack_rx.recv().map_err(|_| LoggerError::ChannelSendError)
    }

    /// Stop the timer, perform a final flush and stop the worker
    fn close(&self) -> Result<()> {
        {
            // Under the buffer lock, so no entry lands after the final drain
            let _entries = self.buffer.entries.lock();
            if self.closed.swap(true, Ordering::AcqRel) {
                return Ok(());
            }
        }
        let _ = self.control.send(Control::Shutdown);

        if let Some(handle) = self.worker.lock().take() {
            if handle.join().is_err() {
                return Err(LoggerError::other("remote transport worker panicked"));
            }
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "remote"
    }
}

impl Drop for RemoteTransport {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            eprintln!("[LOGGER ERROR] Failed to close remote transport: {}", e);
        }
    }
}

/// Background side: owns the sender and the flush timer
struct Worker {
    sender: Box<dyn BatchSender>,
    buffer: Arc<Buffer>,
    stats: Arc<RemoteStats>,
    fallback: FallbackSink,
}

impl Worker {
    fn run(
        &mut self,
        batches: Receiver<Vec<LogEntry>>,
        control: Receiver<Control>,
        interval: Duration,
    ) {
        let ticker = tick(interval);
        loop {
            select! {
                recv(batches) -> batch => {
                    if let Ok(batch) = batch {
                        self.deliver(batch);
                    }
                }
                recv(ticker) -> _ => self.deliver_all(&batches),
                recv(control) -> command => match command {
                    Ok(Control::Flush(ack)) => {
                        self.deliver_all(&batches);
                        let _ = ack.send(());
                    }
                    Ok(Control::Shutdown) | Err(_) => {
                        self.deliver_all(&batches);
                        break;
                    }
                },
            }
        }
    }

    fn deliver_all(&mut self, queued: &Receiver<Vec<LogEntry>>) {
        for batch in self.buffer.drain_all(queued) {
            self.deliver(batch);
        }
    }

    fn deliver(&mut self, batch: Vec<LogEntry>) {
        if batch.is_empty() {
            return;
        }
        let sender = &mut self.sender;
        let failure = match panic::catch_unwind(AssertUnwindSafe(|| sender.send_batch(&batch))) {
            Ok(Ok(())) => {
                self.stats.batches_sent.fetch_add(1, Ordering::Relaxed);
                self.stats
                    .entries_sent
                    .fetch_add(batch.len() as u64, Ordering::Relaxed);
                return;
            }
            Ok(Err(e)) => e.to_string(),
            Err(payload) => format!("sender panicked: {}", fallback::panic_message(payload.as_ref())),
        };

        self.stats.batches_failed.fetch_add(1, Ordering::Relaxed);
        self.stats
            .entries_dropped
            .fetch_add(batch.len() as u64, Ordering::Relaxed);
        let reason = format!("{} ({} entries dropped)", failure, batch.len());
        self.fallback.report("remote", &reason, &batch);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fallback::CapturedOutput;
    use crate::core::LogLevel;

    /// Records every batch it is asked to send
    #[derive(Clone, Default)]
    struct RecordingSender {
        batches: Arc<Mutex<Vec<Vec<LogEntry>>>>,
        fail: bool,
    }

    impl BatchSender for RecordingSender {
        fn send_batch(&mut self, entries: &[LogEntry]) -> Result<()> {
            self.batches.lock().push(entries.to_vec());
            if self.fail {
                Err(LoggerError::remote_delivery("memory://", "collector unavailable"))
            } else {
                Ok(())
            }
        }
    }

    /// Panics on any batch whose first message is "boom"
    #[derive(Clone, Default)]
    struct PanickingSender {
        batches: Arc<Mutex<Vec<Vec<LogEntry>>>>,
    }

    impl BatchSender for PanickingSender {
        fn send_batch(&mut self, entries: &[LogEntry]) -> Result<()> {
            if entries[0].message == "boom" {
                panic!("collector client blew up");
            }
            self.batches.lock().push(entries.to_vec());
            Ok(())
        }
    }

    /// Signals when a send starts, then blocks until the gate sender is dropped
    struct GatedSender {
        entered: Sender<()>,
        gate: Receiver<()>,
        batches: Arc<Mutex<Vec<Vec<LogEntry>>>>,
    }

    impl BatchSender for GatedSender {
        fn send_batch(&mut self, entries: &[LogEntry]) -> Result<()> {
            self.batches.lock().push(entries.to_vec());
            let _ = self.entered.send(());
            let _ = self.gate.recv();
            Ok(())
        }
    }

    fn long_interval(batch_size: usize) -> RemoteOptions {
        RemoteOptions::default()
            .with_batch_size(batch_size)
            .with_flush_interval(Duration::from_secs(3600))
    }

    fn entry(i: usize) -> LogEntry {
        LogEntry::new(LogLevel::Info, format!("m{}", i))
    }

    #[test]
    fn test_batch_size_trigger() {
        let sender = RecordingSender::default();
        let transport = RemoteTransport::new(sender.clone(), long_interval(5)).unwrap();

        for i in 0..5 {
            transport.log(&entry(i)).unwrap();
        }
        assert_eq!(transport.buffered(), 0);

        transport.flush().unwrap();
        let batches = sender.batches.lock().clone();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].len(), 5);
        assert_eq!(transport.stats().batches_sent(), 1);
    }

    #[test]
    fn test_below_threshold_waits() {
        let sender = RecordingSender::default();
        let transport = RemoteTransport::new(sender.clone(), long_interval(10)).unwrap();

        for i in 0..3 {
            transport.log(&entry(i)).unwrap();
        }
        assert_eq!(transport.buffered(), 3);
        assert!(sender.batches.lock().is_empty());

        transport.flush().unwrap();
        assert_eq!(transport.buffered(), 0);
        assert_eq!(sender.batches.lock()[0].len(), 3);
    }

    #[test]
    fn test_timer_flushes_non_empty_buffer() {
        let sender = RecordingSender::default();
        let options = RemoteOptions::default()
            .with_batch_size(100)
            .with_flush_interval(Duration::from_millis(20));
        let transport = RemoteTransport::new(sender.clone(), options).unwrap();

        transport.log(&entry(0)).unwrap();
        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while sender.batches.lock().is_empty() && std::time::Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
        }

        assert_eq!(sender.batches.lock().len(), 1);
        assert_eq!(transport.buffered(), 0);
    }

    #[test]
    fn test_batches_preserve_order() {
        let sender = RecordingSender::default();
        let transport = RemoteTransport::new(sender.clone(), long_interval(4)).unwrap();

        for i in 0..10 {
            transport.log(&entry(i)).unwrap();
        }
        transport.flush().unwrap();

        let messages: Vec<String> = sender
            .batches
            .lock()
            .iter()
            .flatten()
            .map(|e| e.message.clone())
            .collect();
        let expected: Vec<String> = (0..10).map(|i| format!("m{}", i)).collect();
        assert_eq!(messages, expected);
    }

    #[test]
    fn test_failed_batch_is_dropped_not_retried() {
        let sender = RecordingSender {
            fail: true,
            ..Default::default()
        };
        let transport = RemoteTransport::new(sender.clone(), long_interval(2)).unwrap();

        transport.log(&entry(0)).unwrap();
        transport.log(&entry(1)).unwrap();
        transport.flush().unwrap();
        transport.flush().unwrap();

        assert_eq!(sender.batches.lock().len(), 1);
        assert_eq!(transport.stats().batches_failed(), 1);
        assert_eq!(transport.stats().entries_dropped(), 2);
        assert_eq!(transport.buffered(), 0);
    }

    #[test]
    fn test_failed_batch_written_to_fallback() {
        let output = CapturedOutput::default();
        let sender = RecordingSender {
            fail: true,
            ..Default::default()
        };
        let transport =
            RemoteTransport::new(sender, long_interval(2).with_fallback(output.sink())).unwrap();

        transport.log(&entry(0)).unwrap();
        transport.log(&entry(1)).unwrap();
        transport.flush().unwrap();

        let text = output.text();
        assert!(text.starts_with("Logging transport failed: remote: "));
        assert!(text.contains("(2 entries dropped)"));
        assert!(text.contains("\"message\":\"m0\""));
        assert!(text.contains("\"message\":\"m1\""));
    }

    #[test]
    fn test_panicking_sender_does_not_stop_worker() {
        let output = CapturedOutput::default();
        let sender = PanickingSender::default();
        let transport =
            RemoteTransport::new(sender.clone(), long_interval(1).with_fallback(output.sink()))
                .unwrap();

        transport.log(&LogEntry::new(LogLevel::Error, "boom")).unwrap();
        transport.flush().unwrap();
        transport.log(&entry(1)).unwrap();
        transport.flush().unwrap();

        let stats = transport.stats();
        assert_eq!(stats.batches_failed(), 1);
        assert_eq!(stats.entries_dropped(), 1);
        assert_eq!(stats.batches_sent(), 1);
        assert_eq!(sender.batches.lock()[0][0].message, "m1");

        let text = output.text();
        assert!(text.contains("sender panicked: collector client blew up"));
        assert!(text.contains("\"message\":\"boom\""));
        assert!(transport.close().is_ok());
    }

    #[test]
    fn test_pending_batch_overflow_goes_to_fallback() {
        let output = CapturedOutput::default();
        let (entered_tx, entered_rx) = unbounded();
        let (gate_tx, gate_rx) = unbounded::<()>();
        let batches = Arc::new(Mutex::new(Vec::new()));
        let sender = GatedSender {
            entered: entered_tx,
            gate: gate_rx,
            batches: Arc::clone(&batches),
        };
        let options = long_interval(2)
            .with_max_pending_batches(1)
            .with_fallback(output.sink());
        let transport = RemoteTransport::new(sender, options).unwrap();

        // First batch is taken by the worker, which then blocks inside the sender
        transport.log(&entry(0)).unwrap();
        transport.log(&entry(1)).unwrap();
        entered_rx.recv_timeout(Duration::from_secs(5)).unwrap();

        // Second batch fills the single pending slot
        transport.log(&entry(2)).unwrap();
        transport.log(&entry(3)).unwrap();

        // Third batch overflows
        transport.log(&entry(4)).unwrap();
        let overflow = transport.log(&entry(5));
        assert!(matches!(overflow, Err(LoggerError::QueueFull { max: 1, .. })));
        assert_eq!(transport.buffered(), 0);
        assert_eq!(transport.stats().batches_failed(), 1);
        assert_eq!(transport.stats().entries_dropped(), 2);

        let text = output.text();
        assert!(text.contains("\"message\":\"m4\""));
        // the newest entry is returned to the caller, not dumped here
        assert!(!text.contains("\"message\":\"m5\""));

        drop(gate_tx);
        transport.flush().unwrap();
        let delivered: Vec<String> = batches
            .lock()
            .iter()
            .flatten()
            .map(|e| e.message.clone())
            .collect();
        assert_eq!(delivered, vec!["m0", "m1", "m2", "m3"]);
        assert_eq!(transport.stats().entries_sent(), 4);
    }

    #[test]
    fn test_close_performs_final_flush() {
        let sender = RecordingSender::default();
        let transport = RemoteTransport::new(sender.clone(), long_interval(100)).unwrap();

        transport.log(&entry(0)).unwrap();
        transport.close().unwrap();

        assert_eq!(sender.batches.lock().len(), 1);
        assert!(matches!(
            transport.log(&entry(1)),
            Err(LoggerError::TransportClosed { .. })
        ));
        assert!(transport.close().is_ok());
    }

    #[test]
    fn test_invalid_options_rejected() {
        let zero_batch = RemoteTransport::new(
            RecordingSender::default(),
            RemoteOptions::default().with_batch_size(0),
        );
        assert!(matches!(zero_batch, Err(LoggerError::InvalidConfiguration { .. })));

        let zero_interval = RemoteTransport::new(
            RecordingSender::default(),
            RemoteOptions::default().with_flush_interval(Duration::ZERO),
        );
        assert!(zero_interval.is_err());

        let zero_pending = RemoteTransport::new(
            RecordingSender::default(),
            RemoteOptions::default().with_max_pending_batches(0),
        );
        assert!(zero_pending.is_err());
    }
}
