//! File transport with JSON lines and size-based rotation
//!
//! `log()` serializes the entry and hands the line to a writer thread over a
//! bounded channel, so callers never wait on disk I/O. The writer thread owns
//! the file, batches flushes, and rotates when the file grows past the
//! configured size.
//!
//! Lines that fail to reach the disk are written to the fallback sink after a
//! warning line, then dropped from the write buffer.

use crate::core::{FallbackSink, LogEntry, LoggerError, Result, Transport};
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use fs2::FileExt;
use parking_lot::{Mutex, RwLock};
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::thread;

/// Default number of lines that may wait for the writer thread
pub const DEFAULT_QUEUE_CAPACITY: usize = 8192;

/// When and how the live file is rotated
///
/// # Examples
///
/// ```
/// use rust_structured_logger::transports::RotationPolicy;
///
/// // Rotate at 50 MB, keep 7 gzip-compressed backups
/// let policy = RotationPolicy::new()
///     .with_max_size(50 * 1024 * 1024)
///     .with_max_files(7)
///     .with_compression(true);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationPolicy {
    /// Rotate once the live file reaches this many bytes; 0 disables rotation
    pub max_file_size: u64,
    /// Maximum number of rotated files to keep
    pub max_files: usize,
    /// Whether to gzip rotated files
    pub compress: bool,
}

impl Default for RotationPolicy {
    fn default() -> Self {
        Self {
            max_file_size: 10 * 1024 * 1024, // 10 MB
            max_files: 5,
            compress: false,
        }
    }
}

impl RotationPolicy {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// No rotation (useful for testing or when external rotation is used)
    #[must_use]
    pub fn never() -> Self {
        Self {
            max_file_size: 0,
            ..Self::default()
        }
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_size(mut self, size: u64) -> Self {
        self.max_file_size = size;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_files(mut self, count: usize) -> Self {
        self.max_files = count;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_compression(mut self, enabled: bool) -> Self {
        self.compress = enabled;
        self
    }
}

enum Command {
    Line(String),
    Flush(Sender<Result<()>>),
}

/// Appends one JSON object per line to a file
///
/// # Examples
///
/// ```no_run
/// use rust_structured_logger::transports::{FileTransport, RotationPolicy};
///
/// let transport = FileTransport::with_policy(
///     "/var/log/app/app.log",
///     RotationPolicy::new().with_max_size(5 * 1024 * 1024).with_max_files(3),
/// ).unwrap();
/// ```
pub struct FileTransport {
    path: PathBuf,
    sender: RwLock<Option<Sender<Command>>>,
    worker: Mutex<Option<thread::JoinHandle<()>>>,
    queue_capacity: usize,
}

impl FileTransport {
    /// Create a file transport with the default rotation policy
    ///
    /// # Errors
    ///
    /// Returns error if the directory or file cannot be created, or if another
    /// transport already holds the file
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::with_policy(path, RotationPolicy::default())
    }

    pub fn with_policy<P: AsRef<Path>>(path: P, policy: RotationPolicy) -> Result<Self> {
        Self::with_options(path, policy, DEFAULT_QUEUE_CAPACITY)
    }

    pub fn with_options<P: AsRef<Path>>(
        path: P,
        policy: RotationPolicy,
        queue_capacity: usize,
    ) -> Result<Self> {
        Self::with_fallback(path, policy, queue_capacity, FallbackSink::stderr())
    }

    /// Full constructor: ensures the directory and file exist, takes an
    /// exclusive lock on the file and starts the writer thread. Lines that
    /// cannot be written are reported to `fallback`.
    pub fn with_fallback<P: AsRef<Path>>(
        path: P,
        policy: RotationPolicy,
        queue_capacity: usize,
        fallback: FallbackSink,
    ) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if queue_capacity == 0 {
            return Err(LoggerError::config("FileTransport", "queue capacity must be positive"));
        }

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                LoggerError::io_operation(
                    "create log directory",
                    format!("Failed to create directory '{}'", parent.display()),
                    e,
                )
            })?;
        }

        let (file, current_size) = open_locked(&path)?;
        let mut writer = FileWriter {
            path: path.clone(),
            policy,
            writer: Some(BufWriter::new(file)),
            current_size,
            failed_writes: 0,
            last_failure: None,
            unflushed: Vec::new(),
            fallback,
        };

        let (sender, receiver) = bounded(queue_capacity);
        let handle = thread::Builder::new()
            .name("file-transport".to_string())
            .spawn(move || writer.run(receiver))
            .map_err(|e| LoggerError::io_operation("spawn writer thread", "file transport", e))?;

        Ok(Self {
            path,
            sender: RwLock::new(Some(sender)),
            worker: Mutex::new(Some(handle)),
            queue_capacity,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Lines accepted but not yet picked up by the writer thread
    pub fn pending(&self) -> usize {
        self.sender.read().as_ref().map_or(0, Sender::len)
    }
}

impl Transport for FileTransport {
    fn log(&self, entry: &LogEntry) -> Result<()> {
        let line = entry.to_json()?;
        let guard = self.sender.read();
        let sender = guard.as_ref().ok_or_else(|| LoggerError::closed("file"))?;

        match sender.try_send(Command::Line(line)) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                Err(LoggerError::queue_full(sender.len(), self.queue_capacity))
            }
            Err(TrySendError::Disconnected(_)) => Err(LoggerError::ChannelSendError),
        }
    }

    fn flush(&self) -> Result<()> {
        let sender = match self.sender.read().as_ref() {
            Some(sender) => sender.clone(),
            None => return Ok(()),
        };
        let (ack_tx, ack_rx) = bounded(1);
        sender
            .send(Command::Flush(ack_tx))
            .map_err(|_| LoggerError::ChannelSendError)?;
        ack_rx.recv().map_err(|_| LoggerError::ChannelSendError)?
    }

    /// Drain pending lines, flush, release the file and stop the writer thread
    fn close(&self) -> Result<()> {
        let flushed = self.flush();
        drop(self.sender.write().take());

        if let Some(handle) = self.worker.lock().take() {
            if handle.join().is_err() {
                return Err(LoggerError::file_transport(
                    self.path.display().to_string(),
                    "writer thread panicked",
                ));
            }
        }
        flushed
    }

    fn name(&self) -> &str {
        "file"
    }
}

impl Drop for FileTransport {
    fn drop(&mut self) {
        // Ensure all queued lines reach the disk
        if let Err(e) = self.close() {
            eprintln!("[LOGGER ERROR] Failed to close file transport: {}", e);
        }
    }
}

/// Open for append and take an exclusive advisory lock
fn open_locked(path: &Path) -> Result<(File, u64)> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| {
            LoggerError::file_transport(path.display().to_string(), format!("Failed to open: {}", e))
        })?;
    file.try_lock_exclusive()
        .map_err(|_| LoggerError::file_lock(path.display().to_string()))?;

    let size = file
        .metadata()
        .map_err(|e| {
            LoggerError::file_transport(
                path.display().to_string(),
                format!("Cannot access file metadata: {}", e),
            )
        })?
        .len();
    Ok((file, size))
}

/// State owned by the writer thread
struct FileWriter {
    path: PathBuf,
    policy: RotationPolicy,
    writer: Option<BufWriter<File>>,
    current_size: u64,
    failed_writes: usize,
    last_failure: Option<String>,
    /// Lines in the write buffer that have not reached the file yet
    unflushed: Vec<String>,
    fallback: FallbackSink,
}

impl FileWriter {
    fn run(&mut self, receiver: Receiver<Command>) {
        while let Ok(command) = receiver.recv() {
            self.handle(command);
            // Batch whatever else is already queued before flushing
            while let Ok(command) = receiver.try_recv() {
                self.handle(command);
            }
            // failures are recorded and reported by flush itself
            let _ = self.flush();
        }
        let _ = self.flush();
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::Line(line) => match self.write_line(&line) {
                Ok(()) => self.unflushed.push(line),
                Err(e) => self.record_failure(&e, Some(line)),
            },
            Command::Flush(ack) => {
                let flushed = self.flush();
                let failures = self.take_failures();
                let _ = ack.send(flushed.and(failures));
            }
        }
    }

    fn write_line(&mut self, line: &str) -> Result<()> {
        if self.policy.max_file_size > 0 && self.current_size >= self.policy.max_file_size {
            self.rotate()?;
        }
        if self.writer.is_none() {
            let (file, size) = open_locked(&self.path)?;
            self.writer = Some(BufWriter::new(file));
            self.current_size = size;
        }

        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| LoggerError::file_transport(self.path.display().to_string(), "writer not initialized"))?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        self.current_size += line.len() as u64 + 1;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        if let Some(ref mut writer) = self.writer {
            if let Err(e) = writer.flush() {
                let error = LoggerError::from(e);
                self.record_failure(&error, None);
                return Err(error);
            }
        }
        self.unflushed.clear();
        Ok(())
    }

    /// Count the failure, report every line that did not reach the file and
    /// drop them from the write buffer so the next flush starts clean
    fn record_failure(&mut self, error: &LoggerError, line: Option<String>) {
        self.failed_writes += 1;
        self.last_failure = Some(error.to_string());

        let mut lost = std::mem::take(&mut self.unflushed);
        lost.extend(line);
        if let Some(writer) = self.writer.take() {
            let (file, _discarded) = writer.into_parts();
            self.writer = Some(BufWriter::new(file));
        }
        self.fallback.report_lines("file", error, &lost);
    }

    /// Turn write failures since the last flush into an error for the flusher
    fn take_failures(&mut self) -> Result<()> {
        let failed = std::mem::take(&mut self.failed_writes);
        match self.last_failure.take() {
            Some(last) if failed > 0 => Err(LoggerError::file_transport(
                self.path.display().to_string(),
                format!("{} writes failed since last flush, last: {}", failed, last),
            )),
            _ => Ok(()),
        }
    }

    fn rotate(&mut self) -> Result<()> {
        // Explicitly drop writer to release the file handle and its lock
        if let Some(mut writer) = self.writer.take() {
            writer.flush().map_err(|e| {
                LoggerError::file_rotation(
                    self.path.display().to_string(),
                    format!("Failed to flush before rotation: {}", e),
                )
            })?;
        }

        if self.policy.max_files == 0 {
            if let Err(e) = fs::remove_file(&self.path) {
                eprintln!("[LOGGER WARNING] Failed to remove {}: {}", self.path.display(), e);
            }
        } else {
            // Oldest backup falls off the end
            for oldest in [
                self.backup_path(self.policy.max_files, false),
                self.backup_path(self.policy.max_files, true),
            ] {
                if oldest.exists() {
                    if let Err(e) = fs::remove_file(&oldest) {
                        eprintln!(
                            "[LOGGER WARNING] Failed to remove oldest backup {}: {}",
                            oldest.display(),
                            e
                        );
                    }
                }
            }

            for i in (1..self.policy.max_files).rev() {
                for compressed in [false, true] {
                    let from = self.backup_path(i, compressed);
                    if from.exists() {
                        let to = self.backup_path(i + 1, compressed);
                        fs::rename(&from, &to).map_err(|e| {
                            LoggerError::file_rotation(
                                from.display().to_string(),
                                format!("Failed to shift backup: {}", e),
                            )
                        })?;
                    }
                }
            }

            let first = self.backup_path(1, false);
            if self.path.exists() {
                fs::rename(&self.path, &first).map_err(|e| {
                    LoggerError::file_rotation(
                        self.path.display().to_string(),
                        format!("Failed to rotate current log file: {}", e),
                    )
                })?;
                if self.policy.compress {
                    compress_file(&first, &self.backup_path(1, true))?;
                }
            }
        }

        let (file, size) = open_locked(&self.path)?;
        self.writer = Some(BufWriter::new(file));
        self.current_size = size;
        Ok(())
    }

    /// `<name>.<index>`, or `<name>.<index>.gz` for compressed backups
    fn backup_path(&self, index: usize, compressed: bool) -> PathBuf {
        let filename = self
            .path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("app.log");
        let name = if compressed {
            format!("{}.{}.gz", filename, index)
        } else {
            format!("{}.{}", filename, index)
        };
        self.path.with_file_name(name)
    }
}

/// Gzip `source` into `target`. The source is removed only after the
/// compressed file is complete.
fn compress_file(source: &Path, target: &Path) -> Result<()> {
    let temp = target.with_extension("gz.tmp");
    let result = (|| -> std::io::Result<()> {
        let mut input = File::open(source)?;
        let output = BufWriter::new(File::create(&temp)?);
        let mut encoder = flate2::write::GzEncoder::new(output, flate2::Compression::default());
        std::io::copy(&mut input, &mut encoder)?;
        encoder.finish()?.flush()?;
        fs::rename(&temp, target)
    })();

    match result {
        Ok(()) => {
            fs::remove_file(source).map_err(|e| {
                LoggerError::io_operation(
                    "compress log file",
                    format!("Failed to remove uncompressed backup {}", source.display()),
                    e,
                )
            })?;
            Ok(())
        }
        Err(e) => {
            let _ = fs::remove_file(&temp);
            Err(LoggerError::io_operation(
                "compress log file",
                format!("Failed to compress {}", source.display()),
                e,
            ))
        }
    }
}
