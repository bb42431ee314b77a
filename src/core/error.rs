//! Error types for the logging pipeline

pub type Result<T> = std::result::Result<T, LoggerError>;

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// A named filesystem or thread operation failed, e.g. creating the log directory
    #[error("IO error while {operation}: {message}")]
    IoOperation {
        operation: String,
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Write or flush on an open log file failed
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// An entry could not be serialized to a JSON line
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// The file writer's line queue or the remote batch queue is at capacity
    #[error("Transport queue full: {current}/{max} pending")]
    QueueFull { current: usize, max: usize },

    /// `log()` after `close()`
    #[error("Transport '{transport}' is closed")]
    TransportClosed { transport: String },

    /// Rejected builder options or `LOG_*` environment values
    #[error("Invalid configuration for {component}: {message}")]
    InvalidConfiguration { component: String, message: String },

    /// Opening the log file or its writer thread failed
    #[error("File transport error for '{path}': {message}")]
    FileTransportError { path: String, message: String },

    /// Shifting, renaming or compressing backups failed
    #[error("File rotation failed for '{path}': {message}")]
    FileRotationError { path: String, message: String },

    /// Another transport or process holds the log file
    #[error("Failed to acquire file lock on '{path}'")]
    FileLockError { path: String },

    /// The collector rejected a batch or could not be reached
    #[error("Remote delivery to '{endpoint}' failed: {message}")]
    RemoteDelivery { endpoint: String, message: String },

    /// A transport worker thread is gone
    #[error("Failed to hand entry to transport worker")]
    ChannelSendError,

    /// Shutdown requested through a logger derived with `with_context`
    #[error("Only the root logger may close shared transports")]
    DerivedLoggerShutdown,

    /// Failures with no structured variant, such as a panicked worker
    #[error("{0}")]
    Other(String),
}

impl LoggerError {
    pub fn io_operation(
        operation: impl Into<String>,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        LoggerError::IoOperation {
            operation: operation.into(),
            message: message.into(),
            source,
        }
    }

    pub fn queue_full(current: usize, max: usize) -> Self {
        LoggerError::QueueFull { current, max }
    }

    pub fn closed(transport: impl Into<String>) -> Self {
        LoggerError::TransportClosed {
            transport: transport.into(),
        }
    }

    /// `component` names the transport or config section that rejected the value
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::InvalidConfiguration {
            component: component.into(),
            message: message.into(),
        }
    }

    pub fn file_transport(path: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::FileTransportError {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn file_rotation(path: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::FileRotationError {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn file_lock(path: impl Into<String>) -> Self {
        LoggerError::FileLockError { path: path.into() }
    }

    pub fn remote_delivery(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::RemoteDelivery {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    pub fn other<S: Into<String>>(msg: S) -> Self {
        LoggerError::Other(msg.into())
    }
}
