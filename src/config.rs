//! Logger configuration
//!
//! `LoggerConfig` describes a complete pipeline: level, base context and the
//! three built-in transports. It can be deserialized from any serde format,
//! read from environment variables, or built in code, and then turned into a
//! root logger with [`LoggerConfig::build_logger`].

use crate::core::{
    LogContext, LogLevel, LoggerError, MetadataMerge, OutputFormat, Result, StructuredLogger,
};
use crate::transports::{ConsoleTransport, FileTransport, RotationPolicy};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_ENVIRONMENT: &str = "development";
pub const DEFAULT_FILE_PATH: &str = "logs/app.log";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    pub enabled: bool,
    /// `None` picks pretty in development and JSON elsewhere
    pub format: Option<OutputFormat>,
    pub colors: bool,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            format: None,
            colors: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub enabled: bool,
    pub path: PathBuf,
    pub max_file_size: u64,
    pub max_files: usize,
    pub compress: bool,
}

impl Default for FileConfig {
    fn default() -> Self {
        let rotation = RotationPolicy::default();
        Self {
            enabled: false,
            path: PathBuf::from(DEFAULT_FILE_PATH),
            max_file_size: rotation.max_file_size,
            max_files: rotation.max_files,
            compress: rotation.compress,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    pub enabled: bool,
    pub endpoint: Option<String>,
    /// Sent as `Authorization: Bearer <token>`
    pub token: Option<String>,
    pub headers: Vec<(String, String)>,
    pub batch_size: usize,
    pub flush_interval_ms: u64,
    pub timeout_ms: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: None,
            token: None,
            headers: Vec::new(),
            batch_size: crate::transports::remote::DEFAULT_BATCH_SIZE,
            flush_interval_ms: crate::transports::remote::DEFAULT_FLUSH_INTERVAL.as_millis() as u64,
            timeout_ms: 10_000,
        }
    }
}

/// Configuration for a complete logging pipeline
///
/// # Example
///
/// ```
/// use rust_structured_logger::config::LoggerConfig;
/// use rust_structured_logger::LogLevel;
///
/// let config = LoggerConfig::from_lookup(|key| match key {
///     "LOG_LEVEL" => Some("debug".to_string()),
///     "APP_ENV" => Some("production".to_string()),
///     _ => None,
/// })
/// .unwrap();
/// assert_eq!(config.level, LogLevel::Debug);
///
/// let logger = config.build_logger().unwrap();
/// logger.info("configured");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    pub level: LogLevel,
    pub environment: String,
    pub version: Option<String>,
    pub service_name: Option<String>,
    pub metadata_merge: MetadataMerge,
    pub console: ConsoleConfig,
    pub file: FileConfig,
    pub remote: RemoteConfig,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            environment: DEFAULT_ENVIRONMENT.to_string(),
            version: None,
            service_name: None,
            metadata_merge: MetadataMerge::default(),
            console: ConsoleConfig::default(),
            file: FileConfig::default(),
            remote: RemoteConfig::default(),
        }
    }
}

impl LoggerConfig {
    /// Read configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`; unset keys keep their defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(level) = get("LOG_LEVEL") {
            config.level = LogLevel::from_str(&level).map_err(|e| LoggerError::config("LOG_LEVEL", e))?;
        }
        if let Some(env) = get("APP_ENV") {
            config.environment = env;
        }
        config.version = get("APP_VERSION");
        config.service_name = get("SERVICE_NAME");

        if let Some(v) = get("LOG_CONSOLE") {
            config.console.enabled = parse_bool("LOG_CONSOLE", &v)?;
        }
        if let Some(v) = get("LOG_FORMAT") {
            config.console.format =
                Some(OutputFormat::from_str(&v).map_err(|e| LoggerError::config("LOG_FORMAT", e))?);
        }
        if let Some(v) = get("LOG_COLORS") {
            config.console.colors = parse_bool("LOG_COLORS", &v)?;
        }

        if let Some(v) = get("LOG_FILE") {
            config.file.enabled = parse_bool("LOG_FILE", &v)?;
        }
        if let Some(v) = get("LOG_FILE_PATH") {
            config.file.path = PathBuf::from(v);
        }
        if let Some(v) = get("LOG_MAX_FILE_SIZE") {
            config.file.max_file_size = parse_number("LOG_MAX_FILE_SIZE", &v)?;
        }
        if let Some(v) = get("LOG_MAX_FILES") {
            config.file.max_files = parse_number("LOG_MAX_FILES", &v)?;
        }
        if let Some(v) = get("LOG_FILE_COMPRESS") {
            config.file.compress = parse_bool("LOG_FILE_COMPRESS", &v)?;
        }

        if let Some(v) = get("LOG_REMOTE") {
            config.remote.enabled = parse_bool("LOG_REMOTE", &v)?;
        }
        config.remote.endpoint = get("LOG_REMOTE_ENDPOINT");
        config.remote.token = get("LOG_REMOTE_TOKEN");
        if let Some(v) = get("LOG_BUFFER_SIZE") {
            config.remote.batch_size = parse_number("LOG_BUFFER_SIZE", &v)?;
        }
        if let Some(v) = get("LOG_FLUSH_INTERVAL") {
            config.remote.flush_interval_ms = parse_number("LOG_FLUSH_INTERVAL", &v)?;
        }

        Ok(config)
    }

    /// Console format after applying the environment default
    pub fn console_format(&self) -> OutputFormat {
        self.console.format.unwrap_or(if self.environment == DEFAULT_ENVIRONMENT {
            OutputFormat::Pretty
        } else {
            OutputFormat::Json
        })
    }

    /// Base context stamped on every entry
    pub fn base_context(&self) -> LogContext {
        let mut context = LogContext::new().with_environment(self.environment.clone());
        if let Some(ref version) = self.version {
            context = context.with_version(version.clone());
        }
        if let Some(ref service) = self.service_name {
            context = context.with_component(service.clone());
        }
        context
    }

    pub fn validate(&self) -> Result<()> {
        if self.file.enabled && self.file.path.as_os_str().is_empty() {
            return Err(LoggerError::config("file", "path must not be empty"));
        }
        if self.remote.enabled {
            if self.remote.endpoint.as_deref().map_or(true, |e| e.trim().is_empty()) {
                return Err(LoggerError::config("remote", "endpoint is required"));
            }
            if self.remote.batch_size == 0 {
                return Err(LoggerError::config("remote", "batch size must be positive"));
            }
            if self.remote.flush_interval_ms == 0 {
                return Err(LoggerError::config("remote", "flush interval must be positive"));
            }
            if cfg!(not(feature = "remote")) {
                return Err(LoggerError::config(
                    "remote",
                    "built without the `remote` feature",
                ));
            }
        }
        Ok(())
    }

    /// Validate and wire transports in the order console, file, remote
    pub fn build_logger(&self) -> Result<StructuredLogger> {
        self.validate()?;

        let mut builder = StructuredLogger::builder()
            .min_level(self.level)
            .context(self.base_context())
            .metadata_merge(self.metadata_merge);

        if self.console.enabled {
            builder = builder.transport(
                ConsoleTransport::new()
                    .with_output_format(self.console_format())
                    .with_colors(self.console.colors),
            );
        }

        if self.file.enabled {
            let policy = RotationPolicy::new()
                .with_max_size(self.file.max_file_size)
                .with_max_files(self.file.max_files)
                .with_compression(self.file.compress);
            builder = builder.transport(FileTransport::with_policy(&self.file.path, policy)?);
        }

        #[cfg(feature = "remote")]
        if self.remote.enabled {
            builder = builder.transport(self.remote_transport()?);
        }

        Ok(builder.build())
    }

    #[cfg(feature = "remote")]
    fn remote_transport(&self) -> Result<crate::transports::RemoteTransport> {
        use crate::transports::{HttpBatchSender, RemoteOptions, RemoteTransport};
        use std::time::Duration;

        let endpoint = self
            .remote
            .endpoint
            .clone()
            .ok_or_else(|| LoggerError::config("remote", "endpoint is required"))?;
        let mut sender =
            HttpBatchSender::with_timeout(endpoint, Duration::from_millis(self.remote.timeout_ms))?;
        if let Some(ref token) = self.remote.token {
            sender = sender.with_bearer_token(token);
        }
        if let Some(ref service) = self.service_name {
            sender = sender.with_header("X-Service-Name", service.clone());
        }
        for (name, value) in &self.remote.headers {
            sender = sender.with_header(name.clone(), value.clone());
        }

        let options = RemoteOptions::default()
            .with_batch_size(self.remote.batch_size)
            .with_flush_interval(Duration::from_millis(self.remote.flush_interval_ms));
        RemoteTransport::new(sender, options)
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(LoggerError::config(key, format!("expected a boolean, got '{}'", value))),
    }
}

fn parse_number<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| LoggerError::config(key, format!("expected a number, got '{}'", value)))
}
