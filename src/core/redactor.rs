//! Sensitive data redaction
//!
//! The [`Redactor`] scrubs an entry before it reaches any transport:
//!
//! - message text: `password=...`, `token: ...`, `key=...` style pairs keep
//!   their key and have the value replaced with [`REDACTED`]
//! - metadata: any key whose lowercase form contains a sensitive substring has
//!   its value replaced, recursively through nested maps and arrays
//!
//! Redaction is idempotent: scrubbing an already scrubbed entry changes nothing.

use super::log_context::Metadata;
use super::log_entry::LogEntry;
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

/// Replacement marker for sensitive values
pub const REDACTED: &str = "[REDACTED]";

/// Default maximum nesting depth walked inside metadata
pub const DEFAULT_MAX_DEPTH: usize = 10;

/// Default sensitive key substrings, matched against lowercased keys
pub const DEFAULT_SENSITIVE_KEYS: &[&str] = &[
    "password",
    "token",
    "secret",
    "key",
    "authorization",
    "creditcard",
    "ssn",
    "email",
    "phone",
];

static DEFAULT_MESSAGE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(password|token|key)\s*[=:]\s*([^\s,;&]+)")
        .expect("valid message redaction pattern")
});

#[derive(Debug, Clone)]
pub struct Redactor {
    sensitive_keys: Vec<String>,
    message_pattern: Regex,
    max_depth: usize,
}

impl Default for Redactor {
    fn default() -> Self {
        Self {
            sensitive_keys: DEFAULT_SENSITIVE_KEYS.iter().map(|k| k.to_string()).collect(),
            message_pattern: DEFAULT_MESSAGE_PATTERN.clone(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl Redactor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sensitive key substring (case-insensitive)
    #[must_use]
    pub fn with_sensitive_key(mut self, key: impl Into<String>) -> Self {
        let key = key.into().to_lowercase();
        if !self.sensitive_keys.contains(&key) {
            self.sensitive_keys.push(key);
        }
        self
    }

    /// Replace the message pattern. When capture group 1 matches it is kept as
    /// the key and the match becomes `<key>=[REDACTED]`; otherwise the whole
    /// match becomes `[REDACTED]`.
    #[must_use]
    pub fn with_message_pattern(mut self, pattern: Regex) -> Self {
        self.message_pattern = pattern;
        self
    }

    #[must_use]
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Produce a scrubbed copy of `entry`
    pub fn sanitize(&self, entry: &LogEntry) -> LogEntry {
        let mut clean = entry.clone();
        clean.message = self.redact_message(&entry.message);
        if let Some(error) = clean.error.as_mut() {
            error.message = self.redact_message(&error.message);
            error.stack = error.stack.as_deref().map(|stack| self.redact_message(stack));
        }
        if let Some(metadata) = entry.context.metadata.as_ref() {
            clean.context.metadata = Some(self.redact_metadata(metadata));
        }
        clean
    }

    pub fn redact_message(&self, message: &str) -> String {
        self.message_pattern
            .replace_all(message, |caps: &regex::Captures<'_>| match caps.get(1) {
                Some(key) => format!("{}={}", key.as_str(), REDACTED),
                None => REDACTED.to_string(),
            })
            .into_owned()
    }

    pub fn redact_metadata(&self, metadata: &Metadata) -> Metadata {
        self.redact_map(metadata, 0)
    }

    pub fn is_sensitive_key(&self, key: &str) -> bool {
        let lower = key.to_lowercase();
        self.sensitive_keys.iter().any(|s| lower.contains(s.as_str()))
    }

    fn redact_map(&self, map: &Metadata, depth: usize) -> Metadata {
        map.iter()
            .map(|(key, value)| {
                let value = if self.is_sensitive_key(key) {
                    Value::String(REDACTED.to_string())
                } else {
                    self.redact_value(value, depth + 1)
                };
                (key.clone(), value)
            })
            .collect()
    }

    fn redact_value(&self, value: &Value, depth: usize) -> Value {
        match value {
            // Past the depth bound a container is not walked; it is replaced
            // so nothing unchecked leaves the process.
            Value::Object(_) | Value::Array(_) if depth >= self.max_depth => {
                Value::String(REDACTED.to_string())
            }
            Value::Object(map) => Value::Object(self.redact_map(map, depth)),
            Value::Array(items) => Value::Array(
                items
                    .iter()
                    .map(|item| self.redact_value(item, depth + 1))
                    .collect(),
            ),
            other => other.clone(),
        }
    }
}
