//! Output format configuration for log entries
//!
//! - Json: single-line JSON, the production format
//! - Pretty: human-readable line for development

use super::log_entry::{format_timestamp, LogEntry};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Number of correlation id characters shown in pretty output
pub const SHORT_ID_LEN: usize = 8;

/// Output format for log entries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// JSON format for machine processing
    ///
    /// Example: `{"timestamp":"2025-01-08T10:30:45.123Z","level":"INFO","message":"Request processed",...}`
    #[default]
    Json,

    /// Human-readable format
    ///
    /// Example: `2025-01-08T10:30:45.123Z [INFO] [3f2a9c1e] [api] Request processed (12.40ms)`
    Pretty,
}

impl OutputFormat {
    /// Format a log entry according to this output format
    pub fn format(&self, entry: &LogEntry, use_colors: bool) -> String {
        match self {
            OutputFormat::Json => format_json(entry),
            OutputFormat::Pretty => format_pretty(entry, use_colors),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "pretty" | "text" => Ok(OutputFormat::Pretty),
            _ => Err(format!("Invalid output format: '{}'", s)),
        }
    }
}

fn format_json(entry: &LogEntry) -> String {
    entry
        .to_json()
        .unwrap_or_else(|e| format!(r#"{{"level":"{}","serializationError":"{}"}}"#, entry.level, e))
}

/// `<timestamp> [<LEVEL>] [<short id>] [<component>] <message> (<duration>ms)`
///
/// Segments for absent fields are left out. Error name, message and stack
/// follow on separate lines.
fn format_pretty(entry: &LogEntry, use_colors: bool) -> String {
    let level = if use_colors {
        entry.level.to_str().color(entry.level.color_code()).to_string()
    } else {
        entry.level.to_str().to_string()
    };

    let mut line = format!("{} [{}]", format_timestamp(&entry.timestamp), level);

    if let Some(ref id) = entry.context.correlation_id {
        let short: String = id.chars().take(SHORT_ID_LEN).collect();
        line.push_str(&format!(" [{}]", short));
    }
    if let Some(ref component) = entry.context.component {
        line.push_str(&format!(" [{}]", component));
    }
    line.push(' ');
    line.push_str(&entry.message);
    if let Some(duration) = entry.duration {
        line.push_str(&format!(" ({:.2}ms)", duration));
    }

    if let Some(ref error) = entry.error {
        line.push_str(&format!("\n  {}: {}", error.name, error.message));
        if let Some(ref stack) = error.stack {
            for frame in stack.lines() {
                line.push_str("\n    ");
                line.push_str(frame);
            }
        }
    }

    line
}
