//! Correlation context carried by every log entry
//!
//! This module provides:
//! - `LogContext`: named optional correlation fields plus an open metadata map
//! - `MetadataMerge`: how metadata combines when contexts are merged
//!
//! Every field is an `Option`: `None` means "absent", so the same type serves
//! as a logger's base context and as the partial context supplied per call.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Open key/value map attached to a context. Values may nest.
pub type Metadata = serde_json::Map<String, Value>;

/// Policy for combining `metadata` when a partial context is merged over a
/// base context.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetadataMerge {
    /// The override's metadata map, when present, replaces the base map whole.
    Replace,
    /// Top-level keys are combined; the override wins per key. Nested values
    /// are not merged further.
    #[default]
    Union,
}

/// Context for structured logging
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
    /// Caller-supplied event time. Serialized as `contextTimestamp` so it
    /// never collides with the entry's emission timestamp once flattened.
    #[serde(
        default,
        rename = "contextTimestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

impl LogContext {
    /// Create a new empty log context
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    #[must_use]
    pub fn with_user_id(mut self, id: impl Into<String>) -> Self {
        self.user_id = Some(id.into());
        self
    }

    #[must_use]
    pub fn with_session_id(mut self, id: impl Into<String>) -> Self {
        self.session_id = Some(id.into());
        self
    }

    #[must_use]
    pub fn with_request_id(mut self, id: impl Into<String>) -> Self {
        self.request_id = Some(id.into());
        self
    }

    #[must_use]
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = Some(operation.into());
        self
    }

    #[must_use]
    pub fn with_component(mut self, component: impl Into<String>) -> Self {
        self.component = Some(component.into());
        self
    }

    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    #[must_use]
    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = Some(environment.into());
        self
    }

    #[must_use]
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Add a single metadata field, creating the map if absent
    #[must_use]
    pub fn with_metadata<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.metadata
            .get_or_insert_with(Metadata::new)
            .insert(key.into(), value.into());
        self
    }

    /// Replace the metadata map
    #[must_use]
    pub fn with_metadata_map(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Check if no field is present
    pub fn is_empty(&self) -> bool {
        *self == LogContext::default()
    }

    /// Right-biased merge: every field present in `overrides` wins, every
    /// absent field falls back to `self`. Neither input is modified.
    pub fn merge(&self, overrides: &LogContext, policy: MetadataMerge) -> LogContext {
        LogContext {
            correlation_id: pick(&overrides.correlation_id, &self.correlation_id),
            user_id: pick(&overrides.user_id, &self.user_id),
            session_id: pick(&overrides.session_id, &self.session_id),
            request_id: pick(&overrides.request_id, &self.request_id),
            operation: pick(&overrides.operation, &self.operation),
            component: pick(&overrides.component, &self.component),
            version: pick(&overrides.version, &self.version),
            environment: pick(&overrides.environment, &self.environment),
            timestamp: overrides.timestamp.or(self.timestamp),
            metadata: merge_metadata(&self.metadata, &overrides.metadata, policy),
        }
    }
}

fn pick(preferred: &Option<String>, fallback: &Option<String>) -> Option<String> {
    preferred.as_ref().or(fallback.as_ref()).cloned()
}

fn merge_metadata(
    base: &Option<Metadata>,
    overrides: &Option<Metadata>,
    policy: MetadataMerge,
) -> Option<Metadata> {
    match (base, overrides, policy) {
        (_, Some(over), MetadataMerge::Replace) => Some(over.clone()),
        (Some(base), Some(over), MetadataMerge::Union) => {
            let mut merged = base.clone();
            for (key, value) in over {
                merged.insert(key.clone(), value.clone());
            }
            Some(merged)
        }
        (_, Some(over), MetadataMerge::Union) => Some(over.clone()),
        (base, None, _) => base.clone(),
    }
}
