//! Log data model.
//!
//! Defines the `LogRecord` produced by the HEC converter and the `LogsBatch`
//! container handed to logs consumers.

use crate::models::{Attributes, Resource};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single log record.
///
/// The body keeps the shape the sender submitted: a plain string, or any
/// structured JSON value.
///
/// # Example
///
/// ```
/// use shared::models::LogRecord;
///
/// let record = LogRecord::new(serde_json::json!("user logged in"))
///     .with_name("access_combined")
///     .with_attribute("user_id", "12345");
///
/// assert_eq!(record.name.as_deref(), Some("access_combined"));
/// assert!(record.attributes.contains_key("user_id"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    /// Logical name of the record (the HEC source type).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// When the event occurred; `None` if the sender gave no time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,

    /// The log body.
    pub body: serde_json::Value,

    /// Record-level attributes.
    #[serde(default)]
    pub attributes: Attributes,
}

impl LogRecord {
    /// Creates a log record with the given body.
    #[must_use]
    pub fn new(body: serde_json::Value) -> Self {
        Self {
            name: None,
            timestamp: None,
            body,
            attributes: Attributes::new(),
        }
    }

    /// Sets the record name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the timestamp.
    #[must_use]
    pub fn with_timestamp(mut self, timestamp: Option<DateTime<Utc>>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Adds an attribute to the record.
    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        self.attributes.insert(
            key.into(),
            serde_json::to_value(value).unwrap_or(serde_json::Value::Null),
        );
        self
    }
}

/// Log records produced by one resource.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceLogs {
    /// The producing resource.
    pub resource: Resource,
    /// Log records of this resource.
    pub log_records: Vec<LogRecord>,
}

/// A batch of logs, the unit handed to a logs consumer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogsBatch {
    /// Resource-scoped groups of log records.
    pub resource_logs: Vec<ResourceLogs>,
}

impl LogsBatch {
    /// Creates an empty batch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a resource group.
    pub fn push(&mut self, resource_logs: ResourceLogs) {
        self.resource_logs.push(resource_logs);
    }

    /// Total number of log records across all resources.
    #[must_use]
    pub fn log_record_count(&self) -> usize {
        self.resource_logs.iter().map(|rl| rl.log_records.len()).sum()
    }

    /// Returns `true` if the batch holds no resource groups.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resource_logs.is_empty()
    }

    /// Iterates over all log records.
    pub fn log_records(&self) -> impl Iterator<Item = &LogRecord> {
        self.resource_logs
            .iter()
            .flat_map(|rl| rl.log_records.iter())
    }
}
