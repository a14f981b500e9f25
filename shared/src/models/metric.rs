//! Metric data model.
//!
//! Defines the gauge `Metric` produced by the HEC converter and the
//! `MetricsBatch` container handed to metrics consumers.

use crate::models::Resource;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The numeric value of a gauge data point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    /// An integer value, from a JSON integer.
    Int(i64),
    /// A floating point value.
    Double(f64),
}

impl MetricValue {
    /// Returns the value as `f64`, widening integers.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> f64 {
        match self {
            Self::Int(v) => *v as f64,
            Self::Double(v) => *v,
        }
    }

    /// Returns the integer value if this is an integer gauge.
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            Self::Double(_) => None,
        }
    }
}

/// A single gauge data point.
///
/// # Example
///
/// ```
/// use shared::models::{Metric, MetricValue};
///
/// let metric = Metric::new("cpu.idle", MetricValue::Double(97.5))
///     .with_label("core", "0");
///
/// assert_eq!(metric.value.as_f64(), 97.5);
/// assert_eq!(metric.labels.get("core"), Some(&"0".to_string()));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    /// The metric name.
    pub name: String,

    /// The gauge value.
    pub value: MetricValue,

    /// When the value was observed; `None` if the sender gave no time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,

    /// Labels (dimensions) for the data point.
    #[serde(default)]
    pub labels: HashMap<String, String>,
}

impl Metric {
    /// Creates a new gauge data point without a timestamp.
    #[must_use]
    pub fn new(name: impl Into<String>, value: MetricValue) -> Self {
        Self {
            name: name.into(),
            value,
            timestamp: None,
            labels: HashMap::new(),
        }
    }

    /// Adds a label to the metric.
    #[must_use]
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    /// Sets the timestamp of the metric.
    #[must_use]
    pub fn with_timestamp(mut self, timestamp: Option<DateTime<Utc>>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// Metrics produced by one resource.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceMetrics {
    /// The producing resource.
    pub resource: Resource,
    /// Data points of this resource.
    pub metrics: Vec<Metric>,
}

/// A batch of metrics, the unit handed to a metrics consumer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsBatch {
    /// Resource-scoped groups of metrics.
    pub resource_metrics: Vec<ResourceMetrics>,
}

impl MetricsBatch {
    /// Creates an empty batch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a resource group.
    pub fn push(&mut self, resource_metrics: ResourceMetrics) {
        self.resource_metrics.push(resource_metrics);
    }

    /// Total number of data points across all resources.
    #[must_use]
    pub fn data_point_count(&self) -> usize {
        self.resource_metrics.iter().map(|rm| rm.metrics.len()).sum()
    }

    /// Returns `true` if the batch holds no resource groups.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resource_metrics.is_empty()
    }

    /// Iterates over all data points.
    pub fn metrics(&self) -> impl Iterator<Item = &Metric> {
        self.resource_metrics.iter().flat_map(|rm| rm.metrics.iter())
    }
}
