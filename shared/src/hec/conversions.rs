//! Conversions between HEC events and the internal batch model.
//!
//! Every event becomes its own resource group. HEC metadata (`host`, `source`,
//! `sourcetype`, `index`) is mapped to resource attributes, then the caller's
//! resource customizer runs on the group.

use crate::hec::{Event, LogEvent, MetricEvent, METRIC_NAME_FIELD, METRIC_VALUE_FIELD};
use crate::models::{
    LogRecord, LogsBatch, Metric, MetricValue, MetricsBatch, Resource, ResourceLogs,
    ResourceMetrics,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Resource attribute keys used for HEC metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HecToOtelAttrs {
    /// Key for the event `source`.
    pub source: String,
    /// Key for the event `sourcetype`.
    #[serde(rename = "sourcetype")]
    pub source_type: String,
    /// Key for the event `index`.
    pub index: String,
    /// Key for the event `host`.
    pub host: String,
}

impl Default for HecToOtelAttrs {
    fn default() -> Self {
        Self {
            source: "com.splunk.source".to_string(),
            source_type: "com.splunk.sourcetype".to_string(),
            index: "com.splunk.index".to_string(),
            host: "host.name".to_string(),
        }
    }
}

/// Result of converting metric events.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricsConversion {
    /// The converted metrics.
    pub batch: MetricsBatch,
    /// Number of metric values that could not be turned into a number.
    pub dropped: usize,
}

/// Converts epoch seconds to a timestamp with nanosecond precision.
#[allow(clippy::cast_possible_truncation)]
fn seconds_to_datetime(seconds: Option<f64>) -> Option<DateTime<Utc>> {
    seconds
        .filter(|s| s.is_finite())
        .map(|s| DateTime::from_timestamp_nanos((s * 1e9) as i64))
}

/// Builds the resource for one event from its HEC metadata.
fn event_resource(event: &Event, attrs: &HecToOtelAttrs) -> Resource {
    let mut resource = Resource::new();
    let metadata = [
        (&attrs.host, event.host()),
        (&attrs.source, event.source()),
        (&attrs.source_type, event.source_type()),
        (&attrs.index, event.index()),
    ];
    for (key, value) in metadata {
        if let Some(value) = value {
            resource.insert_str(key.as_str(), value);
        }
    }
    resource
}

/// Converts a raw HEC metric value into a gauge value.
///
/// JSON integers stay integers, other numbers become doubles, and strings are
/// parsed as doubles on a best effort basis.
fn metric_value(value: &serde_json::Value) -> Option<MetricValue> {
    match value {
        serde_json::Value::Number(n) => n
            .as_i64()
            .map(MetricValue::Int)
            .or_else(|| n.as_f64().map(MetricValue::Double)),
        serde_json::Value::String(s) => s.parse::<f64>().ok().map(MetricValue::Double),
        _ => None,
    }
}

/// Builds data point labels from the event dimensions.
fn metric_labels(fields: &HashMap<String, serde_json::Value>) -> HashMap<String, String> {
    fields
        .iter()
        .filter(|(key, _)| !key.starts_with(METRIC_NAME_FIELD) && *key != METRIC_VALUE_FIELD)
        .filter_map(|(key, value)| {
            let key = key.trim();
            match value {
                _ if key.is_empty() => None,
                serde_json::Value::Null => None,
                serde_json::Value::String(s) => Some((key.to_string(), s.clone())),
                other => Some((key.to_string(), other.to_string())),
            }
        })
        .collect()
}

/// Folds metric events into one metrics batch.
///
/// # Arguments
///
/// * `events` - Events already classified as metrics
/// * `customizer` - Applied to the resource of every produced group
/// * `attrs` - Resource attribute keys for HEC metadata
pub fn hec_to_metrics<I, F>(events: I, customizer: F, attrs: &HecToOtelAttrs) -> MetricsConversion
where
    I: IntoIterator<Item = MetricEvent>,
    F: Fn(&mut Resource),
{
    let mut conversion = MetricsConversion::default();

    for metric_event in events {
        let event = metric_event.event();
        let mut resource = event_resource(event, attrs);
        customizer(&mut resource);

        let timestamp = seconds_to_datetime(event.time);
        let labels = metric_labels(&event.fields);

        let mut metrics = Vec::with_capacity(metric_event.values().len());
        for (name, raw) in metric_event.values() {
            let Some(value) = metric_value(raw) else {
                conversion.dropped += 1;
                tracing::debug!(metric = %name, value = %raw, "Cannot convert metric value");
                continue;
            };

            let mut metric = Metric::new(name.clone(), value).with_timestamp(timestamp);
            metric.labels.clone_from(&labels);
            metrics.push(metric);
        }

        conversion.batch.push(ResourceMetrics { resource, metrics });
    }

    conversion
}

/// Folds log events into one logs batch.
///
/// # Arguments
///
/// * `events` - Events already classified as logs
/// * `customizer` - Applied to the resource of every produced group
/// * `attrs` - Resource attribute keys for HEC metadata
pub fn hec_to_logs<I, F>(events: I, customizer: F, attrs: &HecToOtelAttrs) -> LogsBatch
where
    I: IntoIterator<Item = LogEvent>,
    F: Fn(&mut Resource),
{
    let mut batch = LogsBatch::new();

    for log_event in events {
        let event = log_event.into_event();
        let mut resource = event_resource(&event, attrs);
        customizer(&mut resource);

        let mut record = LogRecord::new(event.event.unwrap_or(serde_json::Value::Null))
            .with_timestamp(seconds_to_datetime(event.time));
        if let Some(source_type) = event.source_type.filter(|s| !s.is_empty()) {
            record = record.with_name(source_type);
        }
        record.attributes = event.fields;

        batch.push(ResourceLogs {
            resource,
            log_records: vec![record],
        });
    }

    batch
}

#[path = "conversions_test.rs"]
mod conversions_test;
