//! HEC event model and classification.

use crate::hec::{METRIC_EVENT_TYPE, METRIC_NAME_FIELD, METRIC_NAME_PREFIX, METRIC_VALUE_FIELD};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, HashMap};

/// One HEC event as submitted on the wire.
///
/// Metadata strings are optional; an empty string is treated the same as a
/// missing one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Epoch time in seconds, fractional part allowed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<f64>,

    /// Host that produced the event.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    /// Source of the event, typically the application name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    /// Source type of the event.
    #[serde(
        default,
        rename = "sourcetype",
        skip_serializing_if = "Option::is_none"
    )]
    pub source_type: Option<String>,

    /// Destination index.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<String>,

    /// The log body, or the literal `"metric"` for metric events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<serde_json::Value>,

    /// Dimensions, and metric values for metric events.
    #[serde(
        default,
        deserialize_with = "null_as_empty",
        skip_serializing_if = "HashMap::is_empty"
    )]
    pub fields: HashMap<String, serde_json::Value>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<HashMap<String, serde_json::Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<HashMap<String, serde_json::Value>>::deserialize(deserializer)
        .map(Option::unwrap_or_default)
}

fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|s| !s.is_empty())
}

impl Event {
    /// Host, if set and non-empty.
    #[must_use]
    pub fn host(&self) -> Option<&str> {
        non_empty(self.host.as_ref())
    }

    /// Source, if set and non-empty.
    #[must_use]
    pub fn source(&self) -> Option<&str> {
        non_empty(self.source.as_ref())
    }

    /// Source type, if set and non-empty.
    #[must_use]
    pub fn source_type(&self) -> Option<&str> {
        non_empty(self.source_type.as_ref())
    }

    /// Index, if set and non-empty.
    #[must_use]
    pub fn index(&self) -> Option<&str> {
        non_empty(self.index.as_ref())
    }

    /// Extracts the metric name → raw value pairs carried by this event.
    ///
    /// Both the multi-metric form (`"metric_name:cpu": 1.0`) and the
    /// single-metric form (`"metric_name": "cpu", "_value": 1.0`) are
    /// recognized. The result is ordered by metric name.
    #[must_use]
    pub fn metric_values(&self) -> BTreeMap<String, serde_json::Value> {
        let mut values: BTreeMap<String, serde_json::Value> = self
            .fields
            .iter()
            .filter_map(|(key, value)| {
                key.strip_prefix(METRIC_NAME_PREFIX)
                    .map(|name| (name.to_string(), value.clone()))
            })
            .collect();

        if let Some(name) = self.fields.get(METRIC_NAME_FIELD).and_then(|v| v.as_str()) {
            if let Some(value) = self.fields.get(METRIC_VALUE_FIELD) {
                values
                    .entry(name.to_string())
                    .or_insert_with(|| value.clone());
            }
        }

        values
    }

    /// Returns `true` if this event is metric shaped.
    ///
    /// An event is a metric when its `event` field is the string `"metric"`, or
    /// when it has no `event` body but carries metric values.
    #[must_use]
    pub fn is_metric(&self) -> bool {
        match &self.event {
            Some(serde_json::Value::String(kind)) => kind == METRIC_EVENT_TYPE,
            Some(serde_json::Value::Null) | None => !self.metric_values().is_empty(),
            Some(_) => false,
        }
    }

    /// Tags the event as a metric or a log event.
    #[must_use]
    pub fn classify(self) -> ClassifiedEvent {
        if self.is_metric() {
            let values = self.metric_values();
            ClassifiedEvent::Metric(MetricEvent {
                event: self,
                values,
            })
        } else {
            ClassifiedEvent::Log(LogEvent(self))
        }
    }
}

/// An event tagged by its structural shape.
#[derive(Debug, Clone, PartialEq)]
pub enum ClassifiedEvent {
    /// A metric event.
    Metric(MetricEvent),
    /// A log event.
    Log(LogEvent),
}

/// An event classified as a metric, with its values already extracted.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricEvent {
    event: Event,
    values: BTreeMap<String, serde_json::Value>,
}

impl MetricEvent {
    /// The underlying wire event.
    #[must_use]
    pub fn event(&self) -> &Event {
        &self.event
    }

    /// Metric name → raw value, ordered by name.
    #[must_use]
    pub fn values(&self) -> &BTreeMap<String, serde_json::Value> {
        &self.values
    }
}

/// An event classified as a log.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEvent(Event);

impl LogEvent {
    /// The underlying wire event.
    #[must_use]
    pub fn event(&self) -> &Event {
        &self.0
    }

    /// Consumes the wrapper, returning the wire event.
    #[must_use]
    pub fn into_event(self) -> Event {
        self.0
    }
}
