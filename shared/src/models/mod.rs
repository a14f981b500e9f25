//! Internal telemetry model.
//!
//! This module contains the protocol-agnostic batch containers that converted
//! HEC events are accumulated into before they are handed to a consumer.

pub mod log;
pub mod metric;
pub mod resource;

pub use log::{LogRecord, LogsBatch, ResourceLogs};
pub use metric::{Metric, MetricValue, MetricsBatch, ResourceMetrics};
pub use resource::{Attributes, Resource};
