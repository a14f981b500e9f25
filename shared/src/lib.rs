//! HEC Gateway Shared Library
//!
//! This crate contains the telemetry batch model, the HTTP Event Collector
//! (HEC) wire format and the conversions between the two, shared by the
//! receiver and the command-line tool.
//!
//! # Modules
//!
//! - [`models`] - Internal metrics and logs batch model
//! - [`hec`] - HEC event decoding, classification and conversion
//! - [`consumer`] - Downstream consumer traits and built-in consumers
//!
//! # Example
//!
//! ```
//! use shared::hec::{decode_events, hec_to_logs, ClassifiedEvent, HecToOtelAttrs};
//!
//! let body = br#"{"event": "User logged in", "host": "auth-01"}"#;
//!
//! let logs: Vec<_> = decode_events(&body[..])
//!     .filter_map(|event| match event.unwrap().classify() {
//!         ClassifiedEvent::Log(log) => Some(log),
//!         ClassifiedEvent::Metric(_) => None,
//!     })
//!     .collect();
//!
//! let batch = hec_to_logs(logs, |_| {}, &HecToOtelAttrs::default());
//! assert_eq!(batch.log_record_count(), 1);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod consumer;
pub mod hec;
pub mod models;

/// Re-export common dependencies for convenience.
pub use async_trait::async_trait;
pub use chrono;
pub use serde;
pub use serde_json;
