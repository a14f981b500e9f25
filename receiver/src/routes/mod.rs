//! HTTP route definitions.
//!
//! This module organizes the HTTP routes of the HEC receiver.

mod hec;

pub use hec::{hec_routes, route_events, RequestError, RoutedEvents};
