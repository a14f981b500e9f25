//! Streaming decoder for concatenated HEC events.
//!
//! HEC senders batch events by writing JSON objects back to back, without an
//! enclosing array or separators. The decoder yields them one at a time.

use crate::hec::{DecodeError, Event};
use serde_json::de::IoRead;
use serde_json::{Map, StreamDeserializer, Value};
use std::io::Read;

/// Lazy iterator over the events of a request body.
///
/// Yields `Err` at the first malformed object and ends afterwards.
pub struct EventStream<R: Read> {
    inner: StreamDeserializer<'static, IoRead<R>, Map<String, Value>>,
    failed: bool,
}

/// Decodes a stream of concatenated JSON objects into events.
///
/// Only JSON objects are accepted at the top level; arrays, strings or numbers
/// are reported as errors.
pub fn decode_events<R: Read>(reader: R) -> EventStream<R> {
    EventStream {
        inner: serde_json::Deserializer::from_reader(reader).into_iter(),
        failed: false,
    }
}

impl<R: Read> Iterator for EventStream<R> {
    type Item = Result<Event, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        let decoded = self
            .inner
            .next()?
            .and_then(|object| serde_json::from_value(Value::Object(object)))
            .map_err(DecodeError::from);

        if decoded.is_err() {
            self.failed = true;
        }
        Some(decoded)
    }
}
