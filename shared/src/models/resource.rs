//! Resource data model.
//!
//! A `Resource` describes the entity that produced a group of telemetry. Its
//! attributes are attached at the group level, not to individual data points.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Attribute map shared by resources, log records and metric labels.
pub type Attributes = HashMap<String, serde_json::Value>;

/// The producer of a group of metrics or log records.
///
/// # Example
///
/// ```
/// use shared::models::Resource;
///
/// let mut resource = Resource::new();
/// resource.insert_str("host.name", "web-01");
/// resource.insert_str("host.name", "web-02");
///
/// // Inserting never overwrites an existing key.
/// assert_eq!(resource.get_str("host.name"), Some("web-01"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    /// Resource-level attributes.
    #[serde(default)]
    pub attributes: Attributes,
}

impl Resource {
    /// Creates a resource with no attributes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a string attribute if the key is not present yet.
    ///
    /// Returns `true` if the attribute was inserted.
    pub fn insert_str(&mut self, key: impl Into<String>, value: impl Into<String>) -> bool {
        let key = key.into();
        if self.attributes.contains_key(&key) {
            return false;
        }
        self.attributes
            .insert(key, serde_json::Value::String(value.into()));
        true
    }

    /// Returns the attribute as a string slice, if present and a string.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(|v| v.as_str())
    }

    /// Adds a string attribute, builder style.
    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert_str(key, value);
        self
    }
}
