//! Telemetry records and the batch posted to the collector.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Free-form event properties
pub type Properties = Map<String, Value>;

/// A single telemetry record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Unique id, used to acknowledge delivery
    pub id: String,
    /// Creation time in milliseconds since the Unix epoch
    pub timestamp: i64,
    /// Session the event belongs to
    pub session_id: String,
    /// Identified user, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Component that produced the event
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component: Option<String>,
    /// Event name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,
    /// Event properties
    #[serde(default)]
    pub properties: Properties,
}

impl Event {
    /// Create an event with a fresh id and the current time
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now().timestamp_millis(),
            session_id: session_id.into(),
            user_id: None,
            component: None,
            event: None,
            properties: Properties::new(),
        }
    }

    /// Set the event name
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.event = Some(name.into());
        self
    }

    /// Set the user id
    pub fn with_user(mut self, user_id: Option<String>) -> Self {
        self.user_id = user_id;
        self
    }

    /// Set the producing component
    pub fn with_component(mut self, component: impl Into<String>) -> Self {
        self.component = Some(component.into());
        self
    }

    /// Replace the properties
    pub fn with_properties(mut self, properties: Properties) -> Self {
        self.properties = properties;
        self
    }

    /// Add a single property
    pub fn with_property(mut self, key: impl Into<String>, value: Value) -> Self {
        self.properties.insert(key.into(), value);
        self
    }
}

/// Body posted to the collector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventBatch {
    /// Events in queue order
    pub events: Vec<Event>,
    /// Send time in milliseconds since the Unix epoch
    pub timestamp: i64,
}

impl EventBatch {
    /// Wrap events into a batch stamped with the current time
    pub fn new(events: Vec<Event>) -> Self {
        Self {
            events,
            timestamp: Utc::now().timestamp_millis(),
        }
    }

    /// Number of events in the batch
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the batch has no events
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
