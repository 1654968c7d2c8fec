//! Event types
//!
//! Immutable records published by monitors and delivered to subscribers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::SystemTime;

/// Classification of a metric event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// A metric collection pass completed
    MetricsUpdated,
    /// A metric collection pass failed
    CollectionError,
    /// A threshold was breached for its configured duration
    ThresholdExceeded,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MetricsUpdated => write!(f, "METRICS_UPDATED"),
            Self::CollectionError => write!(f, "COLLECTION_ERROR"),
            Self::ThresholdExceeded => write!(f, "THRESHOLD_EXCEEDED"),
        }
    }
}

/// Event record published to the dispatcher
#[derive(Debug, Clone, Serialize)]
pub struct MetricEvent {
    /// Event classification
    pub kind: EventKind,
    /// When the event was generated
    pub timestamp: SystemTime,
    /// Which monitor raised it
    pub source: String,
    /// Structured payload (threshold, current value, entity identifiers, ...)
    pub data: serde_json::Map<String, serde_json::Value>,
    /// Fully substituted human-readable message
    pub message: String,
}

impl MetricEvent {
    /// Create an event stamped with the current time
    pub fn new(kind: EventKind, source: impl Into<String>) -> Self {
        Self {
            kind,
            timestamp: SystemTime::now(),
            source: source.into(),
            data: serde_json::Map::new(),
            message: String::new(),
        }
    }

    /// Builder: attach a payload field
    pub fn with_data(mut self, key: &str, value: serde_json::Value) -> Self {
        self.data.insert(key.to_string(), value);
        self
    }

    /// Builder: set the message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }
}
