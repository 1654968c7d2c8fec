//! Event system
//!
//! Defines metric events and the dispatcher that delivers them to
//! subscribers on a background worker.

pub mod dispatcher;
pub mod types;

pub use dispatcher::{EventDispatcher, EventObserver, Subscription};
pub use types::{EventKind, MetricEvent};
