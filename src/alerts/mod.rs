//! Threshold alerting
//!
//! Duration-gated threshold evaluation with per-entity state tracking: a
//! threshold must be continuously breached for its configured duration
//! before one alert fires, and no further alert fires until the condition
//! recovers and breaches again.

pub mod config;
pub mod notifier;
pub mod registry;
pub mod tracker;
pub mod types;

pub use config::{AlertConfig, AlertSettings, ThresholdEntry};
pub use notifier::{AlertNotifier, NotificationFanout, TerminalNotifier};
pub use registry::ThresholdRegistry;
pub use tracker::{AlertTracker, SampleHistory, StateKey};
pub use types::{
    ActiveAlert, AlertKind, AlertSeverity, AlertState, Direction, EntityContext, EntityKey,
    FiredAlert, MetricKey, ThresholdConfig,
};
