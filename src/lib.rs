//! metricwatch - threshold-based system metrics alerting
//!
//! This library provides duration-gated threshold evaluation over CPU and
//! network readings, with per-entity alert state tracking and asynchronous
//! event delivery.
//!
//! # Modules
//!
//! - [`alerts`]: Threshold definitions, the alert state machine, notifiers
//! - [`cli`]: Command-line interface definitions
//! - [`commands`]: Command handlers
//! - [`error`]: Error types
//! - [`events`]: Event types and the dispatcher
//! - [`metrics`]: Metric snapshot types and source traits
//! - [`monitors`]: Background evaluation loops

pub mod alerts;
pub mod cli;
pub mod commands;
pub mod error;
pub mod events;
pub mod metrics;
pub mod monitors;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use error::{AppError, Result};
