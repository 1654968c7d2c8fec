//! Metric source abstraction
//!
//! Snapshot types and the traits through which the alerting engine pulls
//! readings. Actual OS metric acquisition lives outside this crate; callers
//! supply an implementation of the source traits.

pub mod sim;
pub mod source;
pub mod types;

pub use source::{CpuMetricSource, NetworkMetricSource};
pub use types::{
    Bandwidth, ConnectionStats, CoreUsage, InterfaceStats, ProcessBandwidth, ProcessUsage,
    WifiStatus,
};
