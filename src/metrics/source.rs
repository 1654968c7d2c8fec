//! Trait definitions for metric sources
//!
//! These traits abstract over OS metric acquisition to enable testing with
//! mocks. A source call may fail; the evaluation loop treats every failure
//! as "skip this check for the tick", never as a fatal condition. Optional
//! capabilities return `Ok(None)` or an empty list rather than an error.

use crate::error::MetricError;
use crate::metrics::types::{
    Bandwidth, ConnectionStats, CoreUsage, InterfaceStats, ProcessBandwidth, ProcessUsage,
    WifiStatus,
};

/// Source of CPU readings
///
/// Implementations must return promptly; a blocked source would stall its
/// evaluation loop for the tick.
pub trait CpuMetricSource: Send + Sync {
    /// Overall CPU usage percentage (user + system)
    fn overall_usage(&self) -> Result<f64, MetricError>;

    /// Per-core usage readings
    fn per_core_usage(&self) -> Result<Vec<CoreUsage>, MetricError>;

    /// Top processes by CPU usage
    ///
    /// Sources without per-process visibility return an empty list.
    fn top_processes(&self) -> Result<Vec<ProcessUsage>, MetricError> {
        Ok(Vec::new())
    }
}

/// Source of network readings
pub trait NetworkMetricSource: Send + Sync {
    /// Overall bandwidth usage
    fn bandwidth(&self) -> Result<Bandwidth, MetricError>;

    /// Per-interface counters
    fn interfaces(&self) -> Result<Vec<InterfaceStats>, MetricError>;

    /// Connection count statistics
    fn connection_stats(&self) -> Result<ConnectionStats, MetricError>;

    /// Top processes by network usage
    ///
    /// Sources without per-process visibility return an empty list.
    fn network_processes(&self) -> Result<Vec<ProcessBandwidth>, MetricError> {
        Ok(Vec::new())
    }

    /// WiFi link details
    ///
    /// Returns `Ok(None)` when the host has no WiFi link to report.
    fn wifi_details(&self) -> Result<Option<WifiStatus>, MetricError> {
        Ok(None)
    }
}
