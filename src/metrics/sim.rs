//! Simulated metric source
//!
//! A deterministic source that produces slowly varying readings, used by
//! `metricwatch watch --simulate` to exercise the alerting engine without an
//! OS-specific collector.

use crate::error::MetricError;
use crate::metrics::source::{CpuMetricSource, NetworkMetricSource};
use crate::metrics::types::{
    Bandwidth, ConnectionStats, CoreUsage, InterfaceStats, ProcessBandwidth, ProcessUsage,
    WifiStatus,
};

use std::time::Instant;

/// Deterministic simulated source for demo runs
///
/// Readings follow a triangle wave over a fixed period so that thresholds
/// are periodically breached and recovered.
#[derive(Debug)]
pub struct SimulatedSource {
    started: Instant,
    cores: u32,
    /// Wave period in seconds
    period_secs: f64,
}

impl SimulatedSource {
    pub fn new(cores: u32) -> Self {
        Self {
            started: Instant::now(),
            cores,
            period_secs: 240.0,
        }
    }

    /// Position in [0, 1] along the triangle wave
    fn phase(&self) -> f64 {
        let elapsed = self.started.elapsed().as_secs_f64();
        let t = (elapsed % self.period_secs) / self.period_secs;
        if t < 0.5 {
            t * 2.0
        } else {
            2.0 - t * 2.0
        }
    }
}

impl Default for SimulatedSource {
    fn default() -> Self {
        Self::new(4)
    }
}

impl CpuMetricSource for SimulatedSource {
    fn overall_usage(&self) -> Result<f64, MetricError> {
        Ok(20.0 + 80.0 * self.phase())
    }

    fn per_core_usage(&self) -> Result<Vec<CoreUsage>, MetricError> {
        let base = 20.0 + 80.0 * self.phase();
        Ok((0..self.cores)
            .map(|core_id| CoreUsage {
                core_id,
                // Stagger the cores so only some of them breach at a time
                usage: (base - 10.0 * core_id as f64).clamp(0.0, 100.0),
            })
            .collect())
    }

    fn top_processes(&self) -> Result<Vec<ProcessUsage>, MetricError> {
        Ok(vec![
            ProcessUsage {
                pid: 4242,
                name: "simd-worker".to_string(),
                cpu_percent: 30.0 + 60.0 * self.phase(),
            },
            ProcessUsage {
                pid: 517,
                name: "idle-helper".to_string(),
                cpu_percent: 2.0,
            },
        ])
    }
}

impl NetworkMetricSource for SimulatedSource {
    fn bandwidth(&self) -> Result<Bandwidth, MetricError> {
        let total = 90_000_000.0 * self.phase();
        Ok(Bandwidth {
            rx_bytes_per_sec: total * 0.7,
            tx_bytes_per_sec: total * 0.3,
        })
    }

    fn interfaces(&self) -> Result<Vec<InterfaceStats>, MetricError> {
        Ok(vec![InterfaceStats {
            name: "sim0".to_string(),
            active: true,
            bandwidth_bytes_per_sec: 90_000_000.0 * self.phase(),
            errors: 0,
        }])
    }

    fn connection_stats(&self) -> Result<ConnectionStats, MetricError> {
        let total = (200.0 + 1_200.0 * self.phase()) as u64;
        Ok(ConnectionStats {
            tcp: total * 3 / 4,
            udp: total / 4,
            total,
            established: total / 2,
            listening: 30,
        })
    }

    fn network_processes(&self) -> Result<Vec<ProcessBandwidth>, MetricError> {
        Ok(vec![ProcessBandwidth {
            name: "simd-sync".to_string(),
            bytes_per_sec: 15_000_000.0 * self.phase(),
        }])
    }

    fn wifi_details(&self) -> Result<Option<WifiStatus>, MetricError> {
        Ok(Some(WifiStatus {
            connected: true,
            // Swings between -50 dBm (good) and -85 dBm (poor)
            signal_strength: -50.0 - 35.0 * self.phase(),
            ssid: Some("simnet".to_string()),
        }))
    }
}
