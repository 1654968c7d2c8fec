//! Mock metric sources for testing
//!
//! In-memory implementations of the metric source traits with setters for
//! every reading and per-check failure injection.

use crate::error::MetricError;
use crate::metrics::{
    Bandwidth, ConnectionStats, CoreUsage, CpuMetricSource, InterfaceStats, NetworkMetricSource,
    ProcessBandwidth, ProcessUsage, WifiStatus,
};

use std::sync::Mutex;

/// Mock CPU metric source with configurable readings
pub struct MockCpuSource {
    overall: Mutex<f64>,
    cores: Mutex<Vec<CoreUsage>>,
    processes: Mutex<Vec<ProcessUsage>>,
    fail_overall: Mutex<bool>,
    fail_cores: Mutex<bool>,
}

impl MockCpuSource {
    pub fn new() -> Self {
        Self {
            overall: Mutex::new(0.0),
            cores: Mutex::new(Vec::new()),
            processes: Mutex::new(Vec::new()),
            fail_overall: Mutex::new(false),
            fail_cores: Mutex::new(false),
        }
    }

    pub fn set_overall_usage(&self, usage: f64) {
        *self.overall.lock().unwrap() = usage;
    }

    pub fn set_core_usage(&self, cores: Vec<(u32, f64)>) {
        *self.cores.lock().unwrap() = cores
            .into_iter()
            .map(|(core_id, usage)| CoreUsage { core_id, usage })
            .collect();
    }

    pub fn set_processes(&self, processes: Vec<(u32, &str, f64)>) {
        *self.processes.lock().unwrap() = processes
            .into_iter()
            .map(|(pid, name, cpu_percent)| ProcessUsage {
                pid,
                name: name.to_string(),
                cpu_percent,
            })
            .collect();
    }

    pub fn fail_overall_usage(&self, fail: bool) {
        *self.fail_overall.lock().unwrap() = fail;
    }

    pub fn fail_core_usage(&self, fail: bool) {
        *self.fail_cores.lock().unwrap() = fail;
    }
}

impl Default for MockCpuSource {
    fn default() -> Self {
        Self::new()
    }
}

impl CpuMetricSource for MockCpuSource {
    fn overall_usage(&self) -> Result<f64, MetricError> {
        if *self.fail_overall.lock().unwrap() {
            return Err(MetricError::Unavailable("overall usage".to_string()));
        }
        Ok(*self.overall.lock().unwrap())
    }

    fn per_core_usage(&self) -> Result<Vec<CoreUsage>, MetricError> {
        if *self.fail_cores.lock().unwrap() {
            return Err(MetricError::Unavailable("per-core usage".to_string()));
        }
        Ok(self.cores.lock().unwrap().clone())
    }

    fn top_processes(&self) -> Result<Vec<ProcessUsage>, MetricError> {
        Ok(self.processes.lock().unwrap().clone())
    }
}

/// Mock network metric source with configurable readings
pub struct MockNetworkSource {
    bandwidth: Mutex<Bandwidth>,
    interfaces: Mutex<Vec<InterfaceStats>>,
    connections: Mutex<ConnectionStats>,
    processes: Mutex<Vec<ProcessBandwidth>>,
    wifi: Mutex<Option<WifiStatus>>,
    fail_bandwidth: Mutex<bool>,
}

impl MockNetworkSource {
    pub fn new() -> Self {
        Self {
            bandwidth: Mutex::new(Bandwidth::default()),
            interfaces: Mutex::new(Vec::new()),
            connections: Mutex::new(ConnectionStats::default()),
            processes: Mutex::new(Vec::new()),
            wifi: Mutex::new(None),
            fail_bandwidth: Mutex::new(false),
        }
    }

    pub fn set_bandwidth(&self, bandwidth: Bandwidth) {
        *self.bandwidth.lock().unwrap() = bandwidth;
    }

    pub fn set_interfaces(&self, interfaces: Vec<InterfaceStats>) {
        *self.interfaces.lock().unwrap() = interfaces;
    }

    pub fn set_connection_total(&self, total: u64) {
        let mut stats = self.connections.lock().unwrap();
        stats.total = total;
        stats.tcp = total;
    }

    pub fn set_network_processes(&self, processes: Vec<(&str, f64)>) {
        *self.processes.lock().unwrap() = processes
            .into_iter()
            .map(|(name, bytes_per_sec)| ProcessBandwidth {
                name: name.to_string(),
                bytes_per_sec,
            })
            .collect();
    }

    pub fn set_wifi(&self, wifi: Option<WifiStatus>) {
        *self.wifi.lock().unwrap() = wifi;
    }

    pub fn fail_bandwidth(&self, fail: bool) {
        *self.fail_bandwidth.lock().unwrap() = fail;
    }
}

impl Default for MockNetworkSource {
    fn default() -> Self {
        Self::new()
    }
}

impl NetworkMetricSource for MockNetworkSource {
    fn bandwidth(&self) -> Result<Bandwidth, MetricError> {
        if *self.fail_bandwidth.lock().unwrap() {
            return Err(MetricError::Unavailable("bandwidth".to_string()));
        }
        Ok(*self.bandwidth.lock().unwrap())
    }

    fn interfaces(&self) -> Result<Vec<InterfaceStats>, MetricError> {
        Ok(self.interfaces.lock().unwrap().clone())
    }

    fn connection_stats(&self) -> Result<ConnectionStats, MetricError> {
        Ok(*self.connections.lock().unwrap())
    }

    fn network_processes(&self) -> Result<Vec<ProcessBandwidth>, MetricError> {
        Ok(self.processes.lock().unwrap().clone())
    }

    fn wifi_details(&self) -> Result<Option<WifiStatus>, MetricError> {
        Ok(self.wifi.lock().unwrap().clone())
    }
}
