//! Metric snapshot types
//!
//! Plain data carried from a metric source into the evaluation loop.

use serde::{Deserialize, Serialize};

/// Usage reading for a single CPU core
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoreUsage {
    /// Core identifier (0-based)
    pub core_id: u32,
    /// Usage percentage (0-100)
    pub usage: f64,
}

/// CPU usage reading for a single process
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessUsage {
    /// Process ID
    pub pid: u32,
    /// Process name or command
    pub name: String,
    /// CPU usage percentage
    pub cpu_percent: f64,
}

/// Network bandwidth reading for a single process
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessBandwidth {
    /// Process name
    pub name: String,
    /// Combined rx+tx bandwidth in bytes per second
    pub bytes_per_sec: f64,
}

/// Overall network bandwidth reading
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bandwidth {
    /// Receive rate in bytes per second
    pub rx_bytes_per_sec: f64,
    /// Transmit rate in bytes per second
    pub tx_bytes_per_sec: f64,
}

impl Bandwidth {
    /// Combined rx+tx rate in bytes per second
    pub fn total(&self) -> f64 {
        self.rx_bytes_per_sec + self.tx_bytes_per_sec
    }
}

/// Per-interface counters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterfaceStats {
    /// Interface name (e.g. "en0")
    pub name: String,
    /// Whether the interface is currently up and carrying traffic
    pub active: bool,
    /// Combined rx+tx bandwidth in bytes per second
    pub bandwidth_bytes_per_sec: f64,
    /// Error counter for the interface
    pub errors: u64,
}

/// Connection count statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConnectionStats {
    pub tcp: u64,
    pub udp: u64,
    pub total: u64,
    pub established: u64,
    pub listening: u64,
}

/// WiFi link details
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WifiStatus {
    /// Whether a WiFi link is currently associated
    pub connected: bool,
    /// Signal strength (RSSI) in dBm; more negative is weaker
    pub signal_strength: f64,
    /// Network name, if known
    pub ssid: Option<String>,
}
