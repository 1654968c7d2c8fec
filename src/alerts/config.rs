//! Threshold configuration
//!
//! TOML-based persistence for threshold definitions and global alerting
//! settings.

use super::types::{
    AlertKind, AlertSeverity, Direction, MetricKey, ThresholdConfig, DEFAULT_COOLDOWN,
    DEFAULT_MESSAGE,
};
use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Threshold configuration file structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertConfig {
    /// Global alerting settings
    #[serde(default)]
    pub settings: AlertSettings,
    /// Threshold definitions
    #[serde(default)]
    pub thresholds: Vec<ThresholdEntry>,
}

impl AlertConfig {
    /// Load configuration from file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_str = path.as_ref().display().to_string();
        let contents = fs::read_to_string(path.as_ref())
            .map_err(|_| ConfigError::FileNotFound(path_str.clone()))?;

        Ok(toml::from_str(&contents).map_err(ConfigError::TomlError)?)
    }

    /// Save configuration to file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::ParseError(format!("Failed to serialize: {}", e)))?;

        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path.as_ref(), contents)?;

        Ok(())
    }

    /// Get default configuration path
    pub fn default_path() -> PathBuf {
        if let Some(config_dir) = dirs::config_dir() {
            config_dir.join("metricwatch").join("thresholds.toml")
        } else {
            PathBuf::from("thresholds.toml")
        }
    }

    /// The built-in threshold set
    pub fn default_thresholds() -> Self {
        let mb = 1_000_000.0;
        Self {
            settings: AlertSettings::default(),
            thresholds: vec![
                ThresholdEntry::new(
                    "cpu_usage_high",
                    AlertKind::CpuUsageHigh,
                    MetricKey::CpuTotal,
                    80.0,
                    60,
                    "warning",
                )
                .message("CPU usage above {threshold}% for {duration} minutes"),
                ThresholdEntry::new(
                    "cpu_usage_very_high",
                    AlertKind::CpuUsageVeryHigh,
                    MetricKey::CpuTotal,
                    90.0,
                    30,
                    "critical",
                )
                .message("CPU usage critically high: {value}% (threshold {threshold}%)"),
                ThresholdEntry::new(
                    "cpu_usage_sustained",
                    AlertKind::CpuUsageSustained,
                    MetricKey::CpuSustained,
                    70.0,
                    600,
                    "warning",
                )
                .message("Sustained CPU usage above {threshold}% for {duration} minutes"),
                ThresholdEntry::new(
                    "core_usage_high",
                    AlertKind::CpuCoreUsageHigh,
                    MetricKey::CpuCore,
                    90.0,
                    60,
                    "warning",
                )
                .message("Core {core_id} usage above {threshold}% for {duration} minutes"),
                ThresholdEntry::new(
                    "process_cpu_high",
                    AlertKind::ProcessCpuUsageHigh,
                    MetricKey::CpuProcess,
                    50.0,
                    120,
                    "warning",
                )
                .message("Process {process_name} (PID {pid}) using {value}% CPU"),
                ThresholdEntry::new(
                    "bandwidth_usage_high",
                    AlertKind::BandwidthUsageHigh,
                    MetricKey::BandwidthTotal,
                    50.0 * mb,
                    60,
                    "warning",
                )
                .message("Total bandwidth above {threshold} for {duration} minutes"),
                ThresholdEntry::new(
                    "download_rate_high",
                    AlertKind::DownloadRateHigh,
                    MetricKey::BandwidthRx,
                    40.0 * mb,
                    60,
                    "warning",
                )
                .message("Download rate above {threshold} for {duration} minutes"),
                ThresholdEntry::new(
                    "upload_rate_high",
                    AlertKind::UploadRateHigh,
                    MetricKey::BandwidthTx,
                    20.0 * mb,
                    60,
                    "warning",
                )
                .message("Upload rate above {threshold} for {duration} minutes"),
                ThresholdEntry::new(
                    "bandwidth_usage_very_high",
                    AlertKind::BandwidthUsageVeryHigh,
                    MetricKey::BandwidthTotal,
                    80.0 * mb,
                    30,
                    "critical",
                )
                .message("Bandwidth critically high: {value} (threshold {threshold})"),
                ThresholdEntry::new(
                    "bandwidth_usage_sustained",
                    AlertKind::TotalBandwidthSustained,
                    MetricKey::BandwidthSustained,
                    10.0 * mb,
                    600,
                    "warning",
                )
                .message("Sustained bandwidth above {threshold} for {duration} minutes"),
                ThresholdEntry::new(
                    "connection_count_high",
                    AlertKind::ConnectionCountHigh,
                    MetricKey::ConnectionCount,
                    1000.0,
                    120,
                    "warning",
                )
                .message("Connection count above {threshold} for {duration} minutes"),
                ThresholdEntry::new(
                    "interface_bandwidth_high",
                    AlertKind::BandwidthUsageHigh,
                    MetricKey::InterfaceBandwidth,
                    40.0 * mb,
                    60,
                    "warning",
                )
                .message("Interface {interface_name} bandwidth above {threshold} for {duration} minutes"),
                ThresholdEntry::new(
                    "interface_error_rate_high",
                    AlertKind::InterfaceErrorRateHigh,
                    MetricKey::InterfaceErrors,
                    100.0,
                    300,
                    "warning",
                )
                .message("Interface {interface_name} reporting {value} errors"),
                ThresholdEntry::new(
                    "process_bandwidth_high",
                    AlertKind::ProcessBandwidthHigh,
                    MetricKey::ProcessBandwidth,
                    10.0 * mb,
                    120,
                    "warning",
                )
                .message("Process {process_name} using {value} of bandwidth"),
                ThresholdEntry::new(
                    "wifi_signal_low",
                    AlertKind::WifiSignalLow,
                    MetricKey::WifiSignal,
                    -75.0,
                    300,
                    "warning",
                )
                .direction(Direction::Below)
                .message("WiFi signal below {threshold} dBm for {duration} minutes"),
            ],
        }
    }

    /// Convert to registry-ready threshold configs, skipping disabled entries
    pub fn to_thresholds(&self) -> Result<Vec<(String, ThresholdConfig)>> {
        let check_interval = Duration::from_secs(self.settings.check_interval_secs);
        self.thresholds
            .iter()
            .filter(|entry| entry.enabled)
            .map(|entry| {
                Ok((
                    entry.name.clone(),
                    entry.to_threshold_config(check_interval)?,
                ))
            })
            .collect()
    }
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self::default_thresholds()
    }
}

/// Global alerting settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertSettings {
    /// Whether alerting is enabled globally
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Check interval in seconds
    #[serde(default = "default_check_interval")]
    pub check_interval_secs: u64,
}

impl Default for AlertSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            check_interval_secs: 5,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_check_interval() -> u64 {
    5
}

fn default_cooldown() -> u64 {
    DEFAULT_COOLDOWN.as_secs()
}

/// Threshold definition (TOML-friendly format)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdEntry {
    /// Threshold name, used as the registry key
    pub name: String,
    /// Classification tag
    pub kind: AlertKind,
    /// Observation stream to evaluate against
    pub metric: MetricKey,
    /// Comparison direction
    #[serde(default = "default_direction")]
    pub direction: Direction,
    /// The breach value
    pub threshold: f64,
    /// Minimum continuous breach time in seconds
    pub duration_secs: u64,
    /// Minimum seconds between repeated alerts
    #[serde(default = "default_cooldown")]
    pub cooldown_secs: u64,
    /// Severity level (string form)
    pub severity: String,
    /// Optional message template
    pub message: Option<String>,
    /// Whether the threshold is evaluated
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_direction() -> Direction {
    Direction::Above
}

impl ThresholdEntry {
    fn new(
        name: &str,
        kind: AlertKind,
        metric: MetricKey,
        threshold: f64,
        duration_secs: u64,
        severity: &str,
    ) -> Self {
        Self {
            name: name.to_string(),
            kind,
            metric,
            direction: Direction::Above,
            threshold,
            duration_secs,
            cooldown_secs: default_cooldown(),
            severity: severity.to_string(),
            message: None,
            enabled: true,
        }
    }

    fn message(mut self, message: &str) -> Self {
        self.message = Some(message.to_string());
        self
    }

    fn direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    /// Convert to a registry config
    pub fn to_threshold_config(&self, check_interval: Duration) -> Result<ThresholdConfig> {
        if !self.threshold.is_finite() {
            return Err(ConfigError::InvalidValue {
                key: format!("thresholds.{}.threshold", self.name),
                message: format!("{} is not a finite number", self.threshold),
            }
            .into());
        }

        let mut config = ThresholdConfig::new(
            self.kind,
            self.metric,
            self.threshold,
            Duration::from_secs(self.duration_secs),
            self.parse_severity()?,
        )
        .with_cooldown(Duration::from_secs(self.cooldown_secs))
        .with_check_interval(check_interval);

        config.direction = self.direction;
        config.message = self
            .message
            .clone()
            .unwrap_or_else(|| DEFAULT_MESSAGE.to_string());

        Ok(config)
    }

    fn parse_severity(&self) -> Result<AlertSeverity> {
        match self.severity.to_lowercase().as_str() {
            "info" => Ok(AlertSeverity::Info),
            "warning" => Ok(AlertSeverity::Warning),
            "critical" => Ok(AlertSeverity::Critical),
            _ => Err(ConfigError::InvalidValue {
                key: format!("thresholds.{}.severity", self.name),
                message: format!("Unknown severity level: {}", self.severity),
            })?,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AlertConfig::default();
        assert!(config.settings.enabled);
        assert_eq!(config.settings.check_interval_secs, 5);
        assert_eq!(config.thresholds.len(), 15);
    }

    #[test]
    fn test_default_thresholds_convert() {
        let config = AlertConfig::default();
        let thresholds = config.to_thresholds().unwrap();
        assert_eq!(thresholds.len(), 15);

        let (_, cpu) = thresholds
            .iter()
            .find(|(name, _)| name == "cpu_usage_high")
            .unwrap();
        assert_eq!(cpu.threshold, 80.0);
        assert_eq!(cpu.duration, Duration::from_secs(60));
        assert_eq!(cpu.severity, AlertSeverity::Warning);
        assert_eq!(cpu.kind, AlertKind::CpuUsageHigh);
        assert_eq!(cpu.check_interval, Duration::from_secs(5));

        let (_, wifi) = thresholds
            .iter()
            .find(|(name, _)| name == "wifi_signal_low")
            .unwrap();
        assert_eq!(wifi.direction, Direction::Below);
        assert!(wifi.breached(-80.0));
    }

    #[test]
    fn test_default_threshold_names_stable() {
        let config = AlertConfig::default();
        let names: Vec<&str> = config
            .thresholds
            .iter()
            .map(|entry| entry.name.as_str())
            .collect();
        for expected in [
            "cpu_usage_sustained",
            "bandwidth_usage_sustained",
            "interface_error_rate_high",
            "wifi_signal_low",
        ] {
            assert!(names.contains(&expected), "missing {}", expected);
        }
    }

    #[test]
    fn test_parse_severity() {
        let mut entry = ThresholdEntry::new(
            "test",
            AlertKind::CpuUsageHigh,
            MetricKey::CpuTotal,
            80.0,
            60,
            "Warning",
        );
        assert_eq!(entry.parse_severity().unwrap(), AlertSeverity::Warning);

        entry.severity = "fatal".to_string();
        assert!(entry.parse_severity().is_err());
    }

    #[test]
    fn test_non_finite_threshold_rejected() {
        let entry = ThresholdEntry::new(
            "test",
            AlertKind::CpuUsageHigh,
            MetricKey::CpuTotal,
            f64::NAN,
            60,
            "warning",
        );
        assert!(entry
            .to_threshold_config(Duration::from_secs(5))
            .is_err());
    }

    #[test]
    fn test_disabled_entry_skipped() {
        let mut config = AlertConfig::default();
        config.thresholds[0].enabled = false;
        let name = config.thresholds[0].name.clone();

        let thresholds = config.to_thresholds().unwrap();
        assert_eq!(thresholds.len(), 14);
        assert!(thresholds.iter().all(|(n, _)| *n != name));
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("thresholds.toml");

        let config = AlertConfig::default();
        config.save(&path).unwrap();

        let loaded = AlertConfig::load(&path).unwrap();
        assert_eq!(loaded.thresholds.len(), config.thresholds.len());
        assert_eq!(loaded.thresholds[0].name, config.thresholds[0].name);
        assert_eq!(loaded.settings.check_interval_secs, 5);
    }

    #[test]
    fn test_load_missing_file() {
        let result = AlertConfig::load("/nonexistent/thresholds.toml");
        assert!(result.is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let toml = r#"
            [[thresholds]]
            name = "cpu_usage_high"
            kind = "cpu_usage_high"
            metric = "cpu_total"
            threshold = 75.0
            duration_secs = 30
            severity = "critical"
        "#;
        let config: AlertConfig = toml::from_str(toml).unwrap();
        assert!(config.settings.enabled);
        assert_eq!(config.thresholds.len(), 1);

        let entry = &config.thresholds[0];
        assert!(entry.enabled);
        assert_eq!(entry.direction, Direction::Above);
        assert_eq!(entry.cooldown_secs, 600);
        assert!(entry.message.is_none());
    }
}
