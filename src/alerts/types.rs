//! Alert system domain types
//!
//! Defines threshold configurations, per-entity alert state, and the message
//! formatting used when alerts fire.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};

/// Default message template for thresholds configured without one
pub const DEFAULT_MESSAGE: &str = "Threshold {threshold} exceeded for {duration} minutes";

/// Default interval between evaluation ticks
pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(5);

/// Default minimum time between repeated alerts for the same
/// (threshold, entity)
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(600);

/// Alert severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    /// Informational, no action needed
    Info,
    /// Attention recommended
    Warning,
    /// Action required soon
    Critical,
}

impl fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warning => write!(f, "WARNING"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// Alert classification tag
///
/// Always set explicitly on the threshold definition, never inferred from
/// the threshold's name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    CpuUsageHigh,
    CpuUsageVeryHigh,
    CpuCoreUsageHigh,
    CpuUsageSustained,
    ProcessCpuUsageHigh,
    BandwidthUsageHigh,
    BandwidthUsageVeryHigh,
    DownloadRateHigh,
    UploadRateHigh,
    TotalBandwidthSustained,
    ConnectionCountHigh,
    InterfaceErrorRateHigh,
    ProcessBandwidthHigh,
    WifiSignalLow,
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::CpuUsageHigh => "CPU_USAGE_HIGH",
            Self::CpuUsageVeryHigh => "CPU_USAGE_VERY_HIGH",
            Self::CpuCoreUsageHigh => "CPU_CORE_USAGE_HIGH",
            Self::CpuUsageSustained => "CPU_USAGE_SUSTAINED",
            Self::ProcessCpuUsageHigh => "PROCESS_CPU_USAGE_HIGH",
            Self::BandwidthUsageHigh => "BANDWIDTH_USAGE_HIGH",
            Self::BandwidthUsageVeryHigh => "BANDWIDTH_USAGE_VERY_HIGH",
            Self::DownloadRateHigh => "DOWNLOAD_RATE_HIGH",
            Self::UploadRateHigh => "UPLOAD_RATE_HIGH",
            Self::TotalBandwidthSustained => "TOTAL_BANDWIDTH_SUSTAINED",
            Self::ConnectionCountHigh => "CONNECTION_COUNT_HIGH",
            Self::InterfaceErrorRateHigh => "INTERFACE_ERROR_RATE_HIGH",
            Self::ProcessBandwidthHigh => "PROCESS_BANDWIDTH_HIGH",
            Self::WifiSignalLow => "WIFI_SIGNAL_LOW",
        };
        write!(f, "{}", name)
    }
}

/// Comparison direction for a threshold
///
/// Explicit per threshold; signal-strength style metrics use `Below`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Breach when `value >= threshold` (higher is worse)
    Above,
    /// Breach when `value <= threshold` (lower is worse)
    Below,
}

impl Direction {
    /// Whether the observed value breaches the threshold
    pub fn breached(&self, value: f64, threshold: f64) -> bool {
        match self {
            Self::Above => value >= threshold,
            Self::Below => value <= threshold,
        }
    }
}

/// Which observation stream a threshold evaluates against
///
/// The evaluation loop feeds each reading to every registered threshold
/// carrying the matching key, so runtime-added thresholds join the fixed
/// checks without any name-matching convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKey {
    /// Instantaneous overall CPU usage
    CpuTotal,
    /// Rolling-average CPU usage
    CpuSustained,
    /// Per-core CPU usage
    CpuCore,
    /// Per-process CPU usage
    CpuProcess,
    /// Combined rx+tx bandwidth
    BandwidthTotal,
    /// Receive bandwidth
    BandwidthRx,
    /// Transmit bandwidth
    BandwidthTx,
    /// Rolling-average combined bandwidth
    BandwidthSustained,
    /// Total connection count
    ConnectionCount,
    /// Per-interface bandwidth
    InterfaceBandwidth,
    /// Per-interface error counter
    InterfaceErrors,
    /// Per-process bandwidth
    ProcessBandwidth,
    /// WiFi signal strength (RSSI)
    WifiSignal,
}

/// Threshold definition
///
/// Immutable once registered; updates go through the registry, which resets
/// any in-flight state for the threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdConfig {
    /// The breach value
    pub threshold: f64,
    /// Minimum continuous breach time before alerting
    pub duration: Duration,
    /// Alert severity
    pub severity: AlertSeverity,
    /// Classification tag
    pub kind: AlertKind,
    /// Comparison direction
    pub direction: Direction,
    /// Observation stream this threshold evaluates against
    pub metric: MetricKey,
    /// Message template with `{threshold}`, `{value}`, `{duration}` and
    /// entity placeholders
    pub message: String,
    /// Interval between evaluation ticks
    pub check_interval: Duration,
    /// Minimum time between repeated alerts for the same (threshold, entity)
    pub cooldown: Duration,
}

impl ThresholdConfig {
    /// Create a config with default message, direction, interval, and
    /// cooldown
    pub fn new(
        kind: AlertKind,
        metric: MetricKey,
        threshold: f64,
        duration: Duration,
        severity: AlertSeverity,
    ) -> Self {
        Self {
            threshold,
            duration,
            severity,
            kind,
            direction: Direction::Above,
            metric,
            message: DEFAULT_MESSAGE.to_string(),
            check_interval: DEFAULT_CHECK_INTERVAL,
            cooldown: DEFAULT_COOLDOWN,
        }
    }

    /// Set the message template
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Breach when the value drops to or below the threshold
    pub fn below(mut self) -> Self {
        self.direction = Direction::Below;
        self
    }

    /// Set the cooldown between repeated alerts
    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    /// Set the evaluation tick interval
    pub fn with_check_interval(mut self, interval: Duration) -> Self {
        self.check_interval = interval;
        self
    }

    /// Whether the observed value breaches this threshold
    pub fn breached(&self, value: f64) -> bool {
        self.direction.breached(value, self.threshold)
    }
}

/// Scoping identifier distinguishing per-entity threshold instances from
/// global ones
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKey {
    /// Host-wide threshold
    Global,
    /// A CPU core
    Core(u32),
    /// A network interface, by name
    Interface(String),
    /// A process, by pid (CPU tracking)
    Pid(u32),
    /// A process, by name (network tracking)
    Process(String),
}

impl EntityKey {
    /// Entity placeholders derivable from the key alone
    pub fn context(&self) -> EntityContext {
        match self {
            Self::Global => EntityContext::default(),
            Self::Core(id) => EntityContext {
                core_id: Some(*id),
                ..Default::default()
            },
            Self::Interface(name) => EntityContext {
                interface_name: Some(name.clone()),
                ..Default::default()
            },
            Self::Pid(pid) => EntityContext {
                pid: Some(*pid),
                ..Default::default()
            },
            Self::Process(name) => EntityContext {
                process_name: Some(name.clone()),
                ..Default::default()
            },
        }
    }

    /// Prefix used when building alert map keys (e.g. "core_3_")
    pub fn key_prefix(&self) -> String {
        match self {
            Self::Global => String::new(),
            Self::Core(id) => format!("core_{}_", id),
            Self::Interface(name) => format!("interface_{}_", name),
            Self::Pid(pid) => format!("process_{}_", pid),
            Self::Process(name) => format!("process_{}_", name),
        }
    }
}

/// Entity identifiers available for message substitution
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityContext {
    pub core_id: Option<u32>,
    pub pid: Option<u32>,
    pub process_name: Option<String>,
    pub interface_name: Option<String>,
}

impl EntityContext {
    pub fn process(pid: u32, name: impl Into<String>) -> Self {
        Self {
            pid: Some(pid),
            process_name: Some(name.into()),
            ..Default::default()
        }
    }
}

/// Mutable tracking state for one (threshold, entity) pair
///
/// Invariant: `is_active` implies `exceeded_since.is_some()`. Recovery is
/// immediate: the first non-breaching observation clears both.
#[derive(Debug, Clone, Default)]
pub struct AlertState {
    /// When the condition first became true; cleared on recovery
    pub exceeded_since: Option<Instant>,
    /// When the last alert fired; `None` means never, so cooldown cannot
    /// block the first alert
    pub last_alert: Option<Instant>,
    /// Most recently observed value
    pub current_value: f64,
    /// True while an alert for this breach episode remains open
    pub is_active: bool,
}

impl AlertState {
    pub fn new() -> Self {
        Self::default()
    }
}

/// An alert the state machine has just raised
#[derive(Debug, Clone)]
pub struct FiredAlert {
    /// Threshold name
    pub name: String,
    /// Snapshot of the config that fired
    pub config: ThresholdConfig,
    /// Entity the alert is scoped to
    pub entity: EntityKey,
    /// Entity identifiers for message substitution and event payload
    pub context: EntityContext,
    /// Observed value at fire time
    pub value: f64,
    /// How long the threshold had been continuously breached
    pub exceeded_for: Duration,
}

impl FiredAlert {
    /// Fully substituted alert message
    pub fn message(&self) -> String {
        render_message(
            &self.config.message,
            self.config.threshold,
            self.value,
            self.exceeded_for,
            &self.context,
        )
    }
}

/// Snapshot of a currently active alert, for pull-based consumers
#[derive(Debug, Clone, Serialize)]
pub struct ActiveAlert {
    pub kind: AlertKind,
    pub severity: AlertSeverity,
    pub threshold: f64,
    pub current_value: f64,
    pub duration_seconds: f64,
    pub message: String,
}

/// Format a value with bandwidth-style units where they aid readability
///
/// Values above 10^6 render as MB/s, above 10^3 as KB/s, everything else as
/// the plain number (whole floats keep one decimal place).
pub fn format_quantity(value: f64) -> String {
    if value.abs() > 1_000_000.0 {
        format!("{:.2} MB/s", value / 1_000_000.0)
    } else if value.abs() > 1_000.0 {
        format!("{:.2} KB/s", value / 1_000.0)
    } else if value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}

/// Substitute template placeholders
///
/// `{threshold}` and `{value}` go through the unit-aware formatter,
/// `{duration}` renders as minutes to one decimal place, and entity
/// placeholders are replaced only when the context carries a value for them;
/// absent ones are left as-is.
pub fn render_message(
    template: &str,
    threshold: f64,
    value: f64,
    exceeded_for: Duration,
    ctx: &EntityContext,
) -> String {
    let minutes = exceeded_for.as_secs_f64() / 60.0;
    let mut message = template
        .replace("{threshold}", &format_quantity(threshold))
        .replace("{value}", &format_quantity(value))
        .replace("{duration}", &format!("{:.1}", minutes));

    if let Some(core_id) = ctx.core_id {
        message = message.replace("{core_id}", &core_id.to_string());
    }
    if let Some(pid) = ctx.pid {
        message = message.replace("{pid}", &pid.to_string());
    }
    if let Some(name) = &ctx.process_name {
        message = message.replace("{process_name}", name);
    }
    if let Some(name) = &ctx.interface_name {
        message = message.replace("{interface_name}", name);
    }

    message
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_above() {
        let dir = Direction::Above;
        assert!(dir.breached(85.0, 80.0));
        assert!(dir.breached(80.0, 80.0));
        assert!(!dir.breached(75.0, 80.0));
    }

    #[test]
    fn test_direction_below() {
        let dir = Direction::Below;
        assert!(dir.breached(-80.0, -75.0));
        assert!(dir.breached(-75.0, -75.0));
        assert!(!dir.breached(-70.0, -75.0));
    }

    #[test]
    fn test_config_builder() {
        let config = ThresholdConfig::new(
            AlertKind::WifiSignalLow,
            MetricKey::WifiSignal,
            -75.0,
            Duration::from_secs(300),
            AlertSeverity::Warning,
        )
        .below()
        .with_message("WiFi signal below {threshold} dBm")
        .with_cooldown(Duration::from_secs(60));

        assert_eq!(config.direction, Direction::Below);
        assert_eq!(config.cooldown, Duration::from_secs(60));
        assert!(config.breached(-80.0));
        assert!(!config.breached(-70.0));
    }

    #[test]
    fn test_format_quantity_units() {
        assert_eq!(format_quantity(50_000_000.0), "50.00 MB/s");
        assert_eq!(format_quantity(2_500.0), "2.50 KB/s");
        assert_eq!(format_quantity(90.0), "90.0");
        assert_eq!(format_quantity(87.5), "87.5");
    }

    #[test]
    fn test_render_message_substitution() {
        let ctx = EntityContext {
            core_id: Some(3),
            ..Default::default()
        };
        let message = render_message(
            "Core {core_id} usage above {threshold}% for {duration} minutes",
            90.0,
            95.2,
            Duration::from_secs(125),
            &ctx,
        );
        assert_eq!(message, "Core 3 usage above 90.0% for 2.1 minutes");
    }

    #[test]
    fn test_render_message_leaves_absent_placeholders() {
        let message = render_message(
            "Process {process_name} (PID {pid}) above {threshold}%",
            50.0,
            60.0,
            Duration::from_secs(60),
            &EntityContext::default(),
        );
        assert_eq!(message, "Process {process_name} (PID {pid}) above 50.0%");
    }

    #[test]
    fn test_entity_key_prefix() {
        assert_eq!(EntityKey::Global.key_prefix(), "");
        assert_eq!(EntityKey::Core(3).key_prefix(), "core_3_");
        assert_eq!(
            EntityKey::Interface("en0".to_string()).key_prefix(),
            "interface_en0_"
        );
        assert_eq!(EntityKey::Pid(1234).key_prefix(), "process_1234_");
    }

    #[test]
    fn test_alert_severity_ordering() {
        assert!(AlertSeverity::Info < AlertSeverity::Warning);
        assert!(AlertSeverity::Warning < AlertSeverity::Critical);
    }
}
