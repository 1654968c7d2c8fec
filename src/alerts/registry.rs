//! Threshold registry
//!
//! Holds the named threshold definitions a monitor evaluates. Mutations go
//! through validation that falls back to the previous valid values instead
//! of propagating errors; a bad `set_threshold` call must never crash the
//! monitor.

use crate::alerts::types::{AlertSeverity, MetricKey, ThresholdConfig};

use std::collections::HashMap;
use std::time::Duration;

/// Named threshold definitions
#[derive(Debug, Clone, Default)]
pub struct ThresholdRegistry {
    configs: HashMap<String, ThresholdConfig>,
}

impl ThresholdRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a threshold definition
    ///
    /// A non-finite threshold value is rejected: an existing config is kept
    /// unchanged and a new one is not inserted. Returns whether the config
    /// was accepted.
    pub fn set(&mut self, name: &str, config: ThresholdConfig) -> bool {
        if !config.threshold.is_finite() {
            log::warn!(
                "Rejecting threshold '{}': value {} is not finite",
                name,
                config.threshold
            );
            return false;
        }
        self.configs.insert(name.to_string(), config);
        true
    }

    /// Update an existing threshold in place
    ///
    /// The classification tag, metric key, and direction are retained, as is
    /// the message when `message` is `None`. Invalid fields fall back to
    /// their previous values. Returns `false` for an unknown name: inserting
    /// a threshold requires a full config so its classification is explicit.
    pub fn adjust(
        &mut self,
        name: &str,
        threshold: f64,
        duration: Duration,
        severity: AlertSeverity,
        message: Option<&str>,
    ) -> bool {
        let Some(config) = self.configs.get_mut(name) else {
            log::warn!("Cannot adjust unknown threshold '{}'", name);
            return false;
        };

        if threshold.is_finite() {
            config.threshold = threshold;
        } else {
            log::warn!(
                "Keeping previous value for threshold '{}': {} is not finite",
                name,
                threshold
            );
        }
        config.duration = duration;
        config.severity = severity;
        if let Some(message) = message {
            config.message = message.to_string();
        }
        true
    }

    /// Look up a config by name
    pub fn get(&self, name: &str) -> Option<&ThresholdConfig> {
        self.configs.get(name)
    }

    /// Read snapshot of all current configs
    pub fn snapshot(&self) -> Vec<(String, ThresholdConfig)> {
        self.configs
            .iter()
            .map(|(name, config)| (name.clone(), config.clone()))
            .collect()
    }

    /// Configs evaluating against the given observation stream
    ///
    /// Cloned so evaluation never holds a borrow across state mutation.
    pub fn for_metric(&self, metric: MetricKey) -> Vec<(String, ThresholdConfig)> {
        self.configs
            .iter()
            .filter(|(_, config)| config.metric == metric)
            .map(|(name, config)| (name.clone(), config.clone()))
            .collect()
    }

    /// Shortest configured check interval, used as the tick period
    pub fn min_check_interval(&self) -> Duration {
        self.configs
            .values()
            .map(|config| config.check_interval)
            .min()
            .unwrap_or(crate::alerts::types::DEFAULT_CHECK_INTERVAL)
    }

    pub fn len(&self) -> usize {
        self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::types::AlertKind;

    fn cpu_config(threshold: f64) -> ThresholdConfig {
        ThresholdConfig::new(
            AlertKind::CpuUsageHigh,
            MetricKey::CpuTotal,
            threshold,
            Duration::from_secs(60),
            AlertSeverity::Warning,
        )
    }

    #[test]
    fn test_set_and_get() {
        let mut registry = ThresholdRegistry::new();
        assert!(registry.set("cpu_usage_high", cpu_config(80.0)));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("cpu_usage_high").unwrap().threshold, 80.0);
    }

    #[test]
    fn test_set_rejects_non_finite() {
        let mut registry = ThresholdRegistry::new();
        registry.set("cpu_usage_high", cpu_config(80.0));
        assert!(!registry.set("cpu_usage_high", cpu_config(f64::NAN)));
        // Previous valid config retained
        assert_eq!(registry.get("cpu_usage_high").unwrap().threshold, 80.0);
    }

    #[test]
    fn test_adjust_existing() {
        let mut registry = ThresholdRegistry::new();
        registry.set(
            "cpu_usage_high",
            cpu_config(80.0).with_message("CPU above {threshold}%"),
        );

        assert!(registry.adjust(
            "cpu_usage_high",
            85.0,
            Duration::from_secs(120),
            AlertSeverity::Critical,
            None,
        ));

        let config = registry.get("cpu_usage_high").unwrap();
        assert_eq!(config.threshold, 85.0);
        assert_eq!(config.duration, Duration::from_secs(120));
        assert_eq!(config.severity, AlertSeverity::Critical);
        // Message retained when not supplied
        assert_eq!(config.message, "CPU above {threshold}%");
        // Classification retained
        assert_eq!(config.kind, AlertKind::CpuUsageHigh);
    }

    #[test]
    fn test_adjust_unknown_name() {
        let mut registry = ThresholdRegistry::new();
        assert!(!registry.adjust(
            "nope",
            1.0,
            Duration::from_secs(1),
            AlertSeverity::Info,
            None
        ));
    }

    #[test]
    fn test_adjust_non_finite_keeps_previous_value() {
        let mut registry = ThresholdRegistry::new();
        registry.set("cpu_usage_high", cpu_config(80.0));

        assert!(registry.adjust(
            "cpu_usage_high",
            f64::INFINITY,
            Duration::from_secs(30),
            AlertSeverity::Warning,
            None,
        ));

        let config = registry.get("cpu_usage_high").unwrap();
        assert_eq!(config.threshold, 80.0);
        assert_eq!(config.duration, Duration::from_secs(30));
    }

    #[test]
    fn test_for_metric() {
        let mut registry = ThresholdRegistry::new();
        registry.set("cpu_usage_high", cpu_config(80.0));
        registry.set("cpu_usage_very_high", cpu_config(90.0));
        registry.set(
            "connection_count_high",
            ThresholdConfig::new(
                AlertKind::ConnectionCountHigh,
                MetricKey::ConnectionCount,
                1000.0,
                Duration::from_secs(120),
                AlertSeverity::Warning,
            ),
        );

        let cpu = registry.for_metric(MetricKey::CpuTotal);
        assert_eq!(cpu.len(), 2);
        let conns = registry.for_metric(MetricKey::ConnectionCount);
        assert_eq!(conns.len(), 1);
        assert_eq!(conns[0].0, "connection_count_high");
    }

    #[test]
    fn test_min_check_interval() {
        let mut registry = ThresholdRegistry::new();
        assert_eq!(registry.min_check_interval(), Duration::from_secs(5));

        registry.set(
            "cpu_usage_high",
            cpu_config(80.0).with_check_interval(Duration::from_secs(2)),
        );
        registry.set("cpu_usage_very_high", cpu_config(90.0));
        assert_eq!(registry.min_check_interval(), Duration::from_secs(2));
    }
}
