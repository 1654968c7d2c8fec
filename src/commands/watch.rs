//! Watch command handler
//!
//! Wires a metric source, the event dispatcher, and both threshold monitors
//! together and runs the evaluation loop.

use crate::alerts::{AlertConfig, NotificationFanout, TerminalNotifier, ThresholdConfig};
use crate::cli::args::{OutputFormat, WatchArgs};
use crate::cli::output::{print_output, ActiveAlertList};
use crate::error::{AppError, MetricError, Result};
use crate::events::{EventDispatcher, EventKind, EventObserver, MetricEvent};
use crate::metrics::sim::SimulatedSource;
use crate::monitors::{partition_thresholds, CpuThresholdMonitor, NetworkThresholdMonitor};

use std::sync::Arc;
use std::time::Duration;

/// Observer that logs every dispatched event
struct EventLogger {
    format: OutputFormat,
}

impl EventObserver for EventLogger {
    fn update(&self, event: &MetricEvent) -> Result<()> {
        match self.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string(event).map_err(|e| {
                    AppError::Delivery(format!("failed to serialize event: {}", e))
                })?);
            }
            _ => match event.kind {
                EventKind::ThresholdExceeded => {
                    println!("{} [{}] {}", event.kind, event.source, event.message)
                }
                EventKind::CollectionError => {
                    log::warn!("{} [{}] {}", event.kind, event.source, event.message)
                }
                EventKind::MetricsUpdated => {
                    log::debug!("{} [{}]", event.kind, event.source)
                }
            },
        }
        Ok(())
    }
}

/// Run the watch command
pub fn run_watch(args: &WatchArgs, format: OutputFormat, config_path: Option<&str>) -> Result<()> {
    if !args.simulate {
        return Err(MetricError::NotSupported(
            "no live metric collector in this build".to_string(),
        )
        .into());
    }

    let mut thresholds = load_thresholds(config_path)?;
    if let Some(interval) = args.interval {
        let interval = Duration::from_secs(interval.max(1));
        for (_, config) in thresholds.iter_mut() {
            config.check_interval = interval;
        }
    }
    let (cpu_thresholds, network_thresholds) = partition_thresholds(thresholds);

    let dispatcher = Arc::new(EventDispatcher::new());
    let logger = Arc::new(EventLogger { format });
    let _subscription = dispatcher.subscribe_all(&logger);
    dispatcher.start();

    let source = Arc::new(SimulatedSource::default());
    let cpu_monitor = CpuThresholdMonitor::with_thresholds(
        Arc::clone(&source),
        Arc::clone(&dispatcher),
        cpu_thresholds,
        terminal_notifiers(),
    );
    let network_monitor = NetworkThresholdMonitor::with_thresholds(
        Arc::clone(&source),
        Arc::clone(&dispatcher),
        network_thresholds,
        terminal_notifiers(),
    );

    log::info!("Starting threshold monitors (simulated source)");
    cpu_monitor.start();
    network_monitor.start();

    match args.run_for {
        Some(secs) => std::thread::sleep(Duration::from_secs(secs)),
        None => loop {
            std::thread::sleep(Duration::from_secs(60));
        },
    }

    cpu_monitor.stop();
    network_monitor.stop();
    dispatcher.stop();

    let mut active = cpu_monitor.active_alerts();
    active.extend(network_monitor.active_alerts());
    print_output(&ActiveAlertList::new(active), format)?;
    Ok(())
}

fn terminal_notifiers() -> NotificationFanout {
    let mut fanout = NotificationFanout::new();
    fanout.add_notifier(Box::new(TerminalNotifier::new()));
    fanout
}

/// Load thresholds from the given path, the default path, or the built-in
/// defaults when no file exists
pub(crate) fn load_thresholds(
    config_path: Option<&str>,
) -> Result<Vec<(String, ThresholdConfig)>> {
    let config = match config_path {
        Some(path) => AlertConfig::load(path)?,
        None => {
            let path = AlertConfig::default_path();
            if path.exists() {
                AlertConfig::load(&path)?
            } else {
                AlertConfig::default()
            }
        }
    };

    if !config.settings.enabled {
        log::info!("Alerting disabled in configuration");
        return Ok(Vec::new());
    }
    config.to_thresholds()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_watch_requires_simulate() {
        let args = WatchArgs {
            simulate: false,
            interval: None,
            run_for: None,
        };
        let result = run_watch(&args, OutputFormat::Table, None);
        assert!(matches!(
            result,
            Err(AppError::Metric(MetricError::NotSupported(_)))
        ));
    }

    #[test]
    fn test_load_thresholds_missing_explicit_path() {
        assert!(load_thresholds(Some("/nonexistent/thresholds.toml")).is_err());
    }

    #[test]
    fn test_load_thresholds_disabled_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("thresholds.toml");
        let mut config = AlertConfig::default();
        config.settings.enabled = false;
        config.save(&path).unwrap();

        let thresholds = load_thresholds(path.to_str()).unwrap();
        assert!(thresholds.is_empty());
    }
}
