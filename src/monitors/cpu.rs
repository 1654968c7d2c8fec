//! CPU threshold monitor
//!
//! Polls a CPU metric source and evaluates overall, sustained, per-core,
//! and per-process thresholds.

use crate::alerts::types::{
    ActiveAlert, AlertSeverity, EntityContext, EntityKey, MetricKey, ThresholdConfig,
};
use crate::alerts::{AlertConfig, AlertTracker, NotificationFanout, SampleHistory, ThresholdRegistry};
use crate::events::EventDispatcher;
use crate::metrics::CpuMetricSource;
use crate::monitors::{is_cpu_metric, publish_fired, report_check_failure, ShutdownSignal};

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

const SOURCE: &str = "CpuThresholdMonitor";

struct MonitorState {
    registry: ThresholdRegistry,
    tracker: AlertTracker,
    history: SampleHistory,
}

struct MonitorCore<S> {
    source: Arc<S>,
    dispatcher: Arc<EventDispatcher>,
    notifiers: NotificationFanout,
    state: Mutex<MonitorState>,
}

impl<S: CpuMetricSource> MonitorCore<S> {
    /// Run one evaluation pass
    ///
    /// Readings are fetched before the state lock is taken; a failed check
    /// is reported and the remaining checks still run.
    fn evaluate_once(&self, now: Instant) {
        let overall = self.source.overall_usage();
        let cores = self.source.per_core_usage();
        let processes = self.source.top_processes();

        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());

        match overall {
            Ok(usage) => {
                self.feed(&mut state, MetricKey::CpuTotal, EntityKey::Global, usage, now);
                state.history.record(now, usage);
                if let Some(avg) = state.history.sustained_average(now) {
                    self.feed(&mut state, MetricKey::CpuSustained, EntityKey::Global, avg, now);
                }
            }
            Err(e) => report_check_failure(&self.dispatcher, SOURCE, "overall_usage", &e),
        }

        match cores {
            Ok(cores) => {
                let mut seen = HashSet::new();
                for core in &cores {
                    let entity = EntityKey::Core(core.core_id);
                    seen.insert(entity.clone());
                    self.feed(&mut state, MetricKey::CpuCore, entity, core.usage, now);
                }
                state
                    .tracker
                    .prune_absent(|entity| matches!(entity, EntityKey::Core(_)), &seen);
            }
            Err(e) => report_check_failure(&self.dispatcher, SOURCE, "per_core_usage", &e),
        }

        match processes {
            Ok(processes) => {
                let mut seen = HashSet::new();
                for process in &processes {
                    let entity = EntityKey::Pid(process.pid);
                    seen.insert(entity.clone());
                    self.feed_with_context(
                        &mut state,
                        MetricKey::CpuProcess,
                        entity,
                        EntityContext::process(process.pid, process.name.clone()),
                        process.cpu_percent,
                        now,
                    );
                }
                state
                    .tracker
                    .prune_absent(|entity| matches!(entity, EntityKey::Pid(_)), &seen);
            }
            Err(e) => report_check_failure(&self.dispatcher, SOURCE, "top_processes", &e),
        }

        drop(state);
        self.dispatcher
            .publish(crate::events::MetricEvent::new(
                crate::events::EventKind::MetricsUpdated,
                SOURCE,
            ));
    }

    fn feed(
        &self,
        state: &mut MonitorState,
        metric: MetricKey,
        entity: EntityKey,
        value: f64,
        now: Instant,
    ) {
        let context = entity.context();
        self.feed_with_context(state, metric, entity, context, value, now);
    }

    fn feed_with_context(
        &self,
        state: &mut MonitorState,
        metric: MetricKey,
        entity: EntityKey,
        context: EntityContext,
        value: f64,
        now: Instant,
    ) {
        for (name, config) in state.registry.for_metric(metric) {
            if let Some(fired) = state.tracker.observe(
                &name,
                &config,
                entity.clone(),
                context.clone(),
                value,
                now,
            ) {
                publish_fired(&self.dispatcher, &self.notifiers, SOURCE, &fired);
            }
        }
    }

    fn tick_interval(&self) -> Duration {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .registry
            .min_check_interval()
    }
}

/// Background monitor for CPU thresholds
pub struct CpuThresholdMonitor<S: CpuMetricSource + 'static> {
    core: Arc<MonitorCore<S>>,
    shutdown: ShutdownSignal,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl<S: CpuMetricSource + 'static> CpuThresholdMonitor<S> {
    /// Create a monitor carrying the built-in CPU thresholds and a terminal
    /// notifier
    pub fn new(source: Arc<S>, dispatcher: Arc<EventDispatcher>) -> Self {
        let thresholds = AlertConfig::default()
            .to_thresholds()
            .unwrap_or_default()
            .into_iter()
            .filter(|(_, config)| is_cpu_metric(config.metric))
            .collect();
        Self::with_thresholds(source, dispatcher, thresholds, NotificationFanout::default())
    }

    /// Create a monitor with explicit thresholds and notification channels
    pub fn with_thresholds(
        source: Arc<S>,
        dispatcher: Arc<EventDispatcher>,
        thresholds: Vec<(String, ThresholdConfig)>,
        notifiers: NotificationFanout,
    ) -> Self {
        let mut registry = ThresholdRegistry::new();
        for (name, config) in thresholds {
            registry.set(&name, config);
        }

        Self {
            core: Arc::new(MonitorCore {
                source,
                dispatcher,
                notifiers,
                state: Mutex::new(MonitorState {
                    registry,
                    tracker: AlertTracker::new(),
                    history: SampleHistory::new(),
                }),
            }),
            shutdown: ShutdownSignal::new(),
            worker: Mutex::new(None),
        }
    }

    /// Start the background evaluation loop; a second call is a no-op
    pub fn start(&self) {
        let mut worker = self.worker.lock().unwrap_or_else(|e| e.into_inner());
        if worker.is_some() || self.shutdown.is_stopped() {
            return;
        }

        let core = Arc::clone(&self.core);
        let shutdown = self.shutdown.clone();
        *worker = Some(
            std::thread::Builder::new()
                .name("cpu-monitor".to_string())
                .spawn(move || loop {
                    core.evaluate_once(Instant::now());
                    if shutdown.wait_timeout(core.tick_interval()) {
                        break;
                    }
                })
                .expect("failed to spawn cpu monitor worker"),
        );
    }

    /// Stop the evaluation loop; idempotent
    pub fn stop(&self) {
        self.shutdown.stop();
        let handle = self.worker.lock().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(handle) = handle {
            let _ = handle.join();
        }
    }

    pub fn is_running(&self) -> bool {
        self.worker
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
            && !self.shutdown.is_stopped()
    }

    /// Run one evaluation pass synchronously
    pub fn check_now(&self) {
        self.core.evaluate_once(Instant::now());
    }

    /// Adjust an existing threshold; in-flight state for it is discarded
    pub fn set_threshold(
        &self,
        name: &str,
        threshold: f64,
        duration: Duration,
        severity: AlertSeverity,
        message: Option<&str>,
    ) -> bool {
        let mut state = self.core.state.lock().unwrap_or_else(|e| e.into_inner());
        let adjusted = state
            .registry
            .adjust(name, threshold, duration, severity, message);
        if adjusted {
            state.tracker.reset(name);
        }
        adjusted
    }

    /// Insert or replace a full threshold definition
    pub fn define_threshold(&self, name: &str, config: ThresholdConfig) -> bool {
        let mut state = self.core.state.lock().unwrap_or_else(|e| e.into_inner());
        let accepted = state.registry.set(name, config);
        if accepted {
            state.tracker.reset(name);
        }
        accepted
    }

    /// Snapshot of currently active alerts, keyed by entity-prefixed name
    pub fn active_alerts(&self) -> HashMap<String, ActiveAlert> {
        let state = self.core.state.lock().unwrap_or_else(|e| e.into_inner());
        state.tracker.active_alerts(&state.registry, Instant::now())
    }

    /// Registered thresholds, for display
    pub fn thresholds(&self) -> Vec<(String, ThresholdConfig)> {
        self.core
            .state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .registry
            .snapshot()
    }
}

impl<S: CpuMetricSource + 'static> Drop for CpuThresholdMonitor<S> {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::types::AlertKind;
    use crate::mock::MockCpuSource;

    fn monitor_with(
        source: Arc<MockCpuSource>,
        thresholds: Vec<(String, ThresholdConfig)>,
    ) -> CpuThresholdMonitor<MockCpuSource> {
        CpuThresholdMonitor::with_thresholds(
            source,
            Arc::new(EventDispatcher::new()),
            thresholds,
            NotificationFanout::new(),
        )
    }

    fn cpu_high(duration_secs: u64) -> (String, ThresholdConfig) {
        (
            "cpu_usage_high".to_string(),
            ThresholdConfig::new(
                AlertKind::CpuUsageHigh,
                MetricKey::CpuTotal,
                80.0,
                Duration::from_secs(duration_secs),
                AlertSeverity::Warning,
            ),
        )
    }

    #[test]
    fn test_breach_fires_after_duration() {
        let source = Arc::new(MockCpuSource::new());
        source.set_overall_usage(95.0);
        let monitor = monitor_with(Arc::clone(&source), vec![cpu_high(60)]);

        let t0 = Instant::now();
        monitor.core.evaluate_once(t0);
        assert!(monitor.active_alerts().is_empty());

        monitor.core.evaluate_once(t0 + Duration::from_secs(61));
        let active = monitor.active_alerts();
        assert_eq!(active.len(), 1);
        assert!(active.contains_key("cpu_usage_high"));
        assert_eq!(active["cpu_usage_high"].current_value, 95.0);
    }

    #[test]
    fn test_recovery_clears_active_alert() {
        let source = Arc::new(MockCpuSource::new());
        source.set_overall_usage(95.0);
        let monitor = monitor_with(Arc::clone(&source), vec![cpu_high(0)]);

        let t0 = Instant::now();
        monitor.core.evaluate_once(t0);
        assert_eq!(monitor.active_alerts().len(), 1);

        source.set_overall_usage(40.0);
        monitor.core.evaluate_once(t0 + Duration::from_secs(5));
        assert!(monitor.active_alerts().is_empty());
    }

    #[test]
    fn test_per_core_entities_are_independent() {
        let source = Arc::new(MockCpuSource::new());
        source.set_overall_usage(10.0);
        source.set_core_usage(vec![(0, 97.0), (1, 12.0)]);

        let config = ThresholdConfig::new(
            AlertKind::CpuCoreUsageHigh,
            MetricKey::CpuCore,
            90.0,
            Duration::from_secs(0),
            AlertSeverity::Warning,
        );
        let monitor = monitor_with(
            Arc::clone(&source),
            vec![("core_usage_high".to_string(), config)],
        );

        monitor.check_now();
        let active = monitor.active_alerts();
        assert_eq!(active.len(), 1);
        assert!(active.contains_key("core_0_core_usage_high"));
    }

    #[test]
    fn test_vanished_process_state_pruned() {
        let source = Arc::new(MockCpuSource::new());
        source.set_overall_usage(10.0);
        source.set_processes(vec![(1234, "chrome", 20.0)]);

        let config = ThresholdConfig::new(
            AlertKind::ProcessCpuUsageHigh,
            MetricKey::CpuProcess,
            50.0,
            Duration::from_secs(120),
            AlertSeverity::Warning,
        );
        let monitor = monitor_with(
            Arc::clone(&source),
            vec![("process_cpu_high".to_string(), config)],
        );

        let t0 = Instant::now();
        monitor.core.evaluate_once(t0);
        {
            let state = monitor.core.state.lock().unwrap();
            assert!(state
                .tracker
                .state("process_cpu_high", &EntityKey::Pid(1234))
                .is_some());
        }

        source.set_processes(vec![]);
        monitor.core.evaluate_once(t0 + Duration::from_secs(5));
        {
            let state = monitor.core.state.lock().unwrap();
            assert!(state
                .tracker
                .state("process_cpu_high", &EntityKey::Pid(1234))
                .is_none());
        }
    }

    #[test]
    fn test_failed_check_does_not_block_others() {
        let source = Arc::new(MockCpuSource::new());
        source.set_overall_usage(95.0);
        source.fail_core_usage(true);
        let monitor = monitor_with(Arc::clone(&source), vec![cpu_high(0)]);

        // The overall check still evaluates despite the per-core failure
        monitor.check_now();
        assert_eq!(monitor.active_alerts().len(), 1);
    }

    #[test]
    fn test_set_threshold_resets_state() {
        let source = Arc::new(MockCpuSource::new());
        source.set_overall_usage(95.0);
        let monitor = monitor_with(Arc::clone(&source), vec![cpu_high(60)]);

        let t0 = Instant::now();
        monitor.core.evaluate_once(t0);
        monitor.core.evaluate_once(t0 + Duration::from_secs(30));

        // Reconfiguring discards the accumulated 30 seconds of breach
        assert!(monitor.set_threshold(
            "cpu_usage_high",
            85.0,
            Duration::from_secs(60),
            AlertSeverity::Critical,
            None,
        ));
        monitor.core.evaluate_once(t0 + Duration::from_secs(61));
        assert!(monitor.active_alerts().is_empty());

        monitor.core.evaluate_once(t0 + Duration::from_secs(125));
        assert_eq!(monitor.active_alerts().len(), 1);
    }

    #[test]
    fn test_define_threshold_replaces_and_resets_state() {
        let source = Arc::new(MockCpuSource::new());
        source.set_overall_usage(95.0);
        let monitor = monitor_with(Arc::clone(&source), vec![cpu_high(60)]);

        let t0 = Instant::now();
        monitor.core.evaluate_once(t0);
        monitor.core.evaluate_once(t0 + Duration::from_secs(30));

        // Replacing the definition discards the accumulated 30 seconds of
        // breach, so the duration gate starts over
        let replacement = ThresholdConfig::new(
            AlertKind::CpuUsageVeryHigh,
            MetricKey::CpuTotal,
            90.0,
            Duration::from_secs(60),
            AlertSeverity::Critical,
        );
        assert!(monitor.define_threshold("cpu_usage_high", replacement));
        monitor.core.evaluate_once(t0 + Duration::from_secs(61));
        assert!(monitor.active_alerts().is_empty());

        monitor.core.evaluate_once(t0 + Duration::from_secs(125));
        let active = monitor.active_alerts();
        assert_eq!(active.len(), 1);
        assert_eq!(active["cpu_usage_high"].kind, AlertKind::CpuUsageVeryHigh);
    }

    #[test]
    fn test_define_threshold_rejected_config_keeps_state() {
        let source = Arc::new(MockCpuSource::new());
        source.set_overall_usage(95.0);
        let monitor = monitor_with(Arc::clone(&source), vec![cpu_high(60)]);

        let t0 = Instant::now();
        monitor.core.evaluate_once(t0);

        // A non-finite replacement is rejected; the previous config and the
        // in-flight breach accumulation both survive
        let bad = ThresholdConfig::new(
            AlertKind::CpuUsageHigh,
            MetricKey::CpuTotal,
            f64::NAN,
            Duration::from_secs(60),
            AlertSeverity::Warning,
        );
        assert!(!monitor.define_threshold("cpu_usage_high", bad));
        {
            let state = monitor.core.state.lock().unwrap();
            assert_eq!(state.registry.get("cpu_usage_high").unwrap().threshold, 80.0);
            assert!(state
                .tracker
                .state("cpu_usage_high", &EntityKey::Global)
                .unwrap()
                .exceeded_since
                .is_some());
        }

        // The original 60 second gate still fires on schedule
        monitor.core.evaluate_once(t0 + Duration::from_secs(61));
        assert_eq!(monitor.active_alerts().len(), 1);
    }

    #[test]
    fn test_set_threshold_unknown_name() {
        let source = Arc::new(MockCpuSource::new());
        let monitor = monitor_with(source, vec![cpu_high(60)]);
        assert!(!monitor.set_threshold(
            "nope",
            1.0,
            Duration::from_secs(1),
            AlertSeverity::Info,
            None
        ));
    }

    #[test]
    fn test_start_stop_idempotent() {
        let source = Arc::new(MockCpuSource::new());
        source.set_overall_usage(10.0);
        let monitor = monitor_with(source, vec![cpu_high(60)]);

        monitor.start();
        monitor.start();
        assert!(monitor.is_running());

        monitor.stop();
        monitor.stop();
        assert!(!monitor.is_running());
    }

    #[test]
    fn test_fired_alert_publishes_event() {
        use crate::events::{EventKind, EventObserver, MetricEvent};
        use std::sync::atomic::{AtomicUsize, Ordering};

        struct Collector {
            seen: AtomicUsize,
        }
        impl EventObserver for Collector {
            fn update(&self, event: &MetricEvent) -> crate::error::Result<()> {
                assert_eq!(event.kind, EventKind::ThresholdExceeded);
                assert_eq!(event.source, "CpuThresholdMonitor");
                self.seen.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        }

        let dispatcher = Arc::new(EventDispatcher::new());
        let collector = Arc::new(Collector {
            seen: AtomicUsize::new(0),
        });
        let _sub = dispatcher.subscribe(&collector, [EventKind::ThresholdExceeded]);
        dispatcher.start();

        let source = Arc::new(MockCpuSource::new());
        source.set_overall_usage(95.0);
        let monitor = CpuThresholdMonitor::with_thresholds(
            source,
            Arc::clone(&dispatcher),
            vec![cpu_high(0)],
            NotificationFanout::new(),
        );
        monitor.check_now();

        std::thread::sleep(Duration::from_millis(50));
        dispatcher.stop();
        assert_eq!(collector.seen.load(Ordering::SeqCst), 1);
    }
}
