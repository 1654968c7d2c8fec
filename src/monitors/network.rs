//! Network threshold monitor
//!
//! Polls a network metric source and evaluates bandwidth, connection count,
//! per-interface, per-process, and WiFi signal thresholds.

use crate::alerts::types::{
    ActiveAlert, AlertSeverity, EntityContext, EntityKey, MetricKey, ThresholdConfig,
};
use crate::alerts::{AlertConfig, AlertTracker, NotificationFanout, SampleHistory, ThresholdRegistry};
use crate::events::EventDispatcher;
use crate::metrics::NetworkMetricSource;
use crate::monitors::{is_network_metric, publish_fired, report_check_failure, ShutdownSignal};

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

const SOURCE: &str = "NetworkThresholdMonitor";

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

impl<S: NetworkMetricSource> MonitorCore<S> {
    /// Run one evaluation pass
    ///
    /// Readings are fetched before the state lock is taken; a failed check
    /// is reported and the remaining checks still run.
    fn evaluate_once(&self, now: Instant) {
        let bandwidth = self.source.bandwidth();
        let connections = self.source.connection_stats();
        let interfaces = self.source.interfaces();
        let processes = self.source.network_processes();
        let wifi = self.source.wifi_details();

        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());

        match bandwidth {
            Ok(bw) => {
                let total = bw.total();
                self.feed(&mut state, MetricKey::BandwidthTotal, EntityKey::Global, total, now);
                self.feed(
                    &mut state,
                    MetricKey::BandwidthRx,
                    EntityKey::Global,
                    bw.rx_bytes_per_sec,
                    now,
                );
                self.feed(
                    &mut state,
                    MetricKey::BandwidthTx,
                    EntityKey::Global,
                    bw.tx_bytes_per_sec,
                    now,
                );
                state.history.record(now, total);
                if let Some(avg) = state.history.sustained_average(now) {
                    self.feed(
                        &mut state,
                        MetricKey::BandwidthSustained,
                        EntityKey::Global,
                        avg,
                        now,
                    );
                }
            }
            Err(e) => report_check_failure(&self.dispatcher, SOURCE, "bandwidth", &e),
        }

        match connections {
            Ok(stats) => {
                self.feed(
                    &mut state,
                    MetricKey::ConnectionCount,
                    EntityKey::Global,
                    stats.total as f64,
                    now,
                );
            }
            Err(e) => report_check_failure(&self.dispatcher, SOURCE, "connection_stats", &e),
        }

        match interfaces {
            Ok(interfaces) => {
                let mut seen = HashSet::new();
                for interface in &interfaces {
                    let entity = EntityKey::Interface(interface.name.clone());
                    seen.insert(entity.clone());
                    if !interface.active {
                        continue;
                    }
                    self.feed(
                        &mut state,
                        MetricKey::InterfaceBandwidth,
                        entity.clone(),
                        interface.bandwidth_bytes_per_sec,
                        now,
                    );
                    self.feed(
                        &mut state,
                        MetricKey::InterfaceErrors,
                        entity,
                        interface.errors as f64,
                        now,
                    );
                }
                state
                    .tracker
                    .prune_absent(|entity| matches!(entity, EntityKey::Interface(_)), &seen);
            }
            Err(e) => report_check_failure(&self.dispatcher, SOURCE, "interfaces", &e),
        }

        match processes {
            Ok(processes) => {
                let mut seen = HashSet::new();
                for process in &processes {
                    let entity = EntityKey::Process(process.name.clone());
                    seen.insert(entity.clone());
                    self.feed(
                        &mut state,
                        MetricKey::ProcessBandwidth,
                        entity,
                        process.bytes_per_sec,
                        now,
                    );
                }
                state
                    .tracker
                    .prune_absent(|entity| matches!(entity, EntityKey::Process(_)), &seen);
            }
            Err(e) => report_check_failure(&self.dispatcher, SOURCE, "network_processes", &e),
        }

        match wifi {
            Ok(Some(status)) if status.connected => {
                self.feed(
                    &mut state,
                    MetricKey::WifiSignal,
                    EntityKey::Global,
                    status.signal_strength,
                    now,
                );
            }
            Ok(_) => {}
            Err(e) => report_check_failure(&self.dispatcher, SOURCE, "wifi_details", &e),
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

/// Background monitor for network thresholds
pub struct NetworkThresholdMonitor<S: NetworkMetricSource + 'static> {
    core: Arc<MonitorCore<S>>,
    shutdown: ShutdownSignal,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl<S: NetworkMetricSource + 'static> NetworkThresholdMonitor<S> {
    /// Create a monitor carrying the built-in network thresholds and a
    /// terminal notifier
    pub fn new(source: Arc<S>, dispatcher: Arc<EventDispatcher>) -> Self {
        let thresholds = AlertConfig::default()
            .to_thresholds()
            .unwrap_or_default()
            .into_iter()
            .filter(|(_, config)| is_network_metric(config.metric))
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
                .name("network-monitor".to_string())
                .spawn(move || loop {
                    core.evaluate_once(Instant::now());
                    if shutdown.wait_timeout(core.tick_interval()) {
                        break;
                    }
                })
                .expect("failed to spawn network monitor worker"),
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

impl<S: NetworkMetricSource + 'static> Drop for NetworkThresholdMonitor<S> {
    fn drop(&mut self) {
        self.stop();
    }
}
