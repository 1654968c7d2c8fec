//! Threshold monitors
//!
//! Background evaluation loops that poll a metric source on a fixed tick,
//! feed readings through the alert state machine, and publish threshold
//! events. One monitor owns one source; monitors share nothing but the
//! dispatcher they publish to.

pub mod cpu;
pub mod network;

pub use cpu::CpuThresholdMonitor;
pub use network::NetworkThresholdMonitor;

use crate::alerts::types::{FiredAlert, MetricKey, ThresholdConfig};
use crate::alerts::NotificationFanout;
use crate::error::MetricError;
use crate::events::{EventDispatcher, EventKind, MetricEvent};

use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

pub(crate) fn is_cpu_metric(metric: MetricKey) -> bool {
    matches!(
        metric,
        MetricKey::CpuTotal | MetricKey::CpuSustained | MetricKey::CpuCore | MetricKey::CpuProcess
    )
}

pub(crate) fn is_network_metric(metric: MetricKey) -> bool {
    !is_cpu_metric(metric)
}

/// Split a threshold set between the CPU and network monitors
pub fn partition_thresholds(
    thresholds: Vec<(String, ThresholdConfig)>,
) -> (
    Vec<(String, ThresholdConfig)>,
    Vec<(String, ThresholdConfig)>,
) {
    thresholds
        .into_iter()
        .partition(|(_, config)| is_cpu_metric(config.metric))
}

/// Interruptible sleep shared between a monitor and its worker thread
///
/// `wait_timeout` returns early (with `true`) as soon as `stop` is called,
/// so worker shutdown latency is bounded by lock contention rather than the
/// tick interval.
#[derive(Clone)]
pub(crate) struct ShutdownSignal {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl ShutdownSignal {
    pub(crate) fn new() -> Self {
        Self {
            inner: Arc::new((Mutex::new(false), Condvar::new())),
        }
    }

    /// Request shutdown and wake any waiting worker
    pub(crate) fn stop(&self) {
        let (lock, cvar) = &*self.inner;
        let mut stopped = lock.lock().unwrap_or_else(|e| e.into_inner());
        *stopped = true;
        cvar.notify_all();
    }

    pub(crate) fn is_stopped(&self) -> bool {
        let (lock, _) = &*self.inner;
        *lock.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Sleep for up to `timeout`; returns true if shutdown was requested
    pub(crate) fn wait_timeout(&self, timeout: Duration) -> bool {
        let (lock, cvar) = &*self.inner;
        let mut stopped = lock.lock().unwrap_or_else(|e| e.into_inner());
        let deadline = std::time::Instant::now() + timeout;
        while !*stopped {
            let remaining = deadline.saturating_duration_since(std::time::Instant::now());
            if remaining.is_zero() {
                return false;
            }
            let (guard, result) = cvar
                .wait_timeout(stopped, remaining)
                .unwrap_or_else(|e| e.into_inner());
            stopped = guard;
            if result.timed_out() && !*stopped {
                return false;
            }
        }
        true
    }
}

/// Publish a fired alert as an event and deliver it to notification channels
pub(crate) fn publish_fired(
    dispatcher: &EventDispatcher,
    notifiers: &NotificationFanout,
    source: &str,
    alert: &FiredAlert,
) {
    let context = &alert.context;
    let mut event = MetricEvent::new(EventKind::ThresholdExceeded, source)
        .with_message(alert.message())
        .with_data("name", serde_json::json!(alert.name))
        .with_data("kind", serde_json::json!(alert.config.kind.to_string()))
        .with_data("severity", serde_json::json!(alert.config.severity.to_string()))
        .with_data("threshold", serde_json::json!(alert.config.threshold))
        .with_data("value", serde_json::json!(alert.value))
        .with_data(
            "exceeded_secs",
            serde_json::json!(alert.exceeded_for.as_secs_f64()),
        );

    if let Some(core_id) = context.core_id {
        event = event.with_data("core_id", serde_json::json!(core_id));
    }
    if let Some(pid) = context.pid {
        event = event.with_data("pid", serde_json::json!(pid));
    }
    if let Some(name) = &context.process_name {
        event = event.with_data("process_name", serde_json::json!(name));
    }
    if let Some(name) = &context.interface_name {
        event = event.with_data("interface_name", serde_json::json!(name));
    }

    dispatcher.publish(event);
    notifiers.notify_all(alert);
}

/// Log a failed check and publish a collection error event
pub(crate) fn report_check_failure(
    dispatcher: &EventDispatcher,
    source: &str,
    check: &str,
    error: &MetricError,
) {
    log::warn!("{}: {} check failed: {}", source, check, error);
    dispatcher.publish(
        MetricEvent::new(EventKind::CollectionError, source)
            .with_message(format!("{} check failed: {}", check, error))
            .with_data("check", serde_json::json!(check)),
    );
}
