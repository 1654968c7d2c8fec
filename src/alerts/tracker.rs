//! Alert state tracking
//!
//! The generic per-(threshold, entity) state machine behind every check the
//! monitors run. The design is level-triggered but edge-alerted: a breach
//! must hold continuously for the configured duration before one alert fires
//! for the episode, and no further alert fires until the condition fully
//! clears and re-breaches.

use crate::alerts::registry::ThresholdRegistry;
use crate::alerts::types::{
    render_message, ActiveAlert, AlertState, EntityContext, EntityKey, FiredAlert,
    ThresholdConfig,
};

use std::collections::{HashMap, HashSet, VecDeque};
use std::time::{Duration, Instant};

/// Key identifying one tracked (threshold, entity) pair
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StateKey {
    pub name: String,
    pub entity: EntityKey,
}

/// Per-(threshold, entity) alert state machine
#[derive(Debug, Default)]
pub struct AlertTracker {
    states: HashMap<StateKey, AlertState>,
}

impl AlertTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one observation through the state machine
    ///
    /// Seeds state lazily the first time a (threshold, entity) pair is seen.
    /// Returns the alert to raise, if the duration gate and cooldown gate
    /// both pass on this observation.
    pub fn observe(
        &mut self,
        name: &str,
        config: &ThresholdConfig,
        entity: EntityKey,
        context: EntityContext,
        value: f64,
        now: Instant,
    ) -> Option<FiredAlert> {
        let key = StateKey {
            name: name.to_string(),
            entity: entity.clone(),
        };
        let state = self.states.entry(key).or_default();
        state.current_value = value;

        if !config.breached(value) {
            // Recovery is immediate: no duration gating on the way down
            state.exceeded_since = None;
            state.is_active = false;
            return None;
        }

        let since = *state.exceeded_since.get_or_insert(now);
        let exceeded_for = now.saturating_duration_since(since);

        if exceeded_for < config.duration || state.is_active {
            // Duration not yet met, or this episode already alerted
            return None;
        }

        let cooled_down = state
            .last_alert
            .map_or(true, |last| now.saturating_duration_since(last) >= config.cooldown);
        if !cooled_down {
            return None;
        }

        state.last_alert = Some(now);
        state.is_active = true;

        Some(FiredAlert {
            name: name.to_string(),
            config: config.clone(),
            entity,
            context,
            value,
            exceeded_for,
        })
    }

    /// Discard all state for a threshold name
    ///
    /// Called when the threshold is reconfigured; partially accumulated
    /// exceed durations and active flags are dropped.
    pub fn reset(&mut self, name: &str) {
        self.states.retain(|key, _| key.name != name);
    }

    /// Drop state for entities that vanished from the latest snapshot
    ///
    /// Only states whose entity matches `candidate`, is not in `seen`, and
    /// is not currently active are removed; an open alert survives the tick
    /// where its entity disappears.
    pub fn prune_absent<F>(&mut self, candidate: F, seen: &HashSet<EntityKey>)
    where
        F: Fn(&EntityKey) -> bool,
    {
        self.states.retain(|key, state| {
            !candidate(&key.entity) || seen.contains(&key.entity) || state.is_active
        });
    }

    /// Currently active alerts, keyed by entity-prefixed threshold name
    /// (e.g. "core_3_core_usage_high")
    pub fn active_alerts(
        &self,
        registry: &ThresholdRegistry,
        now: Instant,
    ) -> HashMap<String, ActiveAlert> {
        let mut result = HashMap::new();
        for (key, state) in &self.states {
            if !state.is_active {
                continue;
            }
            let Some(config) = registry.get(&key.name) else {
                continue;
            };
            let exceeded_for = state
                .exceeded_since
                .map(|since| now.saturating_duration_since(since))
                .unwrap_or_default();
            let context = key.entity.context();

            result.insert(
                format!("{}{}", key.entity.key_prefix(), key.name),
                ActiveAlert {
                    kind: config.kind,
                    severity: config.severity,
                    threshold: config.threshold,
                    current_value: state.current_value,
                    duration_seconds: exceeded_for.as_secs_f64(),
                    message: render_message(
                        &config.message,
                        config.threshold,
                        state.current_value,
                        exceeded_for,
                        &context,
                    ),
                },
            );
        }
        result
    }

    /// Peek at the state for one (threshold, entity) pair
    pub fn state(&self, name: &str, entity: &EntityKey) -> Option<&AlertState> {
        self.states.get(&StateKey {
            name: name.to_string(),
            entity: entity.clone(),
        })
    }

    /// Number of tracked (threshold, entity) pairs
    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

/// Time-windowed history of (timestamp, value) samples
///
/// Backs the sustained-load checks: the monitors feed the rolling average
/// through the same state machine as instantaneous readings, under a
/// dedicated threshold name.
#[derive(Debug)]
pub struct SampleHistory {
    samples: VecDeque<(Instant, f64)>,
    retention: Duration,
}

/// Minimum samples before a sustained average is considered meaningful
const MIN_SAMPLES: usize = 10;

const TEN_MINUTES: Duration = Duration::from_secs(600);
const FIVE_MINUTES: Duration = Duration::from_secs(300);

impl SampleHistory {
    /// One-hour retention, matching the dashboard's history window
    pub fn new() -> Self {
        Self::with_retention(Duration::from_secs(3600))
    }

    pub fn with_retention(retention: Duration) -> Self {
        Self {
            samples: VecDeque::new(),
            retention,
        }
    }

    /// Append a sample and discard anything older than the retention window
    pub fn record(&mut self, now: Instant, value: f64) {
        self.samples.push_back((now, value));
        while let Some(&(ts, _)) = self.samples.front() {
            if now.saturating_duration_since(ts) > self.retention {
                self.samples.pop_front();
            } else {
                break;
            }
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Rolling average for the sustained-load check
    ///
    /// Prefers the trailing 10-minute mean when at least ten samples fall in
    /// that window, otherwise falls back to the 5-minute mean. Returns
    /// `None` until enough history exists for any analysis.
    pub fn sustained_average(&self, now: Instant) -> Option<f64> {
        if self.samples.len() < MIN_SAMPLES {
            return None;
        }

        let ten_min: Vec<f64> = self.window_values(now, TEN_MINUTES);
        if ten_min.len() >= MIN_SAMPLES {
            return Some(mean(&ten_min));
        }

        let five_min = self.window_values(now, FIVE_MINUTES);
        if five_min.is_empty() {
            None
        } else {
            Some(mean(&five_min))
        }
    }

    fn window_values(&self, now: Instant, window: Duration) -> Vec<f64> {
        self.samples
            .iter()
            .filter(|(ts, _)| now.saturating_duration_since(*ts) <= window)
            .map(|(_, value)| *value)
            .collect()
    }
}

impl Default for SampleHistory {
    fn default() -> Self {
        Self::new()
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}
