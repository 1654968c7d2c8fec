//! Event dispatcher
//!
//! Thread-safe, ordered, asynchronous delivery of metric events from
//! producers (the evaluation loops) to filtered subscribers. One dispatcher
//! instance is constructed per process and shared by reference; it is not a
//! global.
//!
//! Subscribers are held weakly: dropping the last strong reference to an
//! observer stops delivery and the slot is reclaimed on the next dispatch
//! pass. The [`Subscription`] handle returned by `subscribe` unregisters the
//! observer when dropped, so neither explicit unsubscription nor collector
//! timing is required for correctness.

use crate::error::Result;
use crate::events::types::{EventKind, MetricEvent};

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, Weak};
use std::thread::JoinHandle;
use std::time::Duration;

/// How long the worker blocks on the queue before re-checking the stop flag.
/// Bounds shutdown latency.
const POLL_QUANTUM: Duration = Duration::from_millis(250);

/// Observer interface for metric events
///
/// `update` returns a `Result` so a failing observer can report its error;
/// the dispatcher logs it and continues with the remaining observers.
pub trait EventObserver: Send + Sync {
    fn update(&self, event: &MetricEvent) -> Result<()>;
}

struct SubscriberSlot {
    id: u64,
    observer: Weak<dyn EventObserver>,
    /// `None` means "all event kinds"
    filter: Option<HashSet<EventKind>>,
}

/// Handle returned from `subscribe`
///
/// Dropping the handle unregisters the observer.
#[must_use = "dropping the subscription unregisters the observer"]
pub struct Subscription {
    id: u64,
    subscribers: Weak<Mutex<Vec<SubscriberSlot>>>,
}

impl Subscription {
    /// Explicitly unregister the observer
    pub fn cancel(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(subscribers) = self.subscribers.upgrade() {
            let mut subs = subscribers.lock().unwrap_or_else(|e| e.into_inner());
            subs.retain(|slot| slot.id != self.id);
        }
    }
}

/// Central event dispatcher
///
/// Events are delivered in publish order through a single FIFO queue drained
/// by one background worker. `publish` never blocks beyond trivial queue
/// insertion.
pub struct EventDispatcher {
    subscribers: Arc<Mutex<Vec<SubscriberSlot>>>,
    tx: Mutex<Sender<MetricEvent>>,
    rx: Mutex<Option<Receiver<MetricEvent>>>,
    running: Arc<AtomicBool>,
    worker: Mutex<Option<JoinHandle<()>>>,
    next_id: AtomicU64,
}

impl EventDispatcher {
    /// Create a new dispatcher
    ///
    /// Events published before `start` are queued and delivered once the
    /// worker runs.
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            subscribers: Arc::new(Mutex::new(Vec::new())),
            tx: Mutex::new(tx),
            rx: Mutex::new(Some(rx)),
            running: Arc::new(AtomicBool::new(false)),
            worker: Mutex::new(None),
            next_id: AtomicU64::new(1),
        }
    }

    /// Start the background delivery worker
    ///
    /// Calling `start` on an already started (or stopped) dispatcher is a
    /// no-op.
    pub fn start(&self) {
        let mut worker = self.worker.lock().unwrap_or_else(|e| e.into_inner());
        if worker.is_some() {
            return;
        }

        let rx = match self
            .rx
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
        {
            Some(rx) => rx,
            // Queue already consumed by a previous start/stop cycle
            None => return,
        };

        self.running.store(true, Ordering::SeqCst);
        let running = Arc::clone(&self.running);
        let subscribers = Arc::clone(&self.subscribers);

        *worker = Some(
            std::thread::Builder::new()
                .name("event-dispatcher".to_string())
                .spawn(move || {
                    while running.load(Ordering::SeqCst) {
                        match rx.recv_timeout(POLL_QUANTUM) {
                            Ok(event) => dispatch(&subscribers, &event),
                            Err(RecvTimeoutError::Timeout) => continue,
                            Err(RecvTimeoutError::Disconnected) => break,
                        }
                    }
                })
                .expect("failed to spawn dispatcher worker"),
        );
    }

    /// Stop the background delivery worker
    ///
    /// Idempotent and safe to call without a prior `start`. The worker exits
    /// within one polling quantum.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        let handle = self.worker.lock().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(handle) = handle {
            let _ = handle.join();
        }
    }

    /// Whether the delivery worker is currently running
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Enqueue an event for delivery
    ///
    /// Never blocks the caller beyond queue insertion.
    pub fn publish(&self, event: MetricEvent) {
        let tx = self.tx.lock().unwrap_or_else(|e| e.into_inner());
        // A send error means the worker exited and dropped the receiver;
        // the event is discarded, matching stopped-dispatcher semantics.
        let _ = tx.send(event);
    }

    /// Register an observer for the given event kinds
    ///
    /// Only events whose kind is in `kinds` are delivered. The observer is
    /// held weakly; keep the returned handle alive for as long as delivery
    /// is wanted.
    pub fn subscribe<O>(
        &self,
        observer: &Arc<O>,
        kinds: impl IntoIterator<Item = EventKind>,
    ) -> Subscription
    where
        O: EventObserver + 'static,
    {
        self.register(observer, Some(kinds.into_iter().collect()))
    }

    /// Register an observer for every event kind
    pub fn subscribe_all<O>(&self, observer: &Arc<O>) -> Subscription
    where
        O: EventObserver + 'static,
    {
        self.register(observer, None)
    }

    fn register<O>(&self, observer: &Arc<O>, filter: Option<HashSet<EventKind>>) -> Subscription
    where
        O: EventObserver + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let weak = Arc::downgrade(observer);
        let weak: Weak<dyn EventObserver> = weak;

        let mut subs = self
            .subscribers
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        subs.push(SubscriberSlot {
            id,
            observer: weak,
            filter,
        });

        Subscription {
            id,
            subscribers: Arc::downgrade(&self.subscribers),
        }
    }

    /// Number of registered subscriber slots (including not-yet-reclaimed
    /// dead ones)
    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for EventDispatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Deliver one event to every live, matching observer
///
/// Observers are collected under the lock and invoked outside it, so a
/// callback may itself subscribe or publish without deadlocking. Dead weak
/// references are reclaimed here.
fn dispatch(subscribers: &Mutex<Vec<SubscriberSlot>>, event: &MetricEvent) {
    let targets: Vec<Arc<dyn EventObserver>> = {
        let mut subs = subscribers.lock().unwrap_or_else(|e| e.into_inner());
        subs.retain(|slot| slot.observer.strong_count() > 0);
        subs.iter()
            .filter(|slot| match &slot.filter {
                Some(kinds) => kinds.contains(&event.kind),
                None => true,
            })
            .filter_map(|slot| slot.observer.upgrade())
            .collect()
    };

    for observer in targets {
        if let Err(e) = observer.update(event) {
            log::warn!("Observer failed to handle {} event: {}", event.kind, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use std::sync::atomic::AtomicUsize;

    struct CountingObserver {
        seen: AtomicUsize,
    }

    impl CountingObserver {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                seen: AtomicUsize::new(0),
            })
        }

        fn count(&self) -> usize {
            self.seen.load(Ordering::SeqCst)
        }
    }

    impl EventObserver for CountingObserver {
        fn update(&self, _event: &MetricEvent) -> Result<()> {
            self.seen.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct FailingObserver;

    impl EventObserver for FailingObserver {
        fn update(&self, _event: &MetricEvent) -> Result<()> {
            Err(AppError::Delivery("observer exploded".to_string()))
        }
    }

    fn drain(dispatcher: &EventDispatcher) {
        // The worker drains the queue in FIFO order; stopping joins it after
        // at most one polling quantum, by which point queued events have
        // been delivered.
        std::thread::sleep(Duration::from_millis(50));
        dispatcher.stop();
    }

    #[test]
    fn test_delivery_to_matching_subscriber() {
        let dispatcher = EventDispatcher::new();
        let observer = CountingObserver::new();
        let _sub = dispatcher.subscribe(&observer, [EventKind::ThresholdExceeded]);

        dispatcher.start();
        dispatcher.publish(MetricEvent::new(EventKind::ThresholdExceeded, "test"));
        dispatcher.publish(MetricEvent::new(EventKind::MetricsUpdated, "test"));
        drain(&dispatcher);

        // The MetricsUpdated event is filtered out
        assert_eq!(observer.count(), 1);
    }

    #[test]
    fn test_events_queued_before_start() {
        let dispatcher = EventDispatcher::new();
        let observer = CountingObserver::new();
        let _sub = dispatcher.subscribe_all(&observer);

        dispatcher.publish(MetricEvent::new(EventKind::MetricsUpdated, "test"));
        dispatcher.start();
        drain(&dispatcher);

        assert_eq!(observer.count(), 1);
    }

    #[test]
    fn test_failing_observer_does_not_block_others() {
        let dispatcher = EventDispatcher::new();
        let failing = Arc::new(FailingObserver);
        let counting = CountingObserver::new();
        let _sub1 = dispatcher.subscribe_all(&failing);
        let _sub2 = dispatcher.subscribe_all(&counting);

        dispatcher.start();
        dispatcher.publish(MetricEvent::new(EventKind::ThresholdExceeded, "test"));
        dispatcher.publish(MetricEvent::new(EventKind::ThresholdExceeded, "test"));
        drain(&dispatcher);

        // Both events reach the healthy observer and the worker keeps running
        assert_eq!(counting.count(), 2);
    }

    #[test]
    fn test_dropped_subscription_stops_delivery() {
        let dispatcher = EventDispatcher::new();
        let observer = CountingObserver::new();
        let sub = dispatcher.subscribe_all(&observer);
        assert_eq!(dispatcher.subscriber_count(), 1);

        sub.cancel();
        assert_eq!(dispatcher.subscriber_count(), 0);

        dispatcher.start();
        dispatcher.publish(MetricEvent::new(EventKind::MetricsUpdated, "test"));
        drain(&dispatcher);

        assert_eq!(observer.count(), 0);
    }

    #[test]
    fn test_dropped_observer_slot_reclaimed() {
        let dispatcher = EventDispatcher::new();
        let observer = CountingObserver::new();
        let _sub = dispatcher.subscribe_all(&observer);
        drop(observer);

        dispatcher.start();
        dispatcher.publish(MetricEvent::new(EventKind::MetricsUpdated, "test"));
        drain(&dispatcher);

        // The dead slot was pruned on the dispatch pass
        assert_eq!(dispatcher.subscriber_count(), 0);
    }

    #[test]
    fn test_stop_is_idempotent() {
        let dispatcher = EventDispatcher::new();
        // stop without start
        dispatcher.stop();
        dispatcher.stop();
        assert!(!dispatcher.is_running());

        dispatcher.start();
        assert!(dispatcher.is_running());
        dispatcher.stop();
        dispatcher.stop();
        assert!(!dispatcher.is_running());
    }
}
