//! Background cache manager
//!
//! The manager subscribes to the cached notification of every registered
//! producer and records the parameters each notification carries. A sweep
//! asks every producer to rebuild the objects whose schedule elapses within
//! the sweep period, so callers keep hitting a warm cache.

use crate::registry::{Registry, TrackOutcome};
use cache_system::{BackgroundCacheable, CacheParameters, ObjectCached, TrackingIds};
use chrono::Utc;
use futures::FutureExt;
use parking_lot::{Mutex, RwLock};
use signal_system::CallbackId;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tokio_util::sync::CancellationToken;

/// Sweep period applied when `init` receives a non-positive one
pub const DEFAULT_PERIOD_MINUTES: i64 = 5;

/// Outcome of one sweep
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Keys found due across all producers
    pub due: usize,
    /// Keys successfully rebuilt
    pub recached: usize,
    /// Keys whose rebuild returned an error or panicked
    pub failed: usize,
    /// Due keys not attempted because the sweep was cancelled
    pub skipped: usize,
    pub cancelled: bool,
    /// The sweep did not run because another one was in progress
    pub overlapped: bool,
}

struct Subscription {
    service: Arc<dyn BackgroundCacheable>,
    callback: CallbackId,
}

enum State {
    Uninitialized,
    Running {
        period_minutes: i64,
        subscriptions: Vec<Subscription>,
    },
}

/// Process-wide scheduler refreshing cached objects before they go stale
pub struct BackgroundCacheManager {
    cacheable_services: RwLock<Vec<Arc<dyn BackgroundCacheable>>>,
    registry: Arc<Registry>,
    state: Mutex<State>,
    sweeping: AtomicBool,
}

impl std::fmt::Debug for BackgroundCacheManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackgroundCacheManager")
            .field("services", &self.cacheable_services.read().len())
            .field("running", &self.is_running())
            .field("tracked", &self.registry.len())
            .finish()
    }
}

impl BackgroundCacheManager {
    /// Create a manager for the given producers, in sweep order
    pub fn new(cacheable_services: Vec<Arc<dyn BackgroundCacheable>>) -> Self {
        Self {
            cacheable_services: RwLock::new(cacheable_services),
            registry: Arc::new(Registry::new()),
            state: Mutex::new(State::Uninitialized),
            sweeping: AtomicBool::new(false),
        }
    }

    /// Start tracking: subscribe once to every producer's cached notification.
    ///
    /// Calling `init` again while running only updates the period.
    pub fn init(&self, period_minutes: i64) {
        let period_minutes = if period_minutes > 0 {
            period_minutes
        } else {
            DEFAULT_PERIOD_MINUTES
        };

        let mut state = self.state.lock();
        if let State::Running {
            period_minutes: current,
            ..
        } = &mut *state
        {
            tracing::debug!(period_minutes, "background cache manager already running");
            *current = period_minutes;
            return;
        }

        let services = self.cacheable_services.read().clone();
        let mut subscriptions = Vec::with_capacity(services.len());
        for service in services {
            self.registry.ensure_producer(service.cacheable_service_id());

            let registry: Weak<Registry> = Arc::downgrade(&self.registry);
            let callback = service
                .object_cached()
                .add_callback(move |event: &ObjectCached| {
                    if let Some(registry) = registry.upgrade() {
                        Self::track(&registry, &event.service_id, event.parameters.clone());
                    }
                });
            subscriptions.push(Subscription { service, callback });
        }

        tracing::info!(
            period_minutes,
            producers = subscriptions.len(),
            "background cache manager initialized"
        );
        *state = State::Running {
            period_minutes,
            subscriptions,
        };
    }

    /// Record parameters raised by a producer. Unknown producers are ignored.
    pub fn add_cache_parameter(&self, service_id: &str, parameters: CacheParameters) {
        Self::track(&self.registry, service_id, parameters);
    }

    fn track(registry: &Registry, service_id: &str, parameters: CacheParameters) {
        let cache_key = parameters.cache_key.clone();
        match registry.track(service_id, parameters, Utc::now()) {
            TrackOutcome::Added => {
                tracing::debug!(service_id, %cache_key, "tracking cached object for background refresh")
            }
            TrackOutcome::AlreadyTracked => {}
            TrackOutcome::UnknownProducer => {
                tracing::debug!(service_id, %cache_key, "ignoring notification from unregistered producer")
            }
        }
    }

    /// Sweep: rebuild every tracked object due within the period.
    ///
    /// Each producer call is its own failure boundary. Cancellation is checked
    /// before every key; an in-flight rebuild always completes.
    pub async fn recache(&self, tracking: &TrackingIds, cancel: &CancellationToken) -> SweepReport {
        let Some(period_minutes) = self.period_minutes() else {
            return SweepReport::default();
        };

        if self
            .sweeping
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::warn!(%tracking, "background sweep already in progress, skipping");
            return SweepReport {
                overlapped: true,
                ..SweepReport::default()
            };
        }
        let _guard = SweepGuard(&self.sweeping);

        let mut report = SweepReport::default();
        if self.registry.is_empty() {
            return report;
        }

        let services = self.cacheable_services.read().clone();
        for service in services {
            let service_id = service.cacheable_service_id().to_string();
            let due = self.registry.due(&service_id, period_minutes, Utc::now());
            let due_len = due.len();
            report.due += due_len;

            for (index, parameters) in due.into_iter().enumerate() {
                if cancel.is_cancelled() {
                    report.cancelled = true;
                    report.skipped += due_len - index;
                    tracing::info!(%tracking, ?report, "background sweep cancelled");
                    return report;
                }

                let cache_key = parameters.cache_key.clone();
                let outcome = AssertUnwindSafe(service.recache(parameters, tracking))
                    .catch_unwind()
                    .await;

                match outcome {
                    Ok(Ok(rebuilt)) => {
                        self.registry.reschedule(
                            &service_id,
                            &cache_key,
                            rebuilt.cache_duration,
                            Utc::now(),
                        );
                        report.recached += 1;
                    }
                    Ok(Err(e)) => {
                        report.failed += 1;
                        tracing::warn!(%tracking, %service_id, %cache_key, error = %e, "background recache failed");
                    }
                    Err(_) => {
                        report.failed += 1;
                        tracing::error!(%tracking, %service_id, %cache_key, "background recache panicked");
                    }
                }
            }
        }

        tracing::debug!(%tracking, ?report, "background sweep finished");
        report
    }

    /// Stop tracking: drop subscriptions and empty the registry.
    ///
    /// The producer list survives, so a later `init` resubscribes every producer.
    pub fn cleanup(&self) {
        let mut state = self.state.lock();
        if let State::Running { subscriptions, .. } =
            std::mem::replace(&mut *state, State::Uninitialized)
        {
            unsubscribe(subscriptions);
        }
        self.registry.clear();
        tracing::info!("background cache manager cleaned up");
    }

    pub fn is_running(&self) -> bool {
        matches!(*self.state.lock(), State::Running { .. })
    }

    /// Sweep period (also the grace window), `None` until initialized
    pub fn period_minutes(&self) -> Option<i64> {
        match &*self.state.lock() {
            State::Running { period_minutes, .. } => Some(*period_minutes),
            State::Uninitialized => None,
        }
    }

    /// Parameters tracked for a producer, in insertion order
    pub fn tracked_parameters(&self, service_id: &str) -> Vec<CacheParameters> {
        self.registry.tracked(service_id)
    }

    /// Total parameters tracked across producers
    pub fn tracked_count(&self) -> usize {
        self.registry.len()
    }

    pub fn service_count(&self) -> usize {
        self.cacheable_services.read().len()
    }
}

impl Drop for BackgroundCacheManager {
    fn drop(&mut self) {
        if let State::Running { subscriptions, .. } =
            std::mem::replace(self.state.get_mut(), State::Uninitialized)
        {
            unsubscribe(subscriptions);
        }
    }
}

fn unsubscribe(subscriptions: Vec<Subscription>) {
    for subscription in subscriptions {
        subscription
            .service
            .object_cached()
            .remove_callback(subscription.callback);
    }
}

struct SweepGuard<'a>(&'a AtomicBool);

impl Drop for SweepGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
