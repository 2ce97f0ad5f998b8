//! Tracked cache parameters, keyed by producer identity
//!
//! Each producer owns an ordered list unique by cache key. Writers are the
//! cached-notification callbacks, readers are sweeps; no lock is ever held
//! across an `.await`, so notifications may land while a sweep is running.

use cache_system::CacheParameters;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::RwLock;

/// Result of offering parameters to the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackOutcome {
    Added,
    AlreadyTracked,
    UnknownProducer,
}

#[derive(Debug, Default)]
struct ProducerEntries {
    entries: RwLock<Vec<CacheParameters>>,
}

/// Registry of background-cacheable parameters owned by one manager
#[derive(Debug, Default)]
pub struct Registry {
    producers: DashMap<String, ProducerEntries>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make sure a producer has an (initially empty) entry list
    pub fn ensure_producer(&self, service_id: &str) {
        self.producers.entry(service_id.to_string()).or_default();
    }

    pub fn contains_producer(&self, service_id: &str) -> bool {
        self.producers.contains_key(service_id)
    }

    /// Schedule and insert `parameters` unless its cache key is already tracked
    pub fn track(
        &self,
        service_id: &str,
        mut parameters: CacheParameters,
        now: DateTime<Utc>,
    ) -> TrackOutcome {
        let Some(producer) = self.producers.get(service_id) else {
            return TrackOutcome::UnknownProducer;
        };

        parameters.update_next_recache_timestamp_at(now);

        let mut entries = producer.entries.write();
        if entries
            .iter()
            .any(|existing| existing.cache_key == parameters.cache_key)
        {
            return TrackOutcome::AlreadyTracked;
        }
        entries.push(parameters);
        TrackOutcome::Added
    }

    /// Snapshot of a producer's entries due within `grace_period_minutes`, in insertion order
    pub fn due(
        &self,
        service_id: &str,
        grace_period_minutes: i64,
        now: DateTime<Utc>,
    ) -> Vec<CacheParameters> {
        self.producers
            .get(service_id)
            .map(|producer| {
                producer
                    .entries
                    .read()
                    .iter()
                    .filter(|params| params.should_recache_at(grace_period_minutes, now))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Adopt the duration a successful recache resolved and advance the stored schedule
    pub fn reschedule(
        &self,
        service_id: &str,
        cache_key: &str,
        cache_duration: i64,
        now: DateTime<Utc>,
    ) -> bool {
        let Some(producer) = self.producers.get(service_id) else {
            return false;
        };

        let mut entries = producer.entries.write();
        match entries.iter_mut().find(|params| params.cache_key == cache_key) {
            Some(params) => {
                params.cache_duration = cache_duration;
                params.update_next_recache_timestamp_at(now);
                true
            }
            None => false,
        }
    }

    /// Snapshot of everything tracked for a producer
    pub fn tracked(&self, service_id: &str) -> Vec<CacheParameters> {
        self.producers
            .get(service_id)
            .map(|producer| producer.entries.read().clone())
            .unwrap_or_default()
    }

    /// Total number of tracked parameters across producers
    pub fn len(&self) -> usize {
        self.producers
            .iter()
            .map(|producer| producer.entries.read().len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn producer_count(&self) -> usize {
        self.producers.len()
    }

    /// Forget every producer and every tracked entry
    pub fn clear(&self) {
        self.producers.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, TimeZone};

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
    }

    fn params(key: &str, duration: i64) -> CacheParameters {
        CacheParameters::new(key, key, "Contoso").with_cache_duration(duration)
    }

    #[test]
    fn test_track_schedules_and_deduplicates() {
        let registry = Registry::new();
        registry.ensure_producer("RulesEngineManager");

        let first = registry.track("RulesEngineManager", params("a", 30), noon());
        let second = registry.track(
            "RulesEngineManager",
            params("a", 60),
            noon() + TimeDelta::minutes(1),
        );

        assert_eq!(first, TrackOutcome::Added);
        assert_eq!(second, TrackOutcome::AlreadyTracked);

        let tracked = registry.tracked("RulesEngineManager");
        assert_eq!(tracked.len(), 1);
        assert_eq!(tracked[0].cache_duration, 30);
        assert_eq!(tracked[0].next_recache_timestamp(), noon() + TimeDelta::minutes(30));
    }

    #[test]
    fn test_unknown_producer_is_ignored() {
        let registry = Registry::new();
        assert_eq!(
            registry.track("Ghost", params("a", 30), noon()),
            TrackOutcome::UnknownProducer
        );
        assert!(!registry.contains_producer("Ghost"));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_due_preserves_insertion_order() {
        let registry = Registry::new();
        registry.ensure_producer("p");
        for key in ["c", "a", "b"] {
            registry.track("p", params(key, 10), noon());
        }
        registry.track("p", params("later", 60), noon());

        let due: Vec<String> = registry
            .due("p", 5, noon() + TimeDelta::minutes(5))
            .into_iter()
            .map(|p| p.cache_key)
            .collect();

        assert_eq!(due, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_reschedule_advances_stored_entry() {
        let registry = Registry::new();
        registry.ensure_producer("p");
        registry.track("p", params("a", 30), noon());

        let later = noon() + TimeDelta::minutes(25);
        assert!(registry.reschedule("p", "a", 30, later));
        assert!(!registry.reschedule("p", "missing", 30, later));

        assert_eq!(
            registry.tracked("p")[0].next_recache_timestamp(),
            later + TimeDelta::minutes(30)
        );
    }

    #[test]
    fn test_reschedule_adopts_new_duration() {
        let registry = Registry::new();
        registry.ensure_producer("p");
        registry.track("p", params("a", 60), noon());

        let later = noon() + TimeDelta::minutes(58);
        registry.reschedule("p", "a", 10, later);
        let shortened = registry.tracked("p")[0].clone();
        assert_eq!(shortened.cache_duration, 10);
        assert_eq!(shortened.next_recache_timestamp(), later + TimeDelta::minutes(10));

        registry.reschedule("p", "a", 0, later);
        assert_eq!(
            registry.tracked("p")[0].next_recache_timestamp(),
            DateTime::<Utc>::MAX_UTC
        );
    }

    #[test]
    fn test_clear_forgets_producers() {
        let registry = Registry::new();
        registry.ensure_producer("p");
        registry.track("p", params("a", 30), noon());

        registry.clear();
        assert_eq!(registry.producer_count(), 0);
        assert_eq!(
            registry.track("p", params("b", 30), noon()),
            TrackOutcome::UnknownProducer
        );
    }
}
