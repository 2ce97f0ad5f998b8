//! Cache parameter configuration
//!
//! This module defines the CacheParameters struct identifying a cached
//! instance, its owning tenant and its re-cache schedule.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Parameters identifying a cacheable instance and when it is next due for a rebuild
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheParameters {
    /// Uniquely identifies the cached instance within its producer
    pub cache_key: String,
    /// Identity of the underlying object (may differ from the cache key)
    pub object_id: String,
    /// Owning tenant
    pub tenant: String,
    /// Minutes to keep the object cached; `<= 0` never expires
    pub cache_duration: i64,
    /// Producer-defined extra context
    pub additional_parameters: Option<HashMap<String, String>>,
    next_recache_timestamp: DateTime<Utc>,
}

impl CacheParameters {
    /// Parameters that have never been scheduled, and are therefore due
    pub fn new(
        cache_key: impl Into<String>,
        object_id: impl Into<String>,
        tenant: impl Into<String>,
    ) -> Self {
        Self {
            cache_key: cache_key.into(),
            object_id: object_id.into(),
            tenant: tenant.into(),
            cache_duration: 0,
            additional_parameters: None,
            next_recache_timestamp: DateTime::<Utc>::MIN_UTC,
        }
    }

    pub fn with_cache_duration(mut self, minutes: i64) -> Self {
        self.cache_duration = minutes;
        self
    }

    pub fn with_additional_parameter(
        mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.additional_parameters
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// When the object should next be rebuilt (UTC)
    pub fn next_recache_timestamp(&self) -> DateTime<Utc> {
        self.next_recache_timestamp
    }

    /// Reschedule relative to the current time
    pub fn update_next_recache_timestamp(&mut self) {
        self.update_next_recache_timestamp_at(Utc::now());
    }

    /// Reschedule relative to `now`
    pub fn update_next_recache_timestamp_at(&mut self, now: DateTime<Utc>) {
        self.next_recache_timestamp = if self.cache_duration > 0 {
            add_minutes(now, self.cache_duration)
        } else {
            DateTime::<Utc>::MAX_UTC
        };
    }

    /// True if the schedule elapses within `grace_period_minutes` from now
    pub fn should_recache(&self, grace_period_minutes: i64) -> bool {
        self.should_recache_at(grace_period_minutes, Utc::now())
    }

    /// True iff `next_recache_timestamp <= now + grace_period_minutes`
    pub fn should_recache_at(&self, grace_period_minutes: i64, now: DateTime<Utc>) -> bool {
        self.next_recache_timestamp <= add_minutes(now, grace_period_minutes)
    }
}

// Saturates at the representable bounds instead of panicking.
fn add_minutes(at: DateTime<Utc>, minutes: i64) -> DateTime<Utc> {
    let saturated = if minutes >= 0 {
        DateTime::<Utc>::MAX_UTC
    } else {
        DateTime::<Utc>::MIN_UTC
    };
    TimeDelta::try_minutes(minutes)
        .and_then(|delta| at.checked_add_signed(delta))
        .unwrap_or(saturated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 12, minute, 0).unwrap()
    }

    #[test]
    fn test_positive_duration_schedules_relative_to_now() {
        let mut params = CacheParameters::new("Contoso_Onboarding", "Onboarding", "Contoso")
            .with_cache_duration(30);
        params.update_next_recache_timestamp_at(at(0));

        assert_eq!(params.next_recache_timestamp(), at(30));
    }

    #[test]
    fn test_clock_reading_update_is_close_to_now() {
        let mut params = CacheParameters::new("k", "o", "t").with_cache_duration(10);
        let before = Utc::now();
        params.update_next_recache_timestamp();
        let after = Utc::now();

        assert!(params.next_recache_timestamp() >= before + TimeDelta::minutes(10));
        assert!(params.next_recache_timestamp() <= after + TimeDelta::minutes(10));
    }

    #[test]
    fn test_non_positive_duration_never_expires() {
        for duration in [0, -1, -60] {
            let mut params = CacheParameters::new("k", "o", "t").with_cache_duration(duration);
            params.update_next_recache_timestamp_at(at(0));

            assert_eq!(params.next_recache_timestamp(), DateTime::<Utc>::MAX_UTC);
            assert!(!params.should_recache_at(5, at(0)));
        }
    }

    #[test]
    fn test_grace_window_boundary() {
        let mut params = CacheParameters::new("k", "o", "t").with_cache_duration(30);
        params.update_next_recache_timestamp_at(at(0));

        // due at 30, grace 5
        assert!(!params.should_recache_at(5, at(24)));
        assert!(params.should_recache_at(5, at(25)));
        assert!(params.should_recache_at(5, at(26)));
        assert!(params.should_recache_at(0, at(30)));
        assert!(!params.should_recache_at(0, at(29)));
    }

    #[test]
    fn test_fresh_parameters_are_due() {
        let params = CacheParameters::new("k", "o", "t");
        assert!(params.should_recache(0));
    }

    #[test]
    fn test_huge_duration_saturates() {
        let mut params = CacheParameters::new("k", "o", "t").with_cache_duration(i64::MAX);
        params.update_next_recache_timestamp_at(at(0));

        assert_eq!(params.next_recache_timestamp(), DateTime::<Utc>::MAX_UTC);
    }

    #[test]
    fn test_additional_parameters_accumulate() {
        let params = CacheParameters::new("k", "o", "t")
            .with_additional_parameter("environment", "prod")
            .with_additional_parameter("region", "eu");

        let extra = params.additional_parameters.expect("extras set");
        assert_eq!(extra.get("environment").map(String::as_str), Some("prod"));
        assert_eq!(extra.len(), 2);
    }
}
