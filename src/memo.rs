//! # Analytics Memo
//!
//! Explicit memoization for repeated dashboard queries. Callers pass a
//! `history_version` that changes whenever the underlying activities, logs or
//! profile change; results computed for an older version are never returned
//! for a newer one.
//!
//! The load and correlation configs are fixed when the memo is built, so a
//! cached result always matches the config it would be recomputed with.
//!
//! Both caches are bounded LRU maps.

use std::collections::HashMap;
use std::hash::Hash;

use chrono::{DateTime, NaiveDate, Utc};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::catalogue::Metric;
use crate::correlation::{correlate_with_config, CorrelationConfig, CorrelationOutcome, CorrelationRequest};
use crate::training_load::{fitness_timeline_with_config, FitnessMetric, LoadConfig};
use crate::{utc_date, ActivitySummary, DailyLog, UserProfile};

/// A bounded least-recently-used map with O(n) eviction.
///
/// Memo entries number in the tens, so a linear scan on eviction is cheaper
/// than maintaining an intrusive list.
#[derive(Debug)]
pub struct LruCache<K, V> {
    capacity: usize,
    entries: HashMap<K, Slot<V>>,
    tick: u64,
}

#[derive(Debug)]
struct Slot<V> {
    value: V,
    last_used: u64,
}

impl<K: Eq + Hash + Clone, V: Clone> LruCache<K, V> {
    /// Create a cache holding at most `capacity` entries (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: HashMap::with_capacity(capacity),
            tick: 0,
        }
    }

    fn touch(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    /// Look up a value and mark it as recently used.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        let now = self.touch();
        self.entries.get_mut(key).map(|slot| {
            slot.last_used = now;
            &slot.value
        })
    }

    /// Insert or replace a value, evicting the least recently used entry when full.
    pub fn insert(&mut self, key: K, value: V) {
        let now = self.touch();
        if let Some(slot) = self.entries.get_mut(&key) {
            slot.value = value;
            slot.last_used = now;
            return;
        }
        if self.entries.len() >= self.capacity {
            self.evict_lru();
        }
        self.entries.insert(key, Slot { value, last_used: now });
    }

    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.tick = 0;
    }

    /// Drop every entry whose key fails the predicate.
    pub fn retain(&mut self, mut keep: impl FnMut(&K) -> bool) {
        self.entries.retain(|k, _| keep(k));
    }

    fn evict_lru(&mut self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|(_, slot)| slot.last_used)
            .map(|(k, _)| k.clone());
        if let Some(key) = oldest {
            self.entries.remove(&key);
        }
    }
}

/// Cache key for a fitness timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimelineKey {
    pub history_version: u64,
    pub as_of_date: NaiveDate,
}

/// Cache key for a correlation outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CorrelationKey {
    pub history_version: u64,
    pub x: Metric,
    pub y: Metric,
    pub smoothing: bool,
    pub lag: bool,
}

impl CorrelationKey {
    pub fn new(history_version: u64, request: &CorrelationRequest) -> Self {
        Self {
            history_version,
            x: request.x,
            y: request.y,
            smoothing: request.smoothing,
            lag: request.lag,
        }
    }
}

/// Hit/miss counters across both caches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoStats {
    pub hits: u64,
    pub misses: u64,
    pub timelines: usize,
    pub correlations: usize,
}

/// Memo for timelines and correlation outcomes under one pair of configs.
#[derive(Debug)]
pub struct AnalyticsMemo {
    load_config: LoadConfig,
    correlation_config: CorrelationConfig,
    timelines: LruCache<TimelineKey, Vec<FitnessMetric>>,
    correlations: LruCache<CorrelationKey, CorrelationOutcome>,
    hits: u64,
    misses: u64,
}

impl AnalyticsMemo {
    /// Default number of entries per cache.
    pub const DEFAULT_CAPACITY: usize = 32;

    /// Memo using the default load and correlation configs.
    pub fn new(capacity: usize) -> Self {
        Self::with_configs(capacity, LoadConfig::default(), CorrelationConfig::default())
    }

    pub fn with_configs(
        capacity: usize,
        load_config: LoadConfig,
        correlation_config: CorrelationConfig,
    ) -> Self {
        Self {
            load_config,
            correlation_config,
            timelines: LruCache::new(capacity),
            correlations: LruCache::new(capacity),
            hits: 0,
            misses: 0,
        }
    }

    pub fn load_config(&self) -> &LoadConfig {
        &self.load_config
    }

    pub fn correlation_config(&self) -> &CorrelationConfig {
        &self.correlation_config
    }

    /// Timeline for `as_of`, computed on a miss.
    pub fn get_or_compute_timeline(
        &mut self,
        history_version: u64,
        history: &[ActivitySummary],
        profile: Option<&UserProfile>,
        as_of: DateTime<Utc>,
    ) -> Vec<FitnessMetric> {
        let key = TimelineKey {
            history_version,
            as_of_date: utc_date(as_of),
        };
        if let Some(cached) = self.timelines.get(&key) {
            self.hits += 1;
            return cached.clone();
        }
        self.misses += 1;
        debug!("[Memo] timeline miss for {:?}", key);
        let timeline = fitness_timeline_with_config(history, profile, as_of, &self.load_config);
        self.timelines.insert(key, timeline.clone());
        timeline
    }

    /// Correlation outcome for a request, computed on a miss.
    pub fn get_or_compute_correlation(
        &mut self,
        history_version: u64,
        activities: &[ActivitySummary],
        logs: &[DailyLog],
        request: &CorrelationRequest,
    ) -> CorrelationOutcome {
        let key = CorrelationKey::new(history_version, request);
        if let Some(cached) = self.correlations.get(&key) {
            self.hits += 1;
            return cached.clone();
        }
        self.misses += 1;
        debug!("[Memo] correlation miss for {:?}", key);
        let outcome = correlate_with_config(activities, logs, request, &self.correlation_config);
        self.correlations.insert(key, outcome.clone());
        outcome
    }

    /// Drop entries computed for any version other than `current_version`.
    pub fn retain_version(&mut self, current_version: u64) {
        self.timelines.retain(|k| k.history_version == current_version);
        self.correlations.retain(|k| k.history_version == current_version);
    }

    pub fn stats(&self) -> MemoStats {
        MemoStats {
            hits: self.hits,
            misses: self.misses,
            timelines: self.timelines.len(),
            correlations: self.correlations.len(),
        }
    }

    pub fn clear(&mut self) {
        self.timelines.clear();
        self.correlations.clear();
        self.hits = 0;
        self.misses = 0;
    }
}

impl Default for AnalyticsMemo {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_lru_evicts_least_recently_used() {
        let mut cache: LruCache<&str, i32> = LruCache::new(2);
        cache.insert("a", 1);
        cache.insert("b", 2);
        cache.get(&"a");
        cache.insert("c", 3);

        assert!(cache.contains(&"a"));
        assert!(!cache.contains(&"b"));
        assert!(cache.contains(&"c"));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_lru_replace_and_zero_capacity() {
        let mut cache: LruCache<u8, i32> = LruCache::new(0);
        assert_eq!(cache.capacity(), 1);
        cache.insert(1, 10);
        cache.insert(1, 11);
        assert_eq!(cache.get(&1), Some(&11));
        cache.insert(2, 20);
        assert_eq!(cache.len(), 1);
        assert!(cache.contains(&2));
    }

    #[test]
    fn test_timeline_memoized_per_version() {
        let as_of = Utc.with_ymd_and_hms(2024, 5, 3, 12, 0, 0).unwrap();
        let mut session = crate::summarize_track(&[]);
        session.timestamp = Utc.with_ymd_and_hms(2024, 5, 1, 7, 0, 0).unwrap();
        session.avg_hr = 150.0;
        session.duration_minutes = 60;
        let history = vec![session];

        let mut memo = AnalyticsMemo::default();
        let first = memo.get_or_compute_timeline(1, &history, None, as_of);
        let second = memo.get_or_compute_timeline(1, &history, None, as_of);
        assert_eq!(first, second);
        assert_eq!(memo.stats().hits, 1);
        assert_eq!(memo.stats().misses, 1);

        // A new version recomputes even with identical inputs
        memo.get_or_compute_timeline(2, &history, None, as_of);
        assert_eq!(memo.stats().misses, 2);

        memo.retain_version(2);
        assert_eq!(memo.stats().timelines, 1);
    }

    #[test]
    fn test_correlation_key_includes_flags() {
        let request = CorrelationRequest::new(Metric::Hrv, Metric::SleepScore);
        let plain = CorrelationKey::new(4, &request);
        let lagged = CorrelationKey::new(4, &request.with_lag(true));
        assert_ne!(plain, lagged);

        let mut memo = AnalyticsMemo::new(4);
        memo.get_or_compute_correlation(4, &[], &[], &request);
        memo.get_or_compute_correlation(4, &[], &[], &request.with_lag(true));
        memo.get_or_compute_correlation(4, &[], &[], &request);
        assert_eq!(memo.stats(), MemoStats { hits: 1, misses: 2, timelines: 0, correlations: 2 });
    }

    #[test]
    fn test_results_follow_memo_config() {
        let as_of = Utc.with_ymd_and_hms(2024, 5, 1, 20, 0, 0).unwrap();
        let mut session = crate::summarize_track(&[]);
        session.timestamp = Utc.with_ymd_and_hms(2024, 5, 1, 7, 0, 0).unwrap();
        session.avg_hr = 150.0;
        session.duration_minutes = 60;
        let history = vec![session];

        let load_config = LoadConfig {
            resting_hr: 40.0,
            atl_days: 3.0,
            ..LoadConfig::default()
        };
        let mut default_memo = AnalyticsMemo::default();
        let mut custom_memo =
            AnalyticsMemo::with_configs(4, load_config.clone(), CorrelationConfig::default());

        let default_timeline = default_memo.get_or_compute_timeline(1, &history, None, as_of);
        let custom_timeline = custom_memo.get_or_compute_timeline(1, &history, None, as_of);
        assert_ne!(default_timeline, custom_timeline);
        assert_eq!(
            custom_timeline,
            fitness_timeline_with_config(&history, None, as_of, &load_config)
        );
        assert_eq!(custom_memo.get_or_compute_timeline(1, &history, None, as_of), custom_timeline);
        assert_eq!(custom_memo.stats().hits, 1);
    }

    #[test]
    fn test_correlation_uses_memo_min_pairs() {
        let logs: Vec<DailyLog> = (1..=2)
            .map(|d| {
                let mut log = DailyLog::new(NaiveDate::from_ymd_opt(2024, 5, d).unwrap());
                log.hrv = Some(40.0 + f64::from(d));
                log.sleep_score = Some(70.0 + f64::from(d) * 3.0);
                log
            })
            .collect();
        let request = CorrelationRequest::new(Metric::Hrv, Metric::SleepScore);

        let mut strict = AnalyticsMemo::default();
        assert!(!strict.get_or_compute_correlation(1, &[], &logs, &request).is_ready());

        let relaxed_config = CorrelationConfig {
            min_pairs: 2,
            ..CorrelationConfig::default()
        };
        let mut relaxed = AnalyticsMemo::with_configs(4, LoadConfig::default(), relaxed_config);
        assert_eq!(relaxed.correlation_config().min_pairs, 2);
        assert!(relaxed.get_or_compute_correlation(1, &[], &logs, &request).is_ready());
    }
}
