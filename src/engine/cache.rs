//! Parse-result cache: fixed-capacity LRU with per-entry TTL.
//!
//! Keys are string fingerprints derived from the input plus the option
//! fields that change the result (timezone, strict mode). Only successful
//! results are stored — the caller enforces that, not the cache.
//!
//! Recency is tracked with a monotonic stamp per entry; eviction scans for
//! the minimum stamp. Expiry is lazy: an expired entry is removed the moment
//! `get`/`has` touches it, there is no background sweep.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use super::metrics::RunningMean;
use crate::canonical::CanonicalDateTime;
use crate::error::{Result, TemporalError};
use crate::strategy::ParseContext;
use crate::{StrategyKind, TemporalInput};

/// Flat per-entry memory estimate used by `optimize` reports.
pub(crate) const ENTRY_COST_BYTES: u64 = 256;

// Advisory thresholds. Policy constants, not per-instance tunables.
const MIN_SAMPLE_REQUESTS: u64 = 20;
const LOW_HIT_RATIO: f64 = 0.5;
const NEARLY_FULL_UTILIZATION: f64 = 0.9;
const EFFICIENT_HIT_RATIO: f64 = 0.8;
const UNDERUTILIZED: f64 = 0.5;

/// Cache key for one (input, options) pair.
pub(crate) fn fingerprint(input: &TemporalInput, ctx: &ParseContext) -> String {
    let body = match input {
        TemporalInput::Text(s) => format!("s:{}", s.trim()),
        TemporalInput::Number(n) => format!("n:{}", n.to_bits()),
        TemporalInput::Utc(dt) => format!("i:{}", dt.timestamp_micros()),
        TemporalInput::Fixed(dt) => format!("i:{}", dt.timestamp_micros()),
        TemporalInput::Naive(dt) => format!("w:{dt}"),
        TemporalInput::Canonical(dt) => format!("c:{}@{}", dt.epoch_millis(), dt.zone_name()),
        TemporalInput::Components(parts) => {
            let joined: Vec<String> = parts.iter().map(|p| p.to_string()).collect();
            format!("a:{}", joined.join(","))
        }
        TemporalInput::Timestamp { seconds, nanoseconds } => format!("ts:{seconds}.{nanoseconds:09}"),
        TemporalInput::Fields(f) => format!(
            "f:{:04}-{:02}-{:02}T{:02}:{:02}:{:02}.{:09}@{}",
            f.year,
            f.month,
            f.day,
            f.hour,
            f.minute,
            f.second,
            f.nanosecond,
            f.time_zone.as_deref().unwrap_or("-")
        ),
        TemporalInput::Empty => "null".to_string(),
    };
    format!("{body}|tz:{}|strict:{}", ctx.zone.name(), ctx.strict)
}

/// The cached payload of a successful parse.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedParse {
    pub data: CanonicalDateTime,
    pub strategy: StrategyKind,
    pub confidence: f64,
}

#[derive(Debug, Clone)]
struct Entry {
    value: CachedParse,
    execution: Duration,
    inserted: Instant,
    stamp: u64,
    access_count: u64,
    last_access: Instant,
}

/// Point-in-time counters and ratios.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct CacheStats {
    pub size: usize,
    pub max_size: usize,
    pub hits: u64,
    pub misses: u64,
    pub sets: u64,
    pub evictions: u64,
    pub hit_ratio: f64,
    pub average_access_time_ms: f64,
    /// Hits per resident entry.
    pub efficiency: f64,
}

/// Result of an `optimize` sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct CacheOptimizeReport {
    pub entries_removed: usize,
    /// Estimated, not measured: a flat per-entry cost times the count.
    pub memory_freed: u64,
}

/// Result of a `preload` bulk insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct PreloadReport {
    pub loaded: usize,
    pub skipped: usize,
}

/// Read-only dump for diagnostics.
#[derive(Debug, Clone, serde::Serialize)]
pub struct CacheSnapshot {
    pub entries: Vec<SnapshotEntry>,
    pub stats: CacheStats,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct SnapshotEntry {
    pub key: String,
    pub value: String,
    pub strategy: StrategyKind,
    pub confidence: f64,
    pub access_count: u64,
    pub age_ms: u64,
}

/// Advisory view of how well the cache is earning its memory.
#[derive(Debug, Clone, serde::Serialize)]
pub struct CacheEfficiency {
    pub hit_ratio: f64,
    pub utilization: f64,
    pub total_requests: u64,
    pub assessment: String,
}

/// Structural self-check result.
#[derive(Debug, Clone, serde::Serialize)]
pub struct IntegrityReport {
    pub is_valid: bool,
    pub issues: Vec<String>,
}

#[derive(Debug)]
pub struct ParseCache {
    entries: HashMap<String, Entry>,
    max_size: usize,
    ttl: Duration,
    clock: u64,
    hits: u64,
    misses: u64,
    sets: u64,
    evictions: u64,
    access: RunningMean,
}

impl ParseCache {
    pub fn new(max_size: usize, ttl: Duration) -> Self {
        ParseCache {
            entries: HashMap::new(),
            max_size: max_size.max(1),
            ttl,
            clock: 0,
            hits: 0,
            misses: 0,
            sets: 0,
            evictions: 0,
            access: RunningMean::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    fn expired(&self, entry: &Entry) -> bool {
        entry.inserted.elapsed() > self.ttl
    }

    /// Look up a key. A hit refreshes recency and the access counter; an
    /// absent or expired entry counts as a miss (expired entries are removed
    /// on the spot).
    pub fn get(&mut self, key: &str) -> Option<CachedParse> {
        enum Probe {
            Hit(CachedParse),
            Expired,
            Absent,
        }

        let started = Instant::now();
        let ttl = self.ttl;
        self.clock += 1;
        let clock = self.clock;

        let probe = match self.entries.get_mut(key) {
            Some(entry) if entry.inserted.elapsed() > ttl => Probe::Expired,
            Some(entry) => {
                entry.stamp = clock;
                entry.access_count += 1;
                entry.last_access = Instant::now();
                Probe::Hit(entry.value.clone())
            }
            None => Probe::Absent,
        };

        let result = match probe {
            Probe::Hit(value) => {
                self.hits += 1;
                Some(value)
            }
            Probe::Expired => {
                self.entries.remove(key);
                self.misses += 1;
                None
            }
            Probe::Absent => {
                self.misses += 1;
                None
            }
        };
        self.access.record(started.elapsed());
        result
    }

    /// Existence check. Honors expiry (removing the corpse) but does not
    /// refresh recency — preload-skip decisions must not reorder the LRU.
    pub fn has(&mut self, key: &str) -> bool {
        let expired = match self.entries.get(key) {
            Some(entry) => self.expired(entry),
            None => return false,
        };
        if expired {
            self.entries.remove(key);
            return false;
        }
        true
    }

    /// Insert or overwrite. Evicts exactly one LRU entry when a fresh insert
    /// would overflow capacity.
    pub fn set(&mut self, key: impl Into<String>, value: CachedParse, execution: Duration) {
        let key = key.into();
        if !self.entries.contains_key(&key) && self.entries.len() >= self.max_size {
            self.evict_lru();
        }
        self.clock += 1;
        let now = Instant::now();
        self.entries.insert(
            key,
            Entry {
                value,
                execution,
                inserted: now,
                stamp: self.clock,
                access_count: 0,
                last_access: now,
            },
        );
        self.sets += 1;
    }

    pub fn delete(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Resize the capacity. Shrinking evicts least-recently-used entries down
    /// to the new bound.
    pub fn set_max_size(&mut self, max_size: usize) -> Result<()> {
        if max_size == 0 {
            return Err(TemporalError::InvalidCapacity(max_size));
        }
        self.max_size = max_size;
        while self.entries.len() > self.max_size {
            self.evict_lru();
        }
        Ok(())
    }

    fn evict_lru(&mut self) {
        let victim = self.entries.iter().min_by_key(|(_, e)| e.stamp).map(|(k, _)| k.clone());
        if let Some(key) = victim {
            self.entries.remove(&key);
            self.evictions += 1;
        }
    }

    /// Drop expired entries eagerly and report the estimated memory returned.
    pub fn optimize(&mut self) -> CacheOptimizeReport {
        let before = self.entries.len();
        let ttl = self.ttl;
        self.entries.retain(|_, e| e.inserted.elapsed() <= ttl);
        let entries_removed = before - self.entries.len();
        CacheOptimizeReport { entries_removed, memory_freed: entries_removed as u64 * ENTRY_COST_BYTES }
    }

    pub fn stats(&self) -> CacheStats {
        let requests = self.hits + self.misses;
        CacheStats {
            size: self.entries.len(),
            max_size: self.max_size,
            hits: self.hits,
            misses: self.misses,
            sets: self.sets,
            evictions: self.evictions,
            hit_ratio: if requests == 0 { 0.0 } else { self.hits as f64 / requests as f64 },
            average_access_time_ms: self.access.mean_ms,
            efficiency: if self.entries.is_empty() { 0.0 } else { self.hits as f64 / self.entries.len() as f64 },
        }
    }

    pub fn efficiency_metrics(&self) -> CacheEfficiency {
        let stats = self.stats();
        let utilization = stats.size as f64 / stats.max_size as f64;
        let requests = stats.hits + stats.misses;
        let assessment = if requests < MIN_SAMPLE_REQUESTS {
            "insufficient data to assess cache efficiency".to_string()
        } else if stats.hit_ratio < LOW_HIT_RATIO {
            format!("low benefit: hit ratio {:.2} under {LOW_HIT_RATIO}", stats.hit_ratio)
        } else if stats.hit_ratio > EFFICIENT_HIT_RATIO && utilization < UNDERUTILIZED {
            "efficient but underutilized; capacity could shrink".to_string()
        } else if utilization > NEARLY_FULL_UTILIZATION {
            "nearly full; consider growing the capacity".to_string()
        } else {
            "healthy".to_string()
        };
        CacheEfficiency { hit_ratio: stats.hit_ratio, utilization, total_requests: requests, assessment }
    }

    pub fn efficiency_recommendations(&self) -> Vec<String> {
        let stats = self.stats();
        let requests = stats.hits + stats.misses;
        if requests < MIN_SAMPLE_REQUESTS {
            return vec!["insufficient data: fewer than 20 cache requests recorded".to_string()];
        }
        let utilization = stats.size as f64 / stats.max_size as f64;
        let mut out = Vec::new();
        if stats.hit_ratio < LOW_HIT_RATIO {
            out.push(format!(
                "low benefit: hit ratio {:.2}; caching may not pay for this workload",
                stats.hit_ratio
            ));
        }
        if utilization > NEARLY_FULL_UTILIZATION {
            out.push("nearly full: utilization above 90%, evictions are imminent".to_string());
        }
        if stats.hit_ratio > EFFICIENT_HIT_RATIO && utilization < UNDERUTILIZED {
            out.push("efficient but underutilized: high hit ratio with under half the capacity used".to_string());
        }
        out
    }

    /// Bulk insert, skipping keys that already exist (never overwriting).
    pub fn preload(&mut self, entries: Vec<(String, CachedParse)>) -> PreloadReport {
        let mut loaded = 0;
        let mut skipped = 0;
        for (key, value) in entries {
            if self.has(&key) {
                skipped += 1;
            } else {
                self.set(key, value, Duration::ZERO);
                loaded += 1;
            }
        }
        PreloadReport { loaded, skipped }
    }

    /// Point-in-time dump. Read-only: no access-order state is touched.
    pub fn snapshot(&self) -> CacheSnapshot {
        let mut entries: Vec<SnapshotEntry> = self
            .entries
            .iter()
            .map(|(key, e)| SnapshotEntry {
                key: key.clone(),
                value: e.value.data.to_rfc3339(),
                strategy: e.value.strategy,
                confidence: e.value.confidence,
                access_count: e.access_count,
                age_ms: e.inserted.elapsed().as_millis() as u64,
            })
            .collect();
        entries.sort_by(|a, b| a.key.cmp(&b.key));
        CacheSnapshot { entries, stats: self.stats() }
    }

    /// Structural self-check: size accounting and per-entry sanity.
    pub fn validate_integrity(&self) -> IntegrityReport {
        let mut issues = Vec::new();
        if self.entries.len() > self.max_size {
            issues.push(format!("size {} exceeds capacity {}", self.entries.len(), self.max_size));
        }
        for (key, entry) in &self.entries {
            if key.is_empty() {
                issues.push("empty cache key".to_string());
            }
            if entry.stamp > self.clock {
                issues.push(format!("entry `{key}` carries a stamp from the future"));
            }
            if !entry.value.confidence.is_finite() || !(0.0..=1.0).contains(&entry.value.confidence) {
                issues.push(format!("entry `{key}` carries confidence {}", entry.value.confidence));
            }
        }
        IntegrityReport { is_valid: issues.is_empty(), issues }
    }

    /// Mean execution time of the parses whose results are resident.
    pub fn average_cached_execution_ms(&self) -> f64 {
        if self.entries.is_empty() {
            return 0.0;
        }
        let total: f64 = self.entries.values().map(|e| e.execution.as_secs_f64() * 1_000.0).sum();
        total / self.entries.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::UTC;

    fn cached(ms: i64) -> CachedParse {
        CachedParse {
            data: CanonicalDateTime::from_epoch_millis(ms, UTC).unwrap(),
            strategy: StrategyKind::Text,
            confidence: 0.95,
        }
    }

    fn cache(cap: usize) -> ParseCache {
        ParseCache::new(cap, Duration::from_secs(300))
    }

    #[test]
    fn set_then_get_round_trips() {
        let mut c = cache(4);
        c.set("k1", cached(1_000), Duration::from_millis(2));
        let got = c.get("k1").unwrap();
        assert_eq!(got.data.epoch_millis(), 1_000);
        assert_eq!(got.strategy, StrategyKind::Text);

        assert!(c.delete("k1"));
        assert!(!c.has("k1"));
    }

    #[test]
    fn capacity_is_never_exceeded_and_evictions_count() {
        let mut c = cache(3);
        for i in 0..10 {
            c.set(format!("k{i}"), cached(i), Duration::ZERO);
            assert!(c.len() <= 3);
        }
        assert_eq!(c.stats().evictions, 7);
    }

    #[test]
    fn lru_ordering_spares_recently_read_entries() {
        let mut c = cache(3);
        c.set("a", cached(1), Duration::ZERO);
        c.set("b", cached(2), Duration::ZERO);
        c.set("c", cached(3), Duration::ZERO);
        // Touch "a" so "b" becomes the LRU victim.
        assert!(c.get("a").is_some());
        c.set("d", cached(4), Duration::ZERO);
        assert!(c.has("a"));
        assert!(!c.has("b"));
        assert!(c.has("c"));
        assert!(c.has("d"));
    }

    #[test]
    fn has_does_not_refresh_recency() {
        let mut c = cache(2);
        c.set("a", cached(1), Duration::ZERO);
        c.set("b", cached(2), Duration::ZERO);
        assert!(c.has("a")); // probe only
        c.set("c", cached(3), Duration::ZERO);
        // "a" was the oldest by stamp despite the `has` probe.
        assert!(!c.has("a"));
        assert!(c.has("b"));
    }

    #[test]
    fn expired_entries_read_as_absent_and_vanish() {
        let mut c = ParseCache::new(4, Duration::ZERO);
        c.set("k", cached(1), Duration::ZERO);
        std::thread::sleep(Duration::from_millis(2));
        assert!(c.get("k").is_none());
        assert_eq!(c.len(), 0);
        assert_eq!(c.stats().misses, 1);
    }

    #[test]
    fn shrinking_capacity_evicts_down_to_bound() {
        let mut c = cache(5);
        for i in 0..5 {
            c.set(format!("k{i}"), cached(i), Duration::ZERO);
        }
        c.set_max_size(2).unwrap();
        assert_eq!(c.len(), 2);
        assert!(c.has("k3") && c.has("k4"));
        assert!(c.set_max_size(0).is_err());
    }

    #[test]
    fn preload_skips_existing_keys() {
        let mut c = cache(8);
        c.set("a", cached(1), Duration::ZERO);
        let report = c.preload(vec![
            ("a".to_string(), cached(10)),
            ("b".to_string(), cached(2)),
            ("c".to_string(), cached(3)),
        ]);
        assert_eq!(report, PreloadReport { loaded: 2, skipped: 1 });
        // Existing value was not overwritten.
        assert_eq!(c.get("a").unwrap().data.epoch_millis(), 1);
    }

    #[test]
    fn optimize_reports_estimated_memory() {
        let mut c = ParseCache::new(8, Duration::ZERO);
        c.set("a", cached(1), Duration::ZERO);
        c.set("b", cached(2), Duration::ZERO);
        std::thread::sleep(Duration::from_millis(2));
        let report = c.optimize();
        assert_eq!(report.entries_removed, 2);
        assert_eq!(report.memory_freed, 2 * ENTRY_COST_BYTES);
    }

    #[test]
    fn snapshot_is_read_only() {
        let mut c = cache(4);
        c.set("a", cached(1), Duration::ZERO);
        c.set("b", cached(2), Duration::ZERO);
        let before: Vec<u64> = {
            let snap = c.snapshot();
            snap.entries.iter().map(|e| e.access_count).collect()
        };
        let again = c.snapshot();
        let after: Vec<u64> = again.entries.iter().map(|e| e.access_count).collect();
        assert_eq!(before, after);
        assert_eq!(again.entries.len(), 2);
        assert_eq!(again.stats.sets, 2);
    }

    #[test]
    fn integrity_check_passes_on_a_healthy_cache() {
        let mut c = cache(4);
        c.set("a", cached(1), Duration::ZERO);
        let report = c.validate_integrity();
        assert!(report.is_valid, "issues: {:?}", report.issues);
    }

    proptest::proptest! {
        // Capacity invariant: no insert sequence can push the cache past its
        // bound, and each overflowing insert evicts exactly one entry.
        #[test]
        fn prop_capacity_never_exceeded(cap in 1usize..16, keys in proptest::collection::vec(0u16..64, 1..128)) {
            let mut c = ParseCache::new(cap, Duration::from_secs(300));
            for key in keys {
                c.set(format!("k{key}"), cached(key as i64), Duration::ZERO);
                proptest::prop_assert!(c.len() <= cap);
            }
            let stats = c.stats();
            proptest::prop_assert!(stats.sets >= stats.evictions);
        }
    }

    #[test]
    fn efficiency_recommendations_follow_thresholds() {
        let mut c = cache(100);
        // Below the sample floor.
        assert!(c.efficiency_recommendations()[0].contains("insufficient data"));

        // Drive a low hit ratio: 25 misses.
        for i in 0..25 {
            let _ = c.get(&format!("absent{i}"));
        }
        let recs = c.efficiency_recommendations();
        assert!(recs.iter().any(|r| r.contains("low benefit")));

        // Drive a high hit ratio on a mostly-empty cache.
        c.set("hot", cached(1), Duration::ZERO);
        for _ in 0..200 {
            let _ = c.get("hot");
        }
        let recs = c.efficiency_recommendations();
        assert!(recs.iter().any(|r| r.contains("underutilized")));
    }
}
