//! Comparison-result cache.
//!
//! Same LRU skeleton as the parse cache, but no TTL: entries age out only
//! through eviction or `optimize()`, which drops entries that are both stale
//! (untouched for 24 hours) and cold (at most one access). Frequently-read
//! stale entries survive.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use super::strategies::{ComparisonKind, ComparisonValue};
use crate::canonical::{CanonicalDateTime, RoundingMode, TimeUnit};
use crate::engine::{CacheOptimizeReport, CacheStats, ENTRY_COST_BYTES, RunningMean};
use crate::error::{Result, TemporalError};

/// Entries older than this with `access_count <= 1` are removed by
/// `optimize()`.
const STALE_WINDOW: Duration = Duration::from_secs(24 * 60 * 60);
const COLD_ACCESS_CEILING: u64 = 1;

pub(crate) fn comparison_fingerprint(
    a: &CanonicalDateTime,
    b: &CanonicalDateTime,
    kind: ComparisonKind,
    unit: Option<TimeUnit>,
    rounding: RoundingMode,
) -> String {
    format!(
        "cmp:{}@{}|{}@{}|{}|{}|{:?}",
        a.to_utc().timestamp_micros(),
        a.zone_name(),
        b.to_utc().timestamp_micros(),
        b.zone_name(),
        kind.as_str(),
        unit.map(|u| u.as_str()).unwrap_or("-"),
        rounding,
    )
}

/// The cached payload of a completed comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedComparison {
    pub value: ComparisonValue,
    pub kind: ComparisonKind,
    pub precision: Option<TimeUnit>,
}

#[derive(Debug, Clone)]
struct Entry {
    value: CachedComparison,
    stamp: u64,
    access_count: u64,
    last_access: Instant,
}

#[derive(Debug)]
pub struct ComparisonCache {
    entries: HashMap<String, Entry>,
    max_size: usize,
    clock: u64,
    hits: u64,
    misses: u64,
    sets: u64,
    evictions: u64,
    access: RunningMean,
}

impl ComparisonCache {
    pub fn new(max_size: usize) -> Self {
        ComparisonCache {
            entries: HashMap::new(),
            max_size: max_size.max(1),
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

    /// A hit refreshes recency and the access counter.
    pub fn get(&mut self, key: &str) -> Option<CachedComparison> {
        let started = Instant::now();
        self.clock += 1;
        let clock = self.clock;
        let result = match self.entries.get_mut(key) {
            Some(entry) => {
                entry.stamp = clock;
                entry.access_count += 1;
                entry.last_access = Instant::now();
                self.hits += 1;
                Some(entry.value.clone())
            }
            None => {
                self.misses += 1;
                None
            }
        };
        self.access.record(started.elapsed());
        result
    }

    pub fn has(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: CachedComparison) {
        let key = key.into();
        if !self.entries.contains_key(&key) && self.entries.len() >= self.max_size {
            self.evict_lru();
        }
        self.clock += 1;
        self.entries.insert(
            key,
            Entry { value, stamp: self.clock, access_count: 0, last_access: Instant::now() },
        );
        self.sets += 1;
    }

    pub fn delete(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

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

    /// Remove stale-and-cold entries; see the module docs for the policy.
    pub fn optimize(&mut self) -> CacheOptimizeReport {
        self.optimize_with_window(STALE_WINDOW)
    }

    fn optimize_with_window(&mut self, window: Duration) -> CacheOptimizeReport {
        let before = self.entries.len();
        self.entries
            .retain(|_, e| e.last_access.elapsed() <= window || e.access_count > COLD_ACCESS_CEILING);
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
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::UTC;

    fn cached(result: bool) -> CachedComparison {
        CachedComparison {
            value: ComparisonValue::Boolean(result),
            kind: ComparisonKind::IsBefore,
            precision: None,
        }
    }

    #[test]
    fn round_trip_and_access_counting() {
        let mut c = ComparisonCache::new(4);
        c.set("k", cached(true));
        assert_eq!(c.get("k").unwrap().value.as_bool(), Some(true));
        assert!(c.has("k"));
        assert_eq!(c.stats().hits, 1);
        assert!(c.delete("k"));
        assert!(c.get("k").is_none());
        assert_eq!(c.stats().misses, 1);
    }

    #[test]
    fn lru_eviction_matches_the_parse_side() {
        let mut c = ComparisonCache::new(2);
        c.set("a", cached(true));
        c.set("b", cached(false));
        let _ = c.get("a");
        c.set("c", cached(true));
        assert!(c.has("a"));
        assert!(!c.has("b"));
        assert_eq!(c.stats().evictions, 1);
    }

    #[test]
    fn optimize_drops_only_stale_and_cold_entries() {
        let mut c = ComparisonCache::new(8);
        c.set("cold", cached(true));
        c.set("hot", cached(false));
        // "hot" accrues accesses beyond the cold ceiling.
        let _ = c.get("hot");
        let _ = c.get("hot");

        // With a zero staleness window everything is "stale"; only the cold
        // entry may be removed.
        std::thread::sleep(Duration::from_millis(2));
        let report = c.optimize_with_window(Duration::ZERO);
        assert_eq!(report.entries_removed, 1);
        assert_eq!(report.memory_freed, ENTRY_COST_BYTES);
        assert!(!c.has("cold"));
        assert!(c.has("hot"));
    }

    #[test]
    fn default_window_preserves_fresh_entries() {
        let mut c = ComparisonCache::new(8);
        c.set("fresh", cached(true));
        let report = c.optimize();
        assert_eq!(report.entries_removed, 0);
        assert!(c.has("fresh"));
    }

    #[test]
    fn fingerprints_distinguish_kind_unit_and_rounding() {
        let a = CanonicalDateTime::from_epoch_millis(0, UTC).unwrap();
        let b = CanonicalDateTime::from_epoch_millis(1_000, UTC).unwrap();
        let plain = comparison_fingerprint(&a, &b, ComparisonKind::IsSame, None, RoundingMode::Truncate);
        let day = comparison_fingerprint(&a, &b, ComparisonKind::IsSame, Some(TimeUnit::Day), RoundingMode::Truncate);
        let diff = comparison_fingerprint(&a, &b, ComparisonKind::Diff, Some(TimeUnit::Day), RoundingMode::Round);
        assert_ne!(plain, day);
        assert_ne!(day, diff);
    }

    #[test]
    fn hot_entries_survive_the_parse_side_eviction_order() {
        let mut c = ComparisonCache::new(3);
        for key in ["a", "b", "c"] {
            c.set(key, cached(true));
        }
        let _ = c.get("a");
        let _ = c.get("b");
        c.set("d", cached(false));
        assert!(!c.has("c"));
        assert_eq!(c.len(), 3);
    }
}
