//! Performance analysis and self-tuning.
//!
//! The optimizer is a pure-analysis component with one sanctioned mutation:
//! growing the cache capacity by 50% when eviction pressure is high. It owns
//! nothing but an append-only history of `apply` calls; cache and metrics are
//! borrowed from the engine for the duration of each call, so the
//! read-then-resize sequence cannot interleave with anything.
//!
//! An optimally-performing engine yields *zero* recommendations — that
//! boundary is load-bearing, not aspirational: the auto-optimization loop
//! relies on it to go quiet once tuning converges.

use std::time::SystemTime;

use super::cache::{CacheStats, ParseCache};
use super::metrics::ParseMetrics;
use crate::error::Result;

/// Average execution time at which compute efficiency bottoms out.
pub(crate) const SLOW_EXECUTION_MS: f64 = 20.0;
/// Average execution time that triggers a tuning recommendation.
const HIGH_EXECUTION_MS: f64 = 10.0;
/// Eviction pressure floor before a resize is recommended.
const HIGH_EVICTION_COUNT: u64 = 10;
const HIGH_EVICTION_RATE: f64 = 0.2;
/// Hit-ratio floor under which caching is flagged.
const LOW_HIT_RATIO: f64 = 0.5;
/// Minimum request sample before cache advisories fire.
const MIN_CACHE_SAMPLE: u64 = 20;
/// Fast-path usage floor (with its own minimum sample).
const LOW_FAST_PATH_RATIO: f64 = 0.05;
const MIN_FAST_PATH_SAMPLE: u64 = 50;
/// The sole auto-applicable mutation: capacity × 1.5.
const CACHE_GROWTH_FACTOR: f64 = 1.5;

// Health rating cutoffs (percent).
const EXCELLENT_FLOOR: f64 = 85.0;
const GOOD_FLOOR: f64 = 70.0;
const FAIR_FLOOR: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum RecommendationArea {
    Cache,
    Strategy,
    Pattern,
    Configuration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize)]
pub enum Priority {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Recommendation {
    pub area: RecommendationArea,
    pub priority: Priority,
    pub description: String,
    pub impact: String,
    pub implementation: String,
    pub auto_applicable: bool,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct PerformanceAnalysis {
    pub overall_efficiency: f64,
    pub cache_efficiency: f64,
    pub compute_efficiency: f64,
    pub bottlenecks: Vec<String>,
    pub strengths: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ApplyReport {
    pub applied: Vec<String>,
    pub skipped: Vec<String>,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct OptimizationRecord {
    pub recommendations: Vec<Recommendation>,
    pub applied: bool,
    pub timestamp: SystemTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum HealthRating {
    Excellent,
    Good,
    Fair,
    Poor,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct ReportSummary {
    pub overall_health: HealthRating,
    pub key_insights: Vec<String>,
    pub action_items: Vec<String>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct PerformanceReport {
    pub summary: ReportSummary,
    pub analysis: PerformanceAnalysis,
    pub generated_at: SystemTime,
}

/// The engine-agnostic signal bundle both optimizers reduce their metrics to.
#[derive(Debug, Clone, Copy)]
pub(crate) struct EngineSignals {
    pub success_ratio: f64,
    pub average_execution_ms: f64,
    pub fast_path_ratio: f64,
    /// Total operations observed (gates low-sample advisories).
    pub sample_size: u64,
}

pub(crate) fn analyze_signals(signals: &EngineSignals, cache: &CacheStats) -> PerformanceAnalysis {
    let cache_efficiency = cache.hit_ratio;
    let compute_efficiency = (1.0 - signals.average_execution_ms / SLOW_EXECUTION_MS).clamp(0.0, 1.0);
    // A system is never rated better than its best dimension.
    let blended =
        0.4 * cache_efficiency + 0.4 * compute_efficiency + 0.2 * signals.success_ratio;
    let overall_efficiency = blended.min(cache_efficiency.max(compute_efficiency));

    let mut bottlenecks = Vec::new();
    let mut strengths = Vec::new();
    if cache_efficiency < LOW_HIT_RATIO && cache.hits + cache.misses >= MIN_CACHE_SAMPLE {
        bottlenecks.push(format!("cache hit ratio {cache_efficiency:.2} is below {LOW_HIT_RATIO}"));
    } else if cache_efficiency > 0.8 {
        strengths.push(format!("cache hit ratio {cache_efficiency:.2}"));
    }
    if signals.average_execution_ms > HIGH_EXECUTION_MS {
        bottlenecks.push(format!(
            "average execution time {:.2}ms exceeds {HIGH_EXECUTION_MS}ms",
            signals.average_execution_ms
        ));
    } else if compute_efficiency > 0.9 {
        strengths.push(format!("average execution time {:.2}ms", signals.average_execution_ms));
    }
    if signals.success_ratio > 0.95 && signals.sample_size >= MIN_CACHE_SAMPLE {
        strengths.push(format!("success ratio {:.2}", signals.success_ratio));
    }

    PerformanceAnalysis { overall_efficiency, cache_efficiency, compute_efficiency, bottlenecks, strengths }
}

pub(crate) fn recommend(signals: &EngineSignals, cache: &CacheStats) -> Vec<Recommendation> {
    let mut out = Vec::new();

    let eviction_rate = if cache.sets == 0 { 0.0 } else { cache.evictions as f64 / cache.sets as f64 };
    if cache.evictions > HIGH_EVICTION_COUNT && eviction_rate > HIGH_EVICTION_RATE {
        out.push(Recommendation {
            area: RecommendationArea::Cache,
            priority: Priority::High,
            description: "increase cache size".to_string(),
            impact: format!("{} evictions against {} inserts discard useful results", cache.evictions, cache.sets),
            implementation: format!("grow capacity from {} by {CACHE_GROWTH_FACTOR}x", cache.max_size),
            auto_applicable: true,
        });
    }

    if cache.hits + cache.misses >= MIN_CACHE_SAMPLE && cache.hit_ratio < LOW_HIT_RATIO {
        out.push(Recommendation {
            area: RecommendationArea::Cache,
            priority: Priority::High,
            description: "cache optimization".to_string(),
            impact: format!("hit ratio {:.2}; most lookups do full parses", cache.hit_ratio),
            implementation: "review key diversity; repeated inputs benefit, one-shot inputs do not".to_string(),
            auto_applicable: false,
        });
    }

    if signals.sample_size >= MIN_FAST_PATH_SAMPLE && signals.fast_path_ratio < LOW_FAST_PATH_RATIO {
        out.push(Recommendation {
            area: RecommendationArea::Strategy,
            priority: Priority::High,
            description: "strategy review".to_string(),
            impact: format!("fast path used on {:.1}% of operations", signals.fast_path_ratio * 100.0),
            implementation: "prefer unambiguous input shapes (explicit offsets, structured values)".to_string(),
            auto_applicable: false,
        });
    }

    if signals.average_execution_ms > HIGH_EXECUTION_MS {
        out.push(Recommendation {
            area: RecommendationArea::Configuration,
            priority: Priority::Medium,
            description: "performance tuning".to_string(),
            impact: format!("average execution time {:.2}ms", signals.average_execution_ms),
            implementation: "lower the strategy attempt budget or pre-normalize hot inputs".to_string(),
            auto_applicable: false,
        });
    }

    out.sort_by(|a, b| b.priority.cmp(&a.priority));
    out
}

pub(crate) fn health_of(analysis: &PerformanceAnalysis) -> HealthRating {
    let score = analysis.overall_efficiency * 100.0;
    if score >= EXCELLENT_FLOOR {
        HealthRating::Excellent
    } else if score >= GOOD_FLOOR {
        HealthRating::Good
    } else if score >= FAIR_FLOOR {
        HealthRating::Fair
    } else {
        HealthRating::Poor
    }
}

pub(crate) fn build_report(analysis: PerformanceAnalysis, recommendations: &[Recommendation]) -> PerformanceReport {
    let mut key_insights = analysis.strengths.clone();
    key_insights.extend(analysis.bottlenecks.iter().cloned());
    let action_items = recommendations
        .iter()
        .filter(|r| r.priority == Priority::High)
        .map(|r| r.description.clone())
        .collect();

    PerformanceReport {
        summary: ReportSummary { overall_health: health_of(&analysis), key_insights, action_items },
        analysis,
        generated_at: SystemTime::now(),
    }
}

fn signals_from(metrics: &ParseMetrics) -> EngineSignals {
    EngineSignals {
        success_ratio: metrics.success_ratio(),
        average_execution_ms: metrics.average_execution_ms(),
        fast_path_ratio: metrics.fast_path_ratio(),
        sample_size: metrics.total_parses,
    }
}

/// Analysis plus the single safe mutation, with an append-only history.
#[derive(Debug, Default)]
pub struct ParseOptimizer {
    history: Vec<OptimizationRecord>,
}

impl ParseOptimizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn analyze(&self, metrics: &ParseMetrics, cache: &CacheStats) -> PerformanceAnalysis {
        analyze_signals(&signals_from(metrics), cache)
    }

    pub fn recommendations(&self, metrics: &ParseMetrics, cache: &CacheStats) -> Vec<Recommendation> {
        recommend(&signals_from(metrics), cache)
    }

    /// Attempt the auto-applicable recommendations against `cache`.
    ///
    /// Failures never escape: each is captured per-recommendation in the
    /// returned report. Every call appends exactly one history record.
    pub fn apply(&mut self, recommendations: &[Recommendation], cache: &mut ParseCache) -> ApplyReport {
        let mut report = ApplyReport { applied: Vec::new(), skipped: Vec::new(), errors: Vec::new() };

        for rec in recommendations {
            if !rec.auto_applicable {
                report.skipped.push(rec.description.clone());
                continue;
            }
            match grow_cache(cache) {
                Ok(new_size) => {
                    report.applied.push(format!("{} (new capacity: {new_size})", rec.description))
                }
                Err(e) => report.errors.push(format!("{}: {e}", rec.description)),
            }
        }

        self.history.push(OptimizationRecord {
            recommendations: recommendations.to_vec(),
            applied: !report.applied.is_empty(),
            timestamp: SystemTime::now(),
        });
        report
    }

    pub fn report(&self, metrics: &ParseMetrics, cache: &CacheStats) -> PerformanceReport {
        let analysis = self.analyze(metrics, cache);
        let recommendations = self.recommendations(metrics, cache);
        build_report(analysis, &recommendations)
    }

    pub fn history(&self) -> &[OptimizationRecord] {
        &self.history
    }

    /// Clear the history log. Nothing else is owned, so nothing else resets.
    pub fn reset(&mut self) {
        self.history.clear();
    }
}

fn grow_cache(cache: &mut ParseCache) -> Result<usize> {
    let new_size = ((cache.max_size() as f64) * CACHE_GROWTH_FACTOR).floor() as usize;
    cache.set_max_size(new_size)?;
    Ok(new_size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn healthy_stats() -> CacheStats {
        CacheStats {
            size: 40,
            max_size: 100,
            hits: 95,
            misses: 5,
            sets: 40,
            evictions: 5,
            hit_ratio: 0.95,
            average_access_time_ms: 0.002,
            efficiency: 2.4,
        }
    }

    fn healthy_metrics() -> ParseMetrics {
        let mut m = ParseMetrics::new(false);
        for _ in 0..80 {
            m.record_success(crate::StrategyKind::Text, Duration::from_micros(500), true);
        }
        for _ in 0..20 {
            m.record_cache_hit();
        }
        m
    }

    #[test]
    fn optimal_system_yields_zero_recommendations_and_excellent_health() {
        let optimizer = ParseOptimizer::new();
        let metrics = healthy_metrics();
        let stats = healthy_stats();

        let recs = optimizer.recommendations(&metrics, &stats);
        assert!(recs.is_empty(), "expected zero recommendations, got {recs:?}");

        let report = optimizer.report(&metrics, &stats);
        assert_eq!(report.summary.overall_health, HealthRating::Excellent);
        assert!(report.summary.action_items.is_empty());
    }

    #[test]
    fn overall_efficiency_is_bounded_by_the_best_dimension() {
        let mut stats = healthy_stats();
        stats.hit_ratio = 0.3;
        let signals = EngineSignals {
            success_ratio: 1.0,
            average_execution_ms: 1.0,
            fast_path_ratio: 0.5,
            sample_size: 100,
        };
        let analysis = analyze_signals(&signals, &stats);
        assert!(analysis.overall_efficiency <= analysis.cache_efficiency.max(analysis.compute_efficiency));
    }

    #[test]
    fn eviction_pressure_produces_an_auto_applicable_resize() {
        let mut stats = healthy_stats();
        stats.evictions = 30;
        stats.sets = 60;
        let recs = recommend(
            &EngineSignals { success_ratio: 1.0, average_execution_ms: 1.0, fast_path_ratio: 0.5, sample_size: 100 },
            &stats,
        );
        assert_eq!(recs[0].description, "increase cache size");
        assert_eq!(recs[0].priority, Priority::High);
        assert!(recs[0].auto_applicable);
    }

    #[test]
    fn recommendations_sort_by_descending_priority() {
        let stats = CacheStats {
            size: 90,
            max_size: 100,
            hits: 4,
            misses: 30,
            sets: 60,
            evictions: 30,
            hit_ratio: 0.12,
            average_access_time_ms: 0.1,
            efficiency: 0.04,
        };
        let signals =
            EngineSignals { success_ratio: 0.8, average_execution_ms: 15.0, fast_path_ratio: 0.0, sample_size: 100 };
        let recs = recommend(&signals, &stats);
        assert!(recs.len() >= 3);
        for pair in recs.windows(2) {
            assert!(pair[0].priority >= pair[1].priority);
        }
    }

    #[test]
    fn apply_grows_the_cache_and_records_history() {
        let mut optimizer = ParseOptimizer::new();
        let mut cache = ParseCache::new(100, Duration::from_secs(60));
        let rec = Recommendation {
            area: RecommendationArea::Cache,
            priority: Priority::High,
            description: "increase cache size".to_string(),
            impact: String::new(),
            implementation: String::new(),
            auto_applicable: true,
        };
        let manual = Recommendation {
            area: RecommendationArea::Strategy,
            priority: Priority::High,
            description: "strategy review".to_string(),
            impact: String::new(),
            implementation: String::new(),
            auto_applicable: false,
        };

        let report = optimizer.apply(&[rec, manual], &mut cache);
        assert_eq!(report.applied.len(), 1);
        assert_eq!(report.skipped, vec!["strategy review".to_string()]);
        assert!(report.errors.is_empty());
        assert_eq!(cache.max_size(), 150);

        assert_eq!(optimizer.history().len(), 1);
        assert!(optimizer.history()[0].applied);
        optimizer.reset();
        assert!(optimizer.history().is_empty());
    }

    #[test]
    fn apply_with_no_recommendations_still_appends_history() {
        let mut optimizer = ParseOptimizer::new();
        let mut cache = ParseCache::new(10, Duration::from_secs(60));
        let report = optimizer.apply(&[], &mut cache);
        assert!(report.applied.is_empty() && report.skipped.is_empty() && report.errors.is_empty());
        assert_eq!(optimizer.history().len(), 1);
        assert!(!optimizer.history()[0].applied);
    }

    #[test]
    fn health_ratings_follow_the_cutoffs() {
        let rate = |eff: f64| {
            health_of(&PerformanceAnalysis {
                overall_efficiency: eff,
                cache_efficiency: eff,
                compute_efficiency: eff,
                bottlenecks: vec![],
                strengths: vec![],
            })
        };
        assert_eq!(rate(0.9), HealthRating::Excellent);
        assert_eq!(rate(0.75), HealthRating::Good);
        assert_eq!(rate(0.6), HealthRating::Fair);
        assert_eq!(rate(0.3), HealthRating::Poor);
    }
}
