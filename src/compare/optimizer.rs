//! Comparison-side optimizer: the same analysis and safe-mutation contract
//! as the parse optimizer, pointed at comparison metrics and the comparison
//! cache.

use std::time::SystemTime;

use super::cache::ComparisonCache;
use super::engine::ComparisonMetrics;
use crate::engine::{
    ApplyReport, CacheStats, EngineSignals, OptimizationRecord, PerformanceAnalysis,
    PerformanceReport, Recommendation, analyze_signals, build_report, recommend,
};
use crate::error::Result;

const CACHE_GROWTH_FACTOR: f64 = 1.5;

fn signals_from(metrics: &ComparisonMetrics) -> EngineSignals {
    EngineSignals {
        success_ratio: metrics.success_ratio(),
        average_execution_ms: metrics.execution.mean_ms,
        fast_path_ratio: metrics.fast_path_ratio(),
        sample_size: metrics.total_comparisons,
    }
}

#[derive(Debug, Default)]
pub struct ComparisonOptimizer {
    history: Vec<OptimizationRecord>,
}

impl ComparisonOptimizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn analyze(&self, metrics: &ComparisonMetrics, cache: &CacheStats) -> PerformanceAnalysis {
        analyze_signals(&signals_from(metrics), cache)
    }

    pub fn recommendations(&self, metrics: &ComparisonMetrics, cache: &CacheStats) -> Vec<Recommendation> {
        recommend(&signals_from(metrics), cache)
    }

    /// Attempt the auto-applicable recommendations against the comparison
    /// cache; failures are captured, never rethrown. One history record per
    /// call.
    pub fn apply(&mut self, recommendations: &[Recommendation], cache: &mut ComparisonCache) -> ApplyReport {
        let mut report = ApplyReport { applied: Vec::new(), skipped: Vec::new(), errors: Vec::new() };
        for rec in recommendations {
            if !rec.auto_applicable {
                report.skipped.push(rec.description.clone());
                continue;
            }
            match grow_cache(cache) {
                Ok(new_size) => report.applied.push(format!("{} (new capacity: {new_size})", rec.description)),
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

    pub fn report(&self, metrics: &ComparisonMetrics, cache: &CacheStats) -> PerformanceReport {
        let analysis = self.analyze(metrics, cache);
        let recommendations = self.recommendations(metrics, cache);
        build_report(analysis, &recommendations)
    }

    pub fn history(&self) -> &[OptimizationRecord] {
        &self.history
    }

    pub fn reset(&mut self) {
        self.history.clear();
    }
}

fn grow_cache(cache: &mut ComparisonCache) -> Result<usize> {
    let new_size = ((cache.max_size() as f64) * CACHE_GROWTH_FACTOR).floor() as usize;
    cache.set_max_size(new_size)?;
    Ok(new_size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Priority, RecommendationArea};

    #[test]
    fn apply_grows_the_comparison_cache() {
        let mut optimizer = ComparisonOptimizer::new();
        let mut cache = ComparisonCache::new(200);
        let rec = Recommendation {
            area: RecommendationArea::Cache,
            priority: Priority::High,
            description: "increase cache size".to_string(),
            impact: String::new(),
            implementation: String::new(),
            auto_applicable: true,
        };
        let report = optimizer.apply(&[rec], &mut cache);
        assert_eq!(report.applied.len(), 1);
        assert_eq!(cache.max_size(), 300);
        assert_eq!(optimizer.history().len(), 1);
    }

    #[test]
    fn quiet_metrics_produce_no_recommendations() {
        let optimizer = ComparisonOptimizer::new();
        let mut metrics = ComparisonMetrics::default();
        for _ in 0..60 {
            metrics.record_success(
                crate::compare::ComparisonKind::IsBefore,
                "fast-instant",
                std::time::Duration::from_micros(100),
            );
        }
        let stats = CacheStats {
            size: 10,
            max_size: 100,
            hits: 60,
            misses: 3,
            sets: 10,
            evictions: 0,
            hit_ratio: 60.0 / 63.0,
            average_access_time_ms: 0.001,
            efficiency: 6.0,
        };
        assert!(optimizer.recommendations(&metrics, &stats).is_empty());
    }
}
