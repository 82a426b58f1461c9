//! The comparison engine: strategy dispatch over pairs of canonical
//! datetimes, with its own cache, metrics, and optimizer.
//!
//! Dispatch sweeps the priority-ordered registry for the first strategy that
//! accepts the (kind, options) pair. The default registry always ends with
//! the permissive fallback, so the "no strategy found" error is reachable
//! only after the registry has been explicitly emptied.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use super::cache::{CachedComparison, ComparisonCache, comparison_fingerprint};
use super::optimizer::ComparisonOptimizer;
use super::strategies::{
    CompareOptions, ComparisonKind, ComparisonStrategy, ComparisonValue, default_comparison_strategies,
};
use crate::canonical::{CanonicalDateTime, TimeUnit};
use crate::debug_enabled;
use crate::engine::{
    ApplyReport, CacheOptimizeReport, CacheStats, OptimizationRecord, PerformanceAnalysis,
    PerformanceReport, RunningMean,
};
use crate::error::{Result, TemporalError};

/// Strategy name whose usage counts as fast-path usage in the analysis.
const FAST_STRATEGY_NAME: &str = "fast-instant";

#[derive(Debug, Clone)]
pub struct ComparisonEngineConfig {
    pub auto_optimize: bool,
    /// Run the optimizer every N successful comparisons.
    pub auto_optimize_interval: u64,
    pub cache_capacity: usize,
}

impl Default for ComparisonEngineConfig {
    fn default() -> Self {
        ComparisonEngineConfig { auto_optimize: true, auto_optimize_interval: 100, cache_capacity: 256 }
    }
}

/// Counters mirroring the parse metrics, bucketed by kind and strategy.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct ComparisonMetrics {
    pub total_comparisons: u64,
    pub successful_comparisons: u64,
    pub failed_comparisons: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub per_kind: HashMap<ComparisonKind, u64>,
    pub per_strategy: HashMap<String, u64>,
    pub execution: RunningMean,
}

impl ComparisonMetrics {
    pub fn record_success(&mut self, kind: ComparisonKind, strategy: &str, duration: Duration) {
        self.total_comparisons += 1;
        self.successful_comparisons += 1;
        *self.per_kind.entry(kind).or_default() += 1;
        *self.per_strategy.entry(strategy.to_string()).or_default() += 1;
        self.execution.record(duration);
    }

    pub fn record_failure(&mut self, kind: ComparisonKind, duration: Duration) {
        self.total_comparisons += 1;
        self.failed_comparisons += 1;
        *self.per_kind.entry(kind).or_default() += 1;
        self.execution.record(duration);
    }

    pub fn record_cache_hit(&mut self, kind: ComparisonKind) {
        self.total_comparisons += 1;
        self.successful_comparisons += 1;
        self.cache_hits += 1;
        *self.per_kind.entry(kind).or_default() += 1;
    }

    pub fn record_cache_miss(&mut self) {
        self.cache_misses += 1;
    }

    pub fn success_ratio(&self) -> f64 {
        if self.total_comparisons == 0 {
            0.0
        } else {
            self.successful_comparisons as f64 / self.total_comparisons as f64
        }
    }

    pub fn fast_path_ratio(&self) -> f64 {
        if self.successful_comparisons == 0 {
            return 0.0;
        }
        let fast = self.per_strategy.get(FAST_STRATEGY_NAME).copied().unwrap_or(0);
        fast as f64 / self.successful_comparisons as f64
    }

    pub fn reset(&mut self) {
        *self = ComparisonMetrics::default();
    }
}

/// The completed result of one comparison request.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonOutput {
    pub value: ComparisonValue,
    pub kind: ComparisonKind,
    /// The unit the operands were truncated to, when unit scoping was used.
    pub precision: Option<TimeUnit>,
    pub cached: bool,
    pub compute_time: Duration,
}

pub struct ComparisonEngine {
    config: ComparisonEngineConfig,
    registry: Vec<Box<dyn ComparisonStrategy>>,
    cache: ComparisonCache,
    metrics: ComparisonMetrics,
    optimizer: ComparisonOptimizer,
}

impl Default for ComparisonEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ComparisonEngine {
    pub fn new() -> Self {
        Self::with_config(ComparisonEngineConfig::default())
    }

    pub fn with_config(config: ComparisonEngineConfig) -> Self {
        let cache = ComparisonCache::new(config.cache_capacity);
        let mut engine = ComparisonEngine {
            config,
            registry: default_comparison_strategies(),
            cache,
            metrics: ComparisonMetrics::default(),
            optimizer: ComparisonOptimizer::new(),
        };
        engine.resort();
        engine
    }

    fn resort(&mut self) {
        self.registry.sort_by(|a, b| b.priority().cmp(&a.priority()));
    }

    /// Compare two canonical datetimes.
    pub fn compare(
        &mut self,
        a: &CanonicalDateTime,
        b: &CanonicalDateTime,
        kind: ComparisonKind,
        options: &CompareOptions,
    ) -> Result<ComparisonOutput> {
        let started = Instant::now();
        let key = comparison_fingerprint(a, b, kind, options.unit, options.rounding);

        if options.use_cache {
            if let Some(hit) = self.cache.get(&key) {
                self.metrics.record_cache_hit(kind);
                return Ok(ComparisonOutput {
                    value: hit.value,
                    kind: hit.kind,
                    precision: hit.precision,
                    cached: true,
                    compute_time: started.elapsed(),
                });
            }
            self.metrics.record_cache_miss();
        }

        let Some(strategy) = self.registry.iter().find(|s| s.can_handle(kind, options)) else {
            self.metrics.record_failure(kind, started.elapsed());
            return Err(TemporalError::UnsupportedComparison(kind.as_str().to_string()));
        };

        if debug_enabled() {
            eprintln!("[compare] kind={kind} strategy={}", strategy.name());
        }

        match strategy.compare(a, b, kind, options) {
            Ok(value) => {
                let compute_time = started.elapsed();
                self.metrics.record_success(kind, strategy.name(), compute_time);
                if options.use_cache {
                    self.cache.set(
                        key,
                        CachedComparison { value: value.clone(), kind, precision: options.unit },
                    );
                }
                self.auto_optimize_tick();
                Ok(ComparisonOutput { value, kind, precision: options.unit, cached: false, compute_time })
            }
            Err(e) => {
                self.metrics.record_failure(kind, started.elapsed());
                Err(e)
            }
        }
    }

    fn auto_optimize_tick(&mut self) {
        if !self.config.auto_optimize || self.config.auto_optimize_interval == 0 {
            return;
        }
        if self.metrics.successful_comparisons % self.config.auto_optimize_interval != 0 {
            return;
        }
        let stats = self.cache.stats();
        let recommendations = self.optimizer.recommendations(&self.metrics, &stats);
        if recommendations.is_empty() {
            return;
        }
        let report = self.optimizer.apply(&recommendations, &mut self.cache);
        if debug_enabled() {
            eprintln!("[compare auto-optimize] applied={:?} errors={:?}", report.applied, report.errors);
        }
    }

    // --- Registry administration --------------------------------------------

    /// Insert or replace by strategy name (last-write-wins).
    pub fn register_strategy(&mut self, strategy: Box<dyn ComparisonStrategy>) {
        let name = strategy.name();
        if let Some(existing) = self.registry.iter_mut().find(|s| s.name() == name) {
            *existing = strategy;
        } else {
            self.registry.push(strategy);
        }
        self.resort();
    }

    pub fn unregister_strategy(&mut self, name: &str) -> bool {
        let before = self.registry.len();
        self.registry.retain(|s| s.name() != name);
        self.registry.len() != before
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.registry.iter().map(|s| s.name()).collect()
    }

    // --- Metrics & diagnostics ----------------------------------------------

    pub fn metrics(&self) -> &ComparisonMetrics {
        &self.metrics
    }

    pub fn reset_metrics(&mut self) {
        self.metrics.reset();
    }

    pub fn performance_analysis(&self) -> PerformanceAnalysis {
        self.optimizer.analyze(&self.metrics, &self.cache.stats())
    }

    pub fn performance_report(&self) -> PerformanceReport {
        self.optimizer.report(&self.metrics, &self.cache.stats())
    }

    pub fn apply_optimizations(&mut self) -> ApplyReport {
        let stats = self.cache.stats();
        let recommendations = self.optimizer.recommendations(&self.metrics, &stats);
        self.optimizer.apply(&recommendations, &mut self.cache)
    }

    pub fn optimization_history(&self) -> &[OptimizationRecord] {
        self.optimizer.history()
    }

    // --- Cache administration -----------------------------------------------

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    pub fn set_cache_max_size(&mut self, max_size: usize) -> Result<()> {
        self.cache.set_max_size(max_size)
    }

    pub fn optimize_cache(&mut self) -> CacheOptimizeReport {
        self.cache.optimize()
    }
}
