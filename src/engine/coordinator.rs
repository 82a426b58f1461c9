//! The parse coordinator.
//!
//! One `parse` call walks this state machine:
//!
//! ```text
//! init ──▶ cache lookup ──▶ candidate selection ──▶
//!   { validate ─▶ fast path ─▶ normalize ─▶ convert }  (per candidate,
//!   │                                                   bounded by the
//!   ▼                                                   attempt budget)
//! success ──▶ cache store ──▶ auto-optimization tick
//!   │
//!   └─ exhaustion ──▶ fallback behavior (error / null / retry)
//! ```
//!
//! Selection policy:
//!
//! - `priority`: registry order, first `can_handle` wins.
//! - `confidence`: highest confidence first.
//! - `hybrid` (default): confidence first, but candidates within a small
//!   epsilon of each other fall back to priority order — pure priority
//!   starves confident low-priority matches, pure confidence thrashes on
//!   near-ties.
//!
//! The auto-optimization tick is fire-and-continue: it can grow the cache,
//! but it can never fail or block the parse that triggered it.

use std::time::Duration;

use chrono_tz::Tz;

use super::cache::{
    CacheSnapshot, CacheStats, CachedParse, IntegrityReport, ParseCache, PreloadReport, fingerprint,
};
use super::metrics::ParseMetrics;
use super::optimizer::{ApplyReport, OptimizationRecord, ParseOptimizer, PerformanceAnalysis, PerformanceReport};
use super::registry::StrategyRegistry;
use crate::canonical::CanonicalDateTime;
use crate::debug_enabled;
use crate::error::{Result, TemporalError};
use crate::strategies::{FallbackStrategy, default_strategies};
use crate::strategy::{ParseContext, ParseOptions, ParseStrategy, ParseSuccess};
use crate::{StrategyKind, TemporalInput};

/// Candidates whose confidences differ by less than this are considered tied
/// in hybrid selection.
const CONFIDENCE_EPSILON: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
pub enum SelectionMode {
    Priority,
    Confidence,
    #[default]
    Hybrid,
}

/// What the coordinator does once every candidate has failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
pub enum FallbackBehavior {
    /// Surface a typed exhaustion error (default).
    #[default]
    Error,
    /// Return the epoch-zero sentinel in the requested zone.
    Null,
    /// Give the permissive fallback strategy one more swing, then error.
    Retry,
}

#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    pub max_strategy_attempts: usize,
    pub auto_optimize: bool,
    /// Run the optimizer every N successful parses.
    pub auto_optimize_interval: u64,
    pub detailed_metrics: bool,
    pub selection: SelectionMode,
    pub fallback: FallbackBehavior,
    pub default_time_zone: Tz,
    pub cache_capacity: usize,
    pub cache_ttl: Duration,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        CoordinatorConfig {
            max_strategy_attempts: 3,
            auto_optimize: true,
            auto_optimize_interval: 50,
            detailed_metrics: false,
            selection: SelectionMode::default(),
            fallback: FallbackBehavior::default(),
            default_time_zone: chrono_tz::UTC,
            cache_capacity: 512,
            cache_ttl: Duration::from_secs(300),
        }
    }
}

/// One entry of a batch parse result; items are independent and ordered.
#[derive(Debug, Clone)]
pub struct BatchItem {
    pub input: TemporalInput,
    pub outcome: Result<CanonicalDateTime>,
}

/// Internal result of the candidate walk.
struct AttemptOutcome {
    success: ParseSuccess,
    fast_path: bool,
    should_cache: bool,
}

pub struct ParseCoordinator {
    config: CoordinatorConfig,
    registry: StrategyRegistry,
    cache: ParseCache,
    metrics: ParseMetrics,
    optimizer: ParseOptimizer,
}

impl Default for ParseCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl ParseCoordinator {
    pub fn new() -> Self {
        Self::with_config(CoordinatorConfig::default())
    }

    pub fn with_config(config: CoordinatorConfig) -> Self {
        let cache = ParseCache::new(config.cache_capacity, config.cache_ttl);
        let metrics = ParseMetrics::new(config.detailed_metrics);
        ParseCoordinator {
            config,
            registry: StrategyRegistry::new(default_strategies()),
            cache,
            metrics,
            optimizer: ParseOptimizer::new(),
        }
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    /// Parse one input into the canonical type.
    pub fn parse(&mut self, input: impl Into<TemporalInput>, options: &ParseOptions) -> Result<CanonicalDateTime> {
        let input = input.into();
        let mut ctx = ParseContext::new(options, self.config.default_time_zone);
        let key = fingerprint(&input, &ctx);

        if ctx.cache_enabled {
            if let Some(hit) = self.cache.get(&key) {
                self.metrics.record_cache_hit();
                if debug_enabled() {
                    eprintln!("[parse] cache hit key={key}");
                }
                return Ok(hit.data);
            }
            self.metrics.record_cache_miss();
        }

        match self.attempt(&input, &mut ctx) {
            Ok(outcome) => {
                let success = outcome.success;
                self.metrics.record_success(success.strategy, success.execution, outcome.fast_path);
                if ctx.cache_enabled && outcome.should_cache {
                    self.cache.set(
                        key,
                        CachedParse {
                            data: success.data.clone(),
                            strategy: success.strategy,
                            confidence: success.confidence,
                        },
                        success.execution,
                    );
                }
                self.auto_optimize_tick();
                Ok(success.data)
            }
            Err(exhausted) => self.exhausted(exhausted, &input, &ctx),
        }
    }

    /// Independent per-item evaluation: one failure never aborts the rest,
    /// and items sharing a fingerprint reuse the cache.
    pub fn batch_parse(&mut self, inputs: Vec<TemporalInput>, options: &ParseOptions) -> Vec<BatchItem> {
        inputs
            .into_iter()
            .map(|input| {
                let outcome = self.parse(input.clone(), options);
                BatchItem { input, outcome }
            })
            .collect()
    }

    /// Walk the selected candidates through validate → fast path →
    /// normalize → convert.
    fn attempt(
        &mut self,
        input: &TemporalInput,
        ctx: &mut ParseContext,
    ) -> std::result::Result<AttemptOutcome, TemporalError> {
        let candidates = select_candidates(&self.registry, self.config.selection, input, ctx);
        if debug_enabled() {
            eprintln!("[select] mode={:?} candidates={candidates:?}", self.config.selection);
        }

        let mut tried: Vec<StrategyKind> = Vec::new();
        for (kind, confidence) in candidates.into_iter().take(self.config.max_strategy_attempts) {
            tried.push(kind);
            ctx.inferred = Some(kind);
            ctx.confidence = confidence;
            self.metrics.record_attempt(kind);

            let Some(strategy) = self.registry.iter().find(|s| s.kind() == kind) else {
                continue;
            };

            let validation = strategy.validate(input, ctx);
            if !validation.is_valid {
                if debug_enabled() {
                    eprintln!("[validate] {kind} rejected: {:?}", validation.errors);
                }
                // Strict mode: a failed validation disqualifies the candidate
                // outright. Otherwise conversion gets the final say — it
                // fails with a typed error for truly impossible values.
                if ctx.strict {
                    continue;
                }
            }

            let hints = strategy.optimization_hints(input, ctx);

            if validation.is_valid {
                let fast = strategy.check_fast_path(input, ctx);
                if fast.usable {
                    if let Some(data) = fast.data {
                        return Ok(AttemptOutcome {
                            success: ParseSuccess {
                                data,
                                strategy: kind,
                                confidence: fast.confidence,
                                execution: ctx.started.elapsed(),
                                from_cache: false,
                            },
                            fast_path: true,
                            should_cache: hints.should_cache,
                        });
                    }
                }
            }

            let normalized = strategy.normalize(input, ctx);
            if !normalized.applied.is_empty() {
                ctx.metadata.insert("transforms".to_string(), normalized.applied.join(","));
                if debug_enabled() {
                    eprintln!("[normalize] {kind} applied={:?}", normalized.applied);
                }
            }

            match strategy.parse(&normalized.input, ctx) {
                Ok(success) => {
                    return Ok(AttemptOutcome { success, fast_path: false, should_cache: hints.should_cache });
                }
                Err(failure) => {
                    self.metrics.record_attempt_failure(kind, failure.execution);
                    if debug_enabled() {
                        eprintln!("[convert] {kind} failed: {}", failure.error);
                    }
                }
            }
        }

        Err(TemporalError::Exhausted { input: input.describe(), tried })
    }

    /// Apply the configured fallback behavior to an exhausted parse.
    fn exhausted(
        &mut self,
        error: TemporalError,
        input: &TemporalInput,
        ctx: &ParseContext,
    ) -> Result<CanonicalDateTime> {
        match self.config.fallback {
            FallbackBehavior::Error => {
                self.metrics.record_failure(ctx.started.elapsed());
                Err(error)
            }
            FallbackBehavior::Null => {
                self.metrics.record_failure(ctx.started.elapsed());
                Ok(CanonicalDateTime::epoch(ctx.zone))
            }
            FallbackBehavior::Retry => {
                let retry = FallbackStrategy;
                if retry.can_handle(input, ctx) {
                    if let Ok(success) = retry.parse(input, ctx) {
                        self.metrics.record_success(success.strategy, success.execution, false);
                        return Ok(success.data);
                    }
                }
                self.metrics.record_failure(ctx.started.elapsed());
                Err(error)
            }
        }
    }

    /// Every `auto_optimize_interval` successful parses, analyze and apply
    /// the safe recommendations. Never fails the in-flight parse.
    fn auto_optimize_tick(&mut self) {
        if !self.config.auto_optimize || self.config.auto_optimize_interval == 0 {
            return;
        }
        if self.metrics.successful_parses % self.config.auto_optimize_interval != 0 {
            return;
        }
        let stats = self.cache.stats();
        let recommendations = self.optimizer.recommendations(&self.metrics, &stats);
        if recommendations.is_empty() {
            return;
        }
        let report = self.optimizer.apply(&recommendations, &mut self.cache);
        if debug_enabled() {
            eprintln!(
                "[auto-optimize] applied={:?} skipped={:?} errors={:?}",
                report.applied, report.skipped, report.errors
            );
        }
    }

    // --- Metrics & diagnostics ----------------------------------------------

    pub fn metrics(&self) -> &ParseMetrics {
        &self.metrics
    }

    /// Zero the counters; cache and registry are untouched.
    pub fn reset_metrics(&mut self) {
        self.metrics.reset();
    }

    pub fn performance_analysis(&self) -> PerformanceAnalysis {
        self.optimizer.analyze(&self.metrics, &self.cache.stats())
    }

    pub fn performance_report(&self) -> PerformanceReport {
        self.optimizer.report(&self.metrics, &self.cache.stats())
    }

    /// Generate and immediately apply the current auto-applicable
    /// recommendations.
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

    pub fn preload_cache(&mut self, entries: Vec<(String, CachedParse)>) -> PreloadReport {
        self.cache.preload(entries)
    }

    pub fn cache_snapshot(&self) -> CacheSnapshot {
        self.cache.snapshot()
    }

    pub fn validate_cache_integrity(&self) -> IntegrityReport {
        self.cache.validate_integrity()
    }

    // --- Registry administration --------------------------------------------

    pub fn register_strategy(&mut self, strategy: Box<dyn ParseStrategy>) {
        self.registry.register(strategy);
    }

    pub fn unregister_strategy(&mut self, kind: StrategyKind) -> bool {
        self.registry.unregister(kind)
    }

    pub fn strategy_kinds(&self) -> Vec<StrategyKind> {
        self.registry.kinds()
    }
}

/// Compute the ordered candidate list for one input.
fn select_candidates(
    registry: &StrategyRegistry,
    mode: SelectionMode,
    input: &TemporalInput,
    ctx: &ParseContext,
) -> Vec<(StrategyKind, f64)> {
    // Registry iteration order is already priority-descending.
    let mut candidates: Vec<(StrategyKind, u16, f64)> = registry
        .iter()
        .filter(|s| s.can_handle(input, ctx))
        .map(|s| (s.kind(), s.priority(), s.confidence(input, ctx)))
        .collect();

    match mode {
        SelectionMode::Priority => {}
        SelectionMode::Confidence => {
            candidates.sort_by(|a, b| b.2.total_cmp(&a.2));
        }
        SelectionMode::Hybrid => {
            // Bucket confidences by epsilon so the comparison is a total
            // order: ties inside a bucket resolve by priority.
            let bucket = |c: f64| (c / CONFIDENCE_EPSILON).round() as i64;
            candidates.sort_by(|a, b| bucket(b.2).cmp(&bucket(a.2)).then(b.1.cmp(&a.1)));
        }
    }

    candidates.into_iter().map(|(kind, _, confidence)| (kind, confidence)).collect()
}
