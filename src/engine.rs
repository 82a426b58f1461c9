//! Parsing orchestration engine.
//!
//! ## How the parts work together
//!
//! ```text
//! default_strategies ──┐
//!                      │  StrategyRegistry::new        (registry.rs)
//!                      └──────────────┬───────────────
//!                                     │
//! input ── fingerprint ──▶ ParseCache lookup           (cache.rs)
//!                                     │ miss
//!                                     ▼
//!                     ParseCoordinator::attempt        (coordinator.rs)
//!                       - select candidates (priority / confidence / hybrid)
//!                       - validate ─▶ fast path ─▶ normalize ─▶ convert
//!                       - bounded by the attempt budget
//!                                     │
//!                                     ▼
//!                     ParseMetrics accumulate          (metrics.rs)
//!                                     │ every N successes
//!                                     ▼
//!                     ParseOptimizer analyze/apply     (optimizer.rs)
//!                       - may grow the cache, never fails the parse
//! ```
//!
//! ## Responsibilities by module
//!
//! - `registry.rs`: priority-sorted strategy list with last-write-wins
//!   replacement by kind.
//! - `coordinator.rs`: the per-parse state machine, batch parsing, and the
//!   fallback policy (error / null / retry).
//! - `cache.rs`: fingerprint-keyed LRU with TTL, stats, advisories,
//!   preload, snapshots, and integrity checking.
//! - `metrics.rs`: monotonic counters plus a running execution-time mean.
//! - `optimizer.rs`: efficiency analysis, prioritized recommendations, the
//!   single safe auto-mutation (cache growth), and the optimization history.
//!
//! The comparison side (`crate::compare`) mirrors this layout over pairs of
//! canonical datetimes.

#[path = "engine/cache.rs"]
mod cache;
#[path = "engine/coordinator.rs"]
mod coordinator;
#[path = "engine/metrics.rs"]
mod metrics;
#[path = "engine/optimizer.rs"]
mod optimizer;
#[path = "engine/registry.rs"]
mod registry;

pub use cache::{
    CacheEfficiency, CacheOptimizeReport, CacheSnapshot, CacheStats, CachedParse, IntegrityReport,
    ParseCache, PreloadReport, SnapshotEntry,
};
pub(crate) use cache::ENTRY_COST_BYTES;
pub use coordinator::{BatchItem, CoordinatorConfig, FallbackBehavior, ParseCoordinator, SelectionMode};
pub use metrics::{ParseMetrics, RunningMean, StrategyUsage};
pub use optimizer::{
    ApplyReport, HealthRating, OptimizationRecord, ParseOptimizer, PerformanceAnalysis,
    PerformanceReport, Priority, Recommendation, RecommendationArea, ReportSummary,
};
pub(crate) use optimizer::{EngineSignals, analyze_signals, build_report, recommend};
