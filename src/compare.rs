//! The comparison subsystem.
//!
//! Structurally a mirror of the parse side:
//!
//! ```text
//! (a, b, kind, options) ──▶ ComparisonCache lookup      (cache.rs)
//!                                     │ miss
//!                                     ▼
//!                     registry sweep, priority order    (engine.rs)
//!                       fast-instant ─▶ unit-aware ─▶ general
//!                                     │
//!                                     ▼
//!                     ComparisonMetrics ─▶ ComparisonOptimizer
//!                                            (optimizer.rs)
//! ```
//!
//! Operands are already-canonical datetimes, so strategies here never parse;
//! they order, truncate, and measure.

#[path = "compare/cache.rs"]
mod cache;
#[path = "compare/engine.rs"]
mod engine;
#[path = "compare/optimizer.rs"]
mod optimizer;
#[path = "compare/strategies.rs"]
mod strategies;

pub use cache::{CachedComparison, ComparisonCache};
pub use engine::{ComparisonEngine, ComparisonEngineConfig, ComparisonMetrics, ComparisonOutput};
pub use optimizer::ComparisonOptimizer;
pub use strategies::{
    CompareOptions, ComparisonKind, ComparisonStrategy, ComparisonValue, FastInstantStrategy,
    GeneralComparisonStrategy, UnitAwareStrategy,
};
