//! chronorm — strategy-based temporal normalization.
//!
//! Heterogeneous temporal inputs (ISO strings, epoch numbers, native chrono
//! values, component arrays, seconds+nanos timestamp structures, relative
//! keywords) are resolved into one canonical timezone-aware datetime type.
//!
//! ```text
//! TemporalInput ──▶ ParseCoordinator ──▶ cache lookup
//!                        │                  │ miss
//!                        │                  ▼
//!                        │        strategy selection (priority /
//!                        │        confidence / hybrid) ──▶ validate ──▶
//!                        │        fast path ──▶ normalize ──▶ convert
//!                        │                  │
//!                        ▼                  ▼
//!                  metrics + optimizer  CanonicalDateTime
//! ```
//!
//! The comparison side ([`ComparisonEngine`]) mirrors the same
//! strategy/cache/optimizer triad over pairs of canonical datetimes.
//!
//! # Example
//!
//! ```
//! use chronorm::parse;
//!
//! let dt = parse("2023-12-25T10:30:00Z").unwrap();
//! assert_eq!((dt.year(), dt.month(), dt.day()), (2023, 12, 25));
//! ```

extern crate self as chronorm;

use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};

mod api;
mod canonical;
mod compare;
mod engine;
mod error;
mod patterns;
mod strategies;
mod strategy;

pub use api::{compare, parse, parse_with};
pub use canonical::{
    CanonicalDateTime, DurationBreakdown, RoundingMode, TimeUnit, parse_zone,
};
pub use compare::{
    CachedComparison, CompareOptions, ComparisonCache, ComparisonEngine, ComparisonEngineConfig,
    ComparisonKind, ComparisonMetrics, ComparisonOptimizer, ComparisonOutput, ComparisonStrategy,
    ComparisonValue, FastInstantStrategy, GeneralComparisonStrategy, UnitAwareStrategy,
};
pub use engine::{
    ApplyReport, BatchItem, CacheEfficiency, CacheOptimizeReport, CacheSnapshot, CacheStats,
    CachedParse, CoordinatorConfig, FallbackBehavior, HealthRating, IntegrityReport,
    OptimizationRecord, ParseCache, ParseCoordinator, ParseMetrics, ParseOptimizer,
    PerformanceAnalysis, PerformanceReport, PreloadReport, Priority, Recommendation,
    RecommendationArea, ReportSummary, RunningMean, SelectionMode, SnapshotEntry, StrategyUsage,
};
pub use error::{ErrorCode, Result, TemporalError};
pub use strategies::{
    ArrayLikeStrategy, CanonicalLikeStrategy, DateStrategy, FallbackStrategy, NumberStrategy,
    StringStrategy, TimestampStrategy, default_strategies,
};
pub use strategy::{
    Complexity, FastPath, Hints, Normalized, ParseContext, ParseFailure, ParseOptions,
    ParseStrategy, ParseSuccess, Validation,
};

// --- Core input vocabulary ---------------------------------------------------

/// Type tag identifying a strategy family. Used for metrics bucketing, cache
/// entry classification, and last-write-wins registry replacement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub enum StrategyKind {
    /// Canonical datetimes and canonical-like field structs.
    CanonicalLike,
    /// Seconds+nanoseconds timestamp structures.
    Timestamp,
    /// Native chrono datetime values.
    Date,
    /// Numeric component arrays.
    ArrayLike,
    /// Strings (ISO, keywords, month-name, loose formats).
    Text,
    /// Bare epoch numbers.
    Number,
    /// Last-resort permissive handler.
    Fallback,
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::CanonicalLike => "canonical-like",
            StrategyKind::Timestamp => "timestamp",
            StrategyKind::Date => "date",
            StrategyKind::ArrayLike => "array-like",
            StrategyKind::Text => "text",
            StrategyKind::Number => "number",
            StrategyKind::Fallback => "fallback",
        }
    }
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A canonical-like bag of wall-clock fields, optionally claiming its own
/// timezone. The context timezone, when explicitly set, overrides the claim.
#[derive(Debug, Clone, PartialEq)]
pub struct DateTimeFields {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
    pub nanosecond: u32,
    pub time_zone: Option<String>,
}

impl DateTimeFields {
    pub fn new(year: i32, month: u32, day: u32) -> Self {
        DateTimeFields { year, month, day, hour: 0, minute: 0, second: 0, nanosecond: 0, time_zone: None }
    }

    pub fn at(mut self, hour: u32, minute: u32, second: u32) -> Self {
        self.hour = hour;
        self.minute = minute;
        self.second = second;
        self
    }

    pub fn in_zone(mut self, zone: impl Into<String>) -> Self {
        self.time_zone = Some(zone.into());
        self
    }
}

/// The closed union of accepted input shapes.
///
/// Anything outside this union has no representation and therefore no parse
/// path; [`TemporalInput::Empty`] stands in for null/undefined inputs and is
/// handled by no strategy except under the coordinator's fallback policy.
#[derive(Debug, Clone, PartialEq)]
pub enum TemporalInput {
    /// ISO strings, keywords, month-name and loose formats, numeric strings.
    Text(String),
    /// Bare epoch number; unit (seconds vs milliseconds) is inferred.
    Number(f64),
    /// Native UTC instant.
    Utc(DateTime<Utc>),
    /// Native instant with a fixed offset.
    Fixed(DateTime<FixedOffset>),
    /// Naive wall-clock value, interpreted in the context timezone.
    Naive(NaiveDateTime),
    /// Already-canonical value (re-zoned if the context demands it).
    Canonical(CanonicalDateTime),
    /// Array-like `[year, month, day, hour, minute, second, millisecond]`
    /// (month is 1-based; trailing components optional).
    Components(Vec<f64>),
    /// Timestamp structure: whole seconds plus nanoseconds-of-second.
    Timestamp { seconds: i64, nanoseconds: u32 },
    /// Canonical-like field bag, optionally claiming its own timezone.
    Fields(DateTimeFields),
    /// Null/undefined stand-in.
    Empty,
}

impl TemporalInput {
    /// Short description used in error messages and cache fingerprints.
    pub fn describe(&self) -> String {
        match self {
            TemporalInput::Text(s) => format!("\"{s}\""),
            TemporalInput::Number(n) => format!("{n}"),
            TemporalInput::Utc(dt) => dt.to_rfc3339(),
            TemporalInput::Fixed(dt) => dt.to_rfc3339(),
            TemporalInput::Naive(dt) => dt.to_string(),
            TemporalInput::Canonical(dt) => dt.to_rfc3339(),
            TemporalInput::Components(parts) => format!("{parts:?}"),
            TemporalInput::Timestamp { seconds, nanoseconds } => {
                format!("{{seconds: {seconds}, nanoseconds: {nanoseconds}}}")
            }
            TemporalInput::Fields(f) => format!(
                "{{{:04}-{:02}-{:02} {:02}:{:02}:{:02} zone: {}}}",
                f.year,
                f.month,
                f.day,
                f.hour,
                f.minute,
                f.second,
                f.time_zone.as_deref().unwrap_or("-")
            ),
            TemporalInput::Empty => "null".to_string(),
        }
    }
}

impl From<&str> for TemporalInput {
    fn from(value: &str) -> Self {
        TemporalInput::Text(value.to_string())
    }
}

impl From<String> for TemporalInput {
    fn from(value: String) -> Self {
        TemporalInput::Text(value)
    }
}

impl From<f64> for TemporalInput {
    fn from(value: f64) -> Self {
        TemporalInput::Number(value)
    }
}

impl From<i64> for TemporalInput {
    fn from(value: i64) -> Self {
        TemporalInput::Number(value as f64)
    }
}

impl From<DateTime<Utc>> for TemporalInput {
    fn from(value: DateTime<Utc>) -> Self {
        TemporalInput::Utc(value)
    }
}

impl From<DateTime<FixedOffset>> for TemporalInput {
    fn from(value: DateTime<FixedOffset>) -> Self {
        TemporalInput::Fixed(value)
    }
}

impl From<NaiveDateTime> for TemporalInput {
    fn from(value: NaiveDateTime) -> Self {
        TemporalInput::Naive(value)
    }
}

impl From<std::time::SystemTime> for TemporalInput {
    fn from(value: std::time::SystemTime) -> Self {
        TemporalInput::Utc(value.into())
    }
}

impl From<CanonicalDateTime> for TemporalInput {
    fn from(value: CanonicalDateTime) -> Self {
        TemporalInput::Canonical(value)
    }
}

impl From<Vec<f64>> for TemporalInput {
    fn from(value: Vec<f64>) -> Self {
        TemporalInput::Components(value)
    }
}

impl From<Vec<i32>> for TemporalInput {
    fn from(value: Vec<i32>) -> Self {
        TemporalInput::Components(value.into_iter().map(f64::from).collect())
    }
}

impl From<DateTimeFields> for TemporalInput {
    fn from(value: DateTimeFields) -> Self {
        TemporalInput::Fields(value)
    }
}

impl<T> From<Option<T>> for TemporalInput
where
    T: Into<TemporalInput>,
{
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => v.into(),
            None => TemporalInput::Empty,
        }
    }
}

/// Gate for the env-controlled debug trace (`CHRONORM_DEBUG=1`).
pub(crate) fn debug_enabled() -> bool {
    std::env::var_os("CHRONORM_DEBUG").is_some()
}
