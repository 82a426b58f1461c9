//! Convenience entry points.
//!
//! These construct a one-shot engine per call, which keeps them free of
//! hidden global state: no cross-call cache, no shared metrics. Long-lived
//! use — where the cache, metrics, and optimizer earn their keep — goes
//! through an explicitly constructed [`ParseCoordinator`] /
//! [`ComparisonEngine`] instead.

use crate::canonical::CanonicalDateTime;
use crate::compare::{CompareOptions, ComparisonEngine, ComparisonKind, ComparisonOutput};
use crate::engine::ParseCoordinator;
use crate::error::Result;
use crate::strategy::ParseOptions;
use crate::TemporalInput;

/// Parse `input` with default options (UTC, cache on, lenient).
///
/// # Example
/// ```
/// use chronorm::parse;
///
/// let dt = parse("2023-12-25T10:30:00Z").unwrap();
/// assert_eq!(dt.hour(), 10);
/// ```
pub fn parse(input: impl Into<TemporalInput>) -> Result<CanonicalDateTime> {
    parse_with(input, &ParseOptions::default())
}

/// Parse `input` with explicit options.
///
/// Use this to pin the timezone, the reference clock for relative keywords,
/// strictness, or cache behavior.
pub fn parse_with(input: impl Into<TemporalInput>, options: &ParseOptions) -> Result<CanonicalDateTime> {
    ParseCoordinator::new().parse(input, options)
}

/// Compare two canonical datetimes with default options (exact instants).
///
/// # Example
/// ```
/// use chronorm::{compare, parse, ComparisonKind};
///
/// let a = parse("2023-01-01T00:00:00Z").unwrap();
/// let b = parse("2023-01-02T00:00:00Z").unwrap();
/// let out = compare(&a, &b, ComparisonKind::IsBefore).unwrap();
/// assert_eq!(out.value.as_bool(), Some(true));
/// ```
pub fn compare(
    a: &CanonicalDateTime,
    b: &CanonicalDateTime,
    kind: ComparisonKind,
) -> Result<ComparisonOutput> {
    ComparisonEngine::new().compare(a, b, kind, &CompareOptions::default())
}
