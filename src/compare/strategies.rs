//! Comparison strategies.
//!
//! Dispatch mirrors the parse side: a priority-ordered registry swept for the
//! first strategy whose `can_handle` accepts the (kind, options) pair.
//!
//! - `FastInstantStrategy`: exact-instant ordering for the five boolean
//!   kinds when no unit scoping is requested.
//! - `UnitAwareStrategy`: unit-truncated booleans and all diff computation.
//! - `GeneralComparisonStrategy`: the permissive fallback covering every
//!   kind; the "no strategy found" error is reachable only once this one has
//!   been explicitly unregistered.

use std::cmp::Ordering;

use crate::canonical::{CanonicalDateTime, DurationBreakdown, RoundingMode, TimeUnit};
use crate::error::Result;

/// The supported comparison kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub enum ComparisonKind {
    IsBefore,
    IsAfter,
    IsSame,
    IsSameOrBefore,
    IsSameOrAfter,
    Diff,
}

impl ComparisonKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComparisonKind::IsBefore => "isBefore",
            ComparisonKind::IsAfter => "isAfter",
            ComparisonKind::IsSame => "isSame",
            ComparisonKind::IsSameOrBefore => "isSameOrBefore",
            ComparisonKind::IsSameOrAfter => "isSameOrAfter",
            ComparisonKind::Diff => "diff",
        }
    }

    pub fn is_boolean(&self) -> bool {
        !matches!(self, ComparisonKind::Diff)
    }
}

impl std::fmt::Display for ComparisonKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options scoping one comparison.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompareOptions {
    /// Truncate both operands to this unit's boundary before comparing, or
    /// report diff counts in this unit.
    pub unit: Option<TimeUnit>,
    /// Rounding applied to unit-scoped diff counts.
    pub rounding: RoundingMode,
    pub use_cache: bool,
}

impl Default for CompareOptions {
    fn default() -> Self {
        CompareOptions { unit: None, rounding: RoundingMode::default(), use_cache: true }
    }
}

impl CompareOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_unit(mut self, unit: TimeUnit) -> Self {
        self.unit = Some(unit);
        self
    }

    pub fn rounded(mut self, rounding: RoundingMode) -> Self {
        self.rounding = rounding;
        self
    }

    pub fn no_cache(mut self) -> Self {
        self.use_cache = false;
        self
    }
}

/// Result payload of a comparison.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub enum ComparisonValue {
    Boolean(bool),
    /// Signed count in the requested unit (negative when the first operand
    /// precedes the second).
    Count(f64),
    /// Structured duration when no unit was requested for a diff.
    Breakdown(DurationBreakdown),
}

impl ComparisonValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ComparisonValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_count(&self) -> Option<f64> {
        match self {
            ComparisonValue::Count(c) => Some(*c),
            _ => None,
        }
    }
}

/// A self-contained handler for some subset of comparison requests.
pub trait ComparisonStrategy {
    fn name(&self) -> &'static str;

    /// Static priority; higher is swept first.
    fn priority(&self) -> u16;

    fn can_handle(&self, kind: ComparisonKind, options: &CompareOptions) -> bool;

    fn compare(
        &self,
        a: &CanonicalDateTime,
        b: &CanonicalDateTime,
        kind: ComparisonKind,
        options: &CompareOptions,
    ) -> Result<ComparisonValue>;
}

/// Evaluate a boolean kind from an instant ordering.
fn boolean_from_ordering(kind: ComparisonKind, ordering: Ordering) -> bool {
    match kind {
        ComparisonKind::IsBefore => ordering == Ordering::Less,
        ComparisonKind::IsAfter => ordering == Ordering::Greater,
        ComparisonKind::IsSame => ordering == Ordering::Equal,
        ComparisonKind::IsSameOrBefore => ordering != Ordering::Greater,
        ComparisonKind::IsSameOrAfter => ordering != Ordering::Less,
        ComparisonKind::Diff => unreachable!("diff is not a boolean comparison"),
    }
}

fn truncated_ordering(
    a: &CanonicalDateTime,
    b: &CanonicalDateTime,
    unit: Option<TimeUnit>,
) -> Result<Ordering> {
    Ok(match unit {
        Some(unit) => a.start_of(unit)?.cmp(&b.start_of(unit)?),
        None => a.cmp(b),
    })
}

fn diff_value(
    a: &CanonicalDateTime,
    b: &CanonicalDateTime,
    options: &CompareOptions,
) -> ComparisonValue {
    match options.unit {
        Some(unit) => ComparisonValue::Count(a.diff_in(b, unit, options.rounding)),
        None => ComparisonValue::Breakdown(a.diff_breakdown(b)),
    }
}

/// Exact-instant ordering; the hot path for plain boolean comparisons.
pub struct FastInstantStrategy;

impl ComparisonStrategy for FastInstantStrategy {
    fn name(&self) -> &'static str {
        "fast-instant"
    }

    fn priority(&self) -> u16 {
        100
    }

    fn can_handle(&self, kind: ComparisonKind, options: &CompareOptions) -> bool {
        kind.is_boolean() && options.unit.is_none()
    }

    fn compare(
        &self,
        a: &CanonicalDateTime,
        b: &CanonicalDateTime,
        kind: ComparisonKind,
        _options: &CompareOptions,
    ) -> Result<ComparisonValue> {
        Ok(ComparisonValue::Boolean(boolean_from_ordering(kind, a.cmp(b))))
    }
}

/// Unit-truncated booleans and diff computation.
pub struct UnitAwareStrategy;

impl ComparisonStrategy for UnitAwareStrategy {
    fn name(&self) -> &'static str {
        "unit-aware"
    }

    fn priority(&self) -> u16 {
        50
    }

    fn can_handle(&self, kind: ComparisonKind, options: &CompareOptions) -> bool {
        options.unit.is_some() || kind == ComparisonKind::Diff
    }

    fn compare(
        &self,
        a: &CanonicalDateTime,
        b: &CanonicalDateTime,
        kind: ComparisonKind,
        options: &CompareOptions,
    ) -> Result<ComparisonValue> {
        if kind == ComparisonKind::Diff {
            return Ok(diff_value(a, b, options));
        }
        let ordering = truncated_ordering(a, b, options.unit)?;
        Ok(ComparisonValue::Boolean(boolean_from_ordering(kind, ordering)))
    }
}

/// The permissive fallback: covers the five boolean kinds plus diff, with or
/// without unit scoping.
pub struct GeneralComparisonStrategy;

impl ComparisonStrategy for GeneralComparisonStrategy {
    fn name(&self) -> &'static str {
        "general"
    }

    fn priority(&self) -> u16 {
        0
    }

    fn can_handle(&self, _kind: ComparisonKind, _options: &CompareOptions) -> bool {
        true
    }

    fn compare(
        &self,
        a: &CanonicalDateTime,
        b: &CanonicalDateTime,
        kind: ComparisonKind,
        options: &CompareOptions,
    ) -> Result<ComparisonValue> {
        if kind == ComparisonKind::Diff {
            return Ok(diff_value(a, b, options));
        }
        let ordering = truncated_ordering(a, b, options.unit)?;
        Ok(ComparisonValue::Boolean(boolean_from_ordering(kind, ordering)))
    }
}

/// The default comparison registry, highest priority first.
pub(crate) fn default_comparison_strategies() -> Vec<Box<dyn ComparisonStrategy>> {
    vec![Box::new(FastInstantStrategy), Box::new(UnitAwareStrategy), Box::new(GeneralComparisonStrategy)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::UTC;

    fn dt(text: &str) -> CanonicalDateTime {
        CanonicalDateTime::from_rfc3339(text, UTC).unwrap()
    }

    #[test]
    fn fast_instant_covers_all_boolean_kinds() {
        let a = dt("2023-01-01T00:00:00Z");
        let b = dt("2023-01-02T00:00:00Z");
        let opts = CompareOptions::default();
        let cases = [
            (ComparisonKind::IsBefore, true),
            (ComparisonKind::IsAfter, false),
            (ComparisonKind::IsSame, false),
            (ComparisonKind::IsSameOrBefore, true),
            (ComparisonKind::IsSameOrAfter, false),
        ];
        for (kind, expected) in cases {
            assert!(FastInstantStrategy.can_handle(kind, &opts));
            let value = FastInstantStrategy.compare(&a, &b, kind, &opts).unwrap();
            assert_eq!(value.as_bool(), Some(expected), "kind: {kind}");
        }
        assert!(!FastInstantStrategy.can_handle(ComparisonKind::Diff, &opts));
    }

    #[test]
    fn unit_truncation_makes_same_day_instants_equal() {
        let morning = dt("2023-06-15T08:00:00Z");
        let evening = dt("2023-06-15T22:00:00Z");
        let day_opts = CompareOptions::new().in_unit(TimeUnit::Day);

        let same = UnitAwareStrategy.compare(&morning, &evening, ComparisonKind::IsSame, &day_opts).unwrap();
        assert_eq!(same.as_bool(), Some(true));

        let exact = FastInstantStrategy
            .compare(&morning, &evening, ComparisonKind::IsSame, &CompareOptions::default())
            .unwrap();
        assert_eq!(exact.as_bool(), Some(false));
    }

    #[test]
    fn diff_counts_are_signed_by_operand_order() {
        let a = dt("2023-01-01T00:00:00Z");
        let b = dt("2023-01-02T00:00:00Z");
        let opts = CompareOptions::new().in_unit(TimeUnit::Hour);
        let value = UnitAwareStrategy.compare(&a, &b, ComparisonKind::Diff, &opts).unwrap();
        assert_eq!(value.as_count(), Some(-24.0));
    }

    #[test]
    fn diff_without_unit_yields_a_breakdown() {
        let a = dt("2023-01-03T06:30:00Z");
        let b = dt("2023-01-01T00:00:00Z");
        let value =
            UnitAwareStrategy.compare(&a, &b, ComparisonKind::Diff, &CompareOptions::default()).unwrap();
        let ComparisonValue::Breakdown(d) = value else { panic!("expected breakdown") };
        assert_eq!((d.days, d.hours, d.minutes), (2, 6, 30));
    }

    #[test]
    fn general_fallback_accepts_everything() {
        let opts = CompareOptions::default();
        let unit_opts = CompareOptions::new().in_unit(TimeUnit::Month);
        for kind in [
            ComparisonKind::IsBefore,
            ComparisonKind::IsAfter,
            ComparisonKind::IsSame,
            ComparisonKind::IsSameOrBefore,
            ComparisonKind::IsSameOrAfter,
            ComparisonKind::Diff,
        ] {
            assert!(GeneralComparisonStrategy.can_handle(kind, &opts));
            assert!(GeneralComparisonStrategy.can_handle(kind, &unit_opts));
        }
    }
}
