//! The last-resort permissive strategy.
//!
//! Lowest priority, lowest confidence, broadest reach: anything coercible is
//! coerced. Strings get a best-effort human-readable pass through
//! `chrono-english` ("next friday", "March 5 2024") on top of the generic
//! conversions the structured strategies would normally own. This is also the
//! strategy the coordinator re-runs under `retry` fallback behavior.

use chrono_english::{Dialect, parse_date_string};

use crate::canonical::CanonicalDateTime;
use crate::error::{ErrorCode, TemporalError};
use crate::patterns::{confidence, priority};
use crate::strategy::{ParseContext, ParseFailure, ParseStrategy, ParseSuccess, Validation, run_timed};
use crate::{StrategyKind, TemporalInput};

use super::common::{components_to_canonical, fields_to_canonical, timestamp_to_canonical};
use super::number::classify_epoch;

pub struct FallbackStrategy;

fn best_effort(input: &TemporalInput, ctx: &ParseContext) -> Result<CanonicalDateTime, TemporalError> {
    let fail = |message: String| TemporalError::strategy(ErrorCode::FallbackParse, message, input.describe());
    match input {
        TemporalInput::Canonical(dt) => {
            Ok(if ctx.zone_was_explicit { dt.in_zone(ctx.zone) } else { dt.clone() })
        }
        TemporalInput::Utc(dt) => Ok(CanonicalDateTime::from_utc(*dt, ctx.zone)),
        TemporalInput::Fixed(dt) => Ok(CanonicalDateTime::from_fixed(*dt, ctx.zone)),
        TemporalInput::Naive(naive) => CanonicalDateTime::from_local(*naive, ctx.zone),
        TemporalInput::Fields(f) => fields_to_canonical(f, ctx).map(|(dt, _)| dt),
        TemporalInput::Components(parts) => components_to_canonical(parts, ctx.zone),
        TemporalInput::Timestamp { seconds, nanoseconds } => {
            timestamp_to_canonical(*seconds, *nanoseconds, ctx.zone)
        }
        TemporalInput::Number(n) => {
            let class = classify_epoch(*n).map_err(|e| fail(e.to_string()))?;
            CanonicalDateTime::from_epoch_millis(class.millis, ctx.zone)
        }
        TemporalInput::Text(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Err(fail("empty input".into()));
            }
            // Human-readable pass first, then one more numeric attempt.
            if let Ok(dt) = parse_date_string(trimmed, ctx.reference.to_utc(), Dialect::Uk) {
                return Ok(CanonicalDateTime::from_utc(dt, ctx.zone));
            }
            if let Ok(value) = trimmed.parse::<f64>() {
                if let Ok(class) = classify_epoch(value) {
                    return CanonicalDateTime::from_epoch_millis(class.millis, ctx.zone);
                }
            }
            Err(fail(format!("no best-effort interpretation for: {trimmed}")))
        }
        TemporalInput::Empty => Err(fail("null input".into())),
    }
}

impl ParseStrategy for FallbackStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Fallback
    }

    fn priority(&self) -> u16 {
        priority::FALLBACK
    }

    fn can_handle(&self, input: &TemporalInput, _ctx: &ParseContext) -> bool {
        !matches!(input, TemporalInput::Empty)
    }

    fn confidence(&self, input: &TemporalInput, _ctx: &ParseContext) -> f64 {
        match input {
            TemporalInput::Empty => confidence::NONE,
            _ => confidence::UNRECOGNIZED,
        }
    }

    fn validate(&self, input: &TemporalInput, _ctx: &ParseContext) -> Validation {
        match input {
            TemporalInput::Empty => Validation::invalid("null input"),
            _ => Validation::valid(confidence::UNRECOGNIZED)
                .with_warning("best-effort interpretation; prefer a structured input shape"),
        }
    }

    fn parse(&self, input: &TemporalInput, ctx: &ParseContext) -> Result<ParseSuccess, ParseFailure> {
        let input = input.clone();
        let ctx = ctx.clone();
        run_timed(StrategyKind::Fallback, move || {
            best_effort(&input, &ctx).map(|dt| (dt, confidence::UNRECOGNIZED))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::ParseOptions;

    fn ctx() -> ParseContext {
        ParseContext::new(&ParseOptions::default(), chrono_tz::UTC)
    }

    #[test]
    fn handles_every_shape_except_empty() {
        let c = ctx();
        assert!(FallbackStrategy.can_handle(&TemporalInput::Text("x".into()), &c));
        assert!(FallbackStrategy.can_handle(&TemporalInput::Number(0.0), &c));
        assert!(!FallbackStrategy.can_handle(&TemporalInput::Empty, &c));
        assert_eq!(FallbackStrategy.confidence(&TemporalInput::Empty, &c), 0.0);
    }

    #[test]
    fn human_readable_phrases_resolve_against_the_reference() {
        // Reference is pinned to 2023-06-15 (a Thursday) under test.
        let out = FallbackStrategy.parse(&TemporalInput::Text("next friday".into()), &ctx()).unwrap();
        assert_eq!((out.data.year(), out.data.month()), (2023, 6));
        assert_eq!(out.data.weekday(), chrono::Weekday::Fri);
    }

    #[test]
    fn structured_shapes_still_coerce() {
        let out = FallbackStrategy
            .parse(&TemporalInput::Timestamp { seconds: 1_703_505_000, nanoseconds: 0 }, &ctx())
            .unwrap();
        assert_eq!((out.data.year(), out.data.month(), out.data.day()), (2023, 12, 25));
        assert_eq!(out.confidence, confidence::UNRECOGNIZED);
    }

    #[test]
    fn hopeless_input_fails_with_typed_error() {
        let failure = FallbackStrategy.parse(&TemporalInput::Text("certainly not temporal".into()), &ctx()).unwrap_err();
        assert_eq!(failure.error.code(), Some(ErrorCode::FallbackParse));
    }
}
