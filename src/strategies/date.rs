//! Native chrono datetime values.
//!
//! `DateTime<Utc>` and `DateTime<FixedOffset>` are exact instants, so the
//! fast path converts them directly. Naive wall-clock values take the full
//! path: they must be combined with the context timezone, which can fail in
//! a DST gap.

use crate::canonical::CanonicalDateTime;
use crate::error::{ErrorCode, TemporalError};
use crate::patterns::{confidence, priority};
use crate::strategy::{
    FastPath, ParseContext, ParseFailure, ParseStrategy, ParseSuccess, Validation, run_timed,
};
use crate::{StrategyKind, TemporalInput};

pub struct DateStrategy;

impl ParseStrategy for DateStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Date
    }

    fn priority(&self) -> u16 {
        priority::DATE
    }

    fn can_handle(&self, input: &TemporalInput, _ctx: &ParseContext) -> bool {
        matches!(input, TemporalInput::Utc(_) | TemporalInput::Fixed(_) | TemporalInput::Naive(_))
    }

    fn confidence(&self, input: &TemporalInput, _ctx: &ParseContext) -> f64 {
        match input {
            TemporalInput::Utc(_) | TemporalInput::Fixed(_) | TemporalInput::Naive(_) => confidence::NATIVE_DATE,
            _ => confidence::NONE,
        }
    }

    fn validate(&self, input: &TemporalInput, _ctx: &ParseContext) -> Validation {
        match input {
            TemporalInput::Utc(_) | TemporalInput::Fixed(_) => Validation::valid(confidence::NATIVE_DATE),
            TemporalInput::Naive(_) => Validation::valid(confidence::NATIVE_DATE)
                .with_warning("naive datetime; interpreting in the context timezone"),
            _ => Validation::invalid("not a native datetime input"),
        }
    }

    fn check_fast_path(&self, input: &TemporalInput, ctx: &ParseContext) -> FastPath {
        match input {
            TemporalInput::Utc(dt) => {
                FastPath::hit(CanonicalDateTime::from_utc(*dt, ctx.zone), confidence::NATIVE_DATE)
            }
            TemporalInput::Fixed(dt) => {
                FastPath::hit(CanonicalDateTime::from_fixed(*dt, ctx.zone), confidence::NATIVE_DATE)
            }
            _ => FastPath::miss(),
        }
    }

    fn parse(&self, input: &TemporalInput, ctx: &ParseContext) -> Result<ParseSuccess, ParseFailure> {
        let input = input.clone();
        let zone = ctx.zone;
        run_timed(StrategyKind::Date, move || {
            let desc = input.describe();
            let dt = match input {
                TemporalInput::Utc(dt) => CanonicalDateTime::from_utc(dt, zone),
                TemporalInput::Fixed(dt) => CanonicalDateTime::from_fixed(dt, zone),
                TemporalInput::Naive(naive) => CanonicalDateTime::from_local(naive, zone)
                    .map_err(|e| TemporalError::strategy(ErrorCode::DateParse, e.to_string(), desc.clone()))?,
                _ => return Err(TemporalError::strategy(ErrorCode::DateParse, "not a native datetime input", desc)),
            };
            Ok((dt, confidence::NATIVE_DATE))
        })
    }
}
