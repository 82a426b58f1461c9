//! Already-canonical values and canonical-like field bags.
//!
//! A [`CanonicalDateTime`] input is a passthrough (re-zoned when the context
//! demands it). A [`DateTimeFields`] bag is rebuilt from its wall-clock
//! fields, with zone precedence: an explicitly-set context zone overrides the
//! zone the bag claims for itself.

use crate::error::{ErrorCode, TemporalError};
use crate::patterns::{confidence, priority};
use crate::strategy::{
    FastPath, Normalized, ParseContext, ParseFailure, ParseStrategy, ParseSuccess, Validation, run_timed,
};
use crate::{DateTimeFields, StrategyKind, TemporalInput};

use super::common::fields_to_canonical;

fn field_errors(f: &DateTimeFields) -> Vec<String> {
    let mut errors = Vec::new();
    if !(1..=12).contains(&f.month) {
        errors.push(format!("month out of range: {}", f.month));
    } else if chrono::NaiveDate::from_ymd_opt(f.year, f.month, f.day).is_none() {
        errors.push(format!("invalid calendar date: {:04}-{:02}-{:02}", f.year, f.month, f.day));
    }
    if f.hour > 23 {
        errors.push(format!("hour out of range: {}", f.hour));
    }
    if f.minute > 59 {
        errors.push(format!("minute out of range: {}", f.minute));
    }
    if f.second > 59 {
        errors.push(format!("second out of range: {}", f.second));
    }
    if f.nanosecond >= 1_000_000_000 {
        errors.push(format!("nanosecond out of range: {}", f.nanosecond));
    }
    errors
}

pub struct CanonicalLikeStrategy;

impl ParseStrategy for CanonicalLikeStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::CanonicalLike
    }

    fn priority(&self) -> u16 {
        priority::CANONICAL_LIKE
    }

    fn can_handle(&self, input: &TemporalInput, _ctx: &ParseContext) -> bool {
        matches!(input, TemporalInput::Canonical(_) | TemporalInput::Fields(_))
    }

    fn confidence(&self, input: &TemporalInput, _ctx: &ParseContext) -> f64 {
        match input {
            TemporalInput::Canonical(_) => confidence::EXACT,
            TemporalInput::Fields(f) => {
                if field_errors(f).is_empty() { confidence::STRUCTURED } else { confidence::INVALID }
            }
            _ => confidence::NONE,
        }
    }

    fn validate(&self, input: &TemporalInput, ctx: &ParseContext) -> Validation {
        match input {
            TemporalInput::Canonical(_) => Validation::valid(confidence::EXACT),
            TemporalInput::Fields(f) => {
                let errors = field_errors(f);
                if !errors.is_empty() {
                    let mut v = Validation::invalid(errors[0].clone());
                    v.errors = errors;
                    return v;
                }
                let mut v = Validation::valid(confidence::STRUCTURED);
                if f.time_zone.is_some() && ctx.zone_was_explicit {
                    v = v.with_warning("input timezone overridden by the context timezone");
                }
                v
            }
            _ => Validation::invalid("not a canonical-like input"),
        }
    }

    fn normalize(&self, input: &TemporalInput, ctx: &ParseContext) -> Normalized {
        // Record the zone override here so the transform trail shows it even
        // when the fast path does the actual conversion.
        if let TemporalInput::Fields(f) = input {
            if f.time_zone.is_some() && ctx.zone_was_explicit {
                let mut stripped = f.clone();
                stripped.time_zone = None;
                return Normalized::rewritten(TemporalInput::Fields(stripped), "zone-override");
            }
        }
        Normalized::unchanged(input.clone())
    }

    fn check_fast_path(&self, input: &TemporalInput, ctx: &ParseContext) -> FastPath {
        // A canonical input already in the target zone needs no work at all.
        if let TemporalInput::Canonical(dt) = input {
            if !ctx.zone_was_explicit || dt.zone() == ctx.zone {
                return FastPath::hit(dt.clone(), confidence::EXACT);
            }
            return FastPath::hit(dt.in_zone(ctx.zone), confidence::EXACT);
        }
        FastPath::miss()
    }

    fn parse(&self, input: &TemporalInput, ctx: &ParseContext) -> Result<ParseSuccess, ParseFailure> {
        let input = input.clone();
        let ctx = ctx.clone();
        run_timed(StrategyKind::CanonicalLike, move || {
            let desc = input.describe();
            match input {
                TemporalInput::Canonical(dt) => {
                    let dt = if ctx.zone_was_explicit { dt.in_zone(ctx.zone) } else { dt };
                    Ok((dt, confidence::EXACT))
                }
                TemporalInput::Fields(f) => fields_to_canonical(&f, &ctx)
                    .map(|(dt, _)| (dt, confidence::STRUCTURED))
                    .map_err(|e| TemporalError::strategy(ErrorCode::FieldsParse, e.to_string(), desc)),
                _ => Err(TemporalError::strategy(ErrorCode::FieldsParse, "not a canonical-like input", desc)),
            }
        })
    }
}
