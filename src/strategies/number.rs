//! Bare epoch numbers.
//!
//! A bare integer is ambiguous between seconds and milliseconds. The
//! classification ladder, applied in order:
//!
//! 1. Representable only one way → that way.
//! 2. Seconds reading lands past ~2100 → milliseconds.
//! 3. Magnitude above 1e11 → milliseconds.
//! 4. Millisecond reading lands in the modern window [1970, 2010] while the
//!    seconds reading is implausible → milliseconds.
//! 5. Otherwise → seconds, at reduced confidence.
//!
//! Floats within 1e-9 of an integer are snapped to that integer first
//! (serialization noise); other fractional values are read as seconds with a
//! sub-second part.

use chrono::{Datelike, TimeZone, Utc};

use crate::canonical::CanonicalDateTime;
use crate::error::{ErrorCode, TemporalError};
use crate::patterns::{confidence, priority};
use crate::strategy::{
    FastPath, Normalized, ParseContext, ParseFailure, ParseStrategy, ParseSuccess, Validation, run_timed,
};
use crate::{StrategyKind, TemporalInput};

/// Seconds interpretations past this year are not real seconds timestamps.
const MAX_PLAUSIBLE_SECONDS_YEAR: i32 = 2100;
/// Above this magnitude a structurally-valid-both-ways value reads as millis.
const MILLIS_MAGNITUDE_FLOOR: u64 = 100_000_000_000;
/// The modern-era millisecond window.
const MS_WINDOW_MIN_YEAR: i32 = 1970;
const MS_WINDOW_MAX_YEAR: i32 = 2010;
/// Floats closer than this to an integer are treated as that integer.
const INTEGER_SNAP_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EpochUnit {
    Seconds,
    Milliseconds,
}

impl EpochUnit {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            EpochUnit::Seconds => "seconds",
            EpochUnit::Milliseconds => "milliseconds",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct EpochClassification {
    pub millis: i64,
    pub unit: EpochUnit,
    pub confidence: f64,
    pub ambiguous: bool,
}

/// Classify a raw numeric input per the ladder above.
pub(crate) fn classify_epoch(value: f64) -> Result<EpochClassification, TemporalError> {
    if !value.is_finite() {
        return Err(TemporalError::InvalidDatetime(format!("non-finite epoch value: {value}")));
    }

    let snapped = value.round();
    if (value - snapped).abs() > INTEGER_SNAP_EPSILON {
        // Fractional epoch: read as seconds with a sub-second part.
        let millis = value * 1000.0;
        if millis.abs() > i64::MAX as f64 {
            return Err(TemporalError::InvalidDatetime(format!("epoch value out of range: {value}")));
        }
        return Ok(EpochClassification {
            millis: millis.round() as i64,
            unit: EpochUnit::Seconds,
            confidence: confidence::EPOCH_AMBIGUOUS,
            ambiguous: true,
        });
    }
    if snapped.abs() > i64::MAX as f64 {
        return Err(TemporalError::InvalidDatetime(format!("epoch value out of range: {value}")));
    }
    let v = snapped as i64;

    let as_seconds = Utc.timestamp_opt(v, 0).single();
    let as_millis = Utc.timestamp_millis_opt(v).single();

    match (as_seconds, as_millis) {
        (None, None) => Err(TemporalError::InvalidDatetime(format!("epoch value out of range: {v}"))),
        (None, Some(_)) => Ok(EpochClassification {
            millis: v,
            unit: EpochUnit::Milliseconds,
            confidence: confidence::EPOCH_NUMBER,
            ambiguous: false,
        }),
        (Some(_), None) => seconds_classification(v, false),
        (Some(sec_dt), Some(ms_dt)) => {
            if prefer_millis(v, sec_dt.year(), ms_dt.year()) {
                Ok(EpochClassification {
                    millis: v,
                    unit: EpochUnit::Milliseconds,
                    confidence: confidence::EPOCH_NUMBER,
                    ambiguous: false,
                })
            } else {
                seconds_classification(v, true)
            }
        }
    }
}

fn seconds_classification(v: i64, ambiguous: bool) -> Result<EpochClassification, TemporalError> {
    let millis = v
        .checked_mul(1000)
        .ok_or_else(|| TemporalError::InvalidDatetime(format!("epoch seconds out of range: {v}")))?;
    Ok(EpochClassification {
        millis,
        unit: EpochUnit::Seconds,
        confidence: if ambiguous { confidence::EPOCH_AMBIGUOUS } else { confidence::EPOCH_NUMBER },
        ambiguous,
    })
}

fn prefer_millis(v: i64, sec_year: i32, ms_year: i32) -> bool {
    if sec_year > MAX_PLAUSIBLE_SECONDS_YEAR {
        return true;
    }
    if v.unsigned_abs() > MILLIS_MAGNITUDE_FLOOR {
        return true;
    }
    (MS_WINDOW_MIN_YEAR..=MS_WINDOW_MAX_YEAR).contains(&ms_year)
        && !(MS_WINDOW_MIN_YEAR..=MAX_PLAUSIBLE_SECONDS_YEAR).contains(&sec_year)
}

pub struct NumberStrategy;

impl ParseStrategy for NumberStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Number
    }

    fn priority(&self) -> u16 {
        priority::NUMBER
    }

    fn can_handle(&self, input: &TemporalInput, _ctx: &ParseContext) -> bool {
        matches!(input, TemporalInput::Number(_))
    }

    fn confidence(&self, input: &TemporalInput, _ctx: &ParseContext) -> f64 {
        match input {
            TemporalInput::Number(n) => match classify_epoch(*n) {
                Ok(c) => c.confidence,
                Err(_) => confidence::INVALID,
            },
            _ => confidence::NONE,
        }
    }

    fn validate(&self, input: &TemporalInput, _ctx: &ParseContext) -> Validation {
        let TemporalInput::Number(n) = input else {
            return Validation::invalid("not a numeric input");
        };
        match classify_epoch(*n) {
            Ok(c) => {
                let mut v = Validation::valid(c.confidence);
                if c.ambiguous {
                    v = v.with_warning(format!("epoch unit inferred as {}", c.unit.as_str()));
                }
                v
            }
            Err(e) => Validation::invalid(e.to_string()),
        }
    }

    fn normalize(&self, input: &TemporalInput, _ctx: &ParseContext) -> Normalized {
        if let TemporalInput::Number(n) = input {
            let snapped = n.round();
            if *n != snapped && (n - snapped).abs() <= INTEGER_SNAP_EPSILON {
                return Normalized::rewritten(TemporalInput::Number(snapped), "snap-integer");
            }
        }
        Normalized::unchanged(input.clone())
    }

    fn check_fast_path(&self, input: &TemporalInput, ctx: &ParseContext) -> FastPath {
        // Only unambiguous millisecond magnitudes take the shortcut.
        if let TemporalInput::Number(n) = input {
            if n.fract() == 0.0 && n.abs() > MILLIS_MAGNITUDE_FLOOR as f64 && n.abs() <= i64::MAX as f64 {
                if let Ok(dt) = CanonicalDateTime::from_epoch_millis(*n as i64, ctx.zone) {
                    return FastPath::hit(dt, confidence::EPOCH_NUMBER);
                }
            }
        }
        FastPath::miss()
    }

    fn parse(&self, input: &TemporalInput, ctx: &ParseContext) -> Result<ParseSuccess, ParseFailure> {
        let input = input.clone();
        let zone = ctx.zone;
        run_timed(StrategyKind::Number, move || {
            let desc = input.describe();
            let TemporalInput::Number(n) = input else {
                return Err(TemporalError::strategy(ErrorCode::NumberParse, "not a numeric input", desc));
            };
            let class = classify_epoch(n).map_err(|e| {
                TemporalError::strategy(ErrorCode::NumberParse, e.to_string(), n.to_string())
            })?;
            let dt = CanonicalDateTime::from_epoch_millis(class.millis, zone).map_err(|e| {
                TemporalError::strategy_in(ErrorCode::NumberParse, e.to_string(), n.to_string(), class.unit.as_str())
            })?;
            Ok((dt, class.confidence))
        })
    }
}
