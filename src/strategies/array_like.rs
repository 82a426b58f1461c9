//! Numeric component arrays: `[year, month, day, hour, minute, second,
//! millisecond]`, month 1-based, trailing components optional.

use crate::patterns::{confidence, priority};
use crate::strategy::{
    Normalized, ParseContext, ParseFailure, ParseStrategy, ParseSuccess, Validation, run_timed,
};
use crate::{StrategyKind, TemporalInput};
use crate::error::{ErrorCode, TemporalError};

use super::common::components_to_canonical;

/// Per-slot inclusive bounds (year is unchecked here; the calendar check in
/// conversion covers it).
const SLOT_BOUNDS: [(f64, f64, &str); 6] = [
    (1.0, 12.0, "month"),
    (1.0, 31.0, "day"),
    (0.0, 23.0, "hour"),
    (0.0, 59.0, "minute"),
    (0.0, 59.0, "second"),
    (0.0, 999.0, "millisecond"),
];

fn component_errors(parts: &[f64]) -> Vec<String> {
    let mut errors = Vec::new();
    if parts.is_empty() {
        errors.push("component array is empty".to_string());
        return errors;
    }
    if parts.len() > 7 {
        errors.push(format!("too many components: {}", parts.len()));
    }
    for (i, part) in parts.iter().enumerate() {
        if !part.is_finite() || part.fract() != 0.0 {
            errors.push(format!("non-integral component at index {i}: {part}"));
        } else if i >= 1 {
            if let Some((lo, hi, name)) = SLOT_BOUNDS.get(i - 1) {
                if part < lo || part > hi {
                    errors.push(format!("{name} out of range: {part}"));
                }
            }
        }
    }
    errors
}

pub struct ArrayLikeStrategy;

impl ParseStrategy for ArrayLikeStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::ArrayLike
    }

    fn priority(&self) -> u16 {
        priority::ARRAY_LIKE
    }

    fn can_handle(&self, input: &TemporalInput, _ctx: &ParseContext) -> bool {
        matches!(input, TemporalInput::Components(_))
    }

    fn confidence(&self, input: &TemporalInput, _ctx: &ParseContext) -> f64 {
        match input {
            TemporalInput::Components(parts) => {
                if component_errors(parts).is_empty() { confidence::STRUCTURED } else { confidence::INVALID }
            }
            _ => confidence::NONE,
        }
    }

    fn validate(&self, input: &TemporalInput, _ctx: &ParseContext) -> Validation {
        let TemporalInput::Components(parts) = input else {
            return Validation::invalid("not a component array");
        };
        let errors = component_errors(parts);
        if errors.is_empty() {
            let mut v = Validation::valid(confidence::STRUCTURED);
            if parts.len() < 3 {
                v = v.with_warning("missing components default to the start of their unit");
            }
            v
        } else {
            let mut v = Validation::invalid(errors[0].clone());
            v.errors = errors;
            v
        }
    }

    fn normalize(&self, input: &TemporalInput, _ctx: &ParseContext) -> Normalized {
        // Pad to the full seven components so downstream conversion and cache
        // fingerprints see one canonical shape.
        if let TemporalInput::Components(parts) = input {
            if parts.len() < 7 && !parts.is_empty() {
                let mut padded = parts.clone();
                while padded.len() < 7 {
                    padded.push(if padded.len() < 3 { 1.0 } else { 0.0 });
                }
                return Normalized::rewritten(TemporalInput::Components(padded), "pad-components");
            }
        }
        Normalized::unchanged(input.clone())
    }

    fn parse(&self, input: &TemporalInput, ctx: &ParseContext) -> Result<ParseSuccess, ParseFailure> {
        let input = input.clone();
        let zone = ctx.zone;
        run_timed(StrategyKind::ArrayLike, move || {
            let desc = input.describe();
            let TemporalInput::Components(parts) = input else {
                return Err(TemporalError::strategy(ErrorCode::ArrayParse, "not a component array", desc));
            };
            components_to_canonical(&parts, zone)
                .map(|dt| (dt, confidence::STRUCTURED))
                .map_err(|e| TemporalError::strategy(ErrorCode::ArrayParse, e.to_string(), desc))
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
    fn full_component_array_parses() {
        let input = TemporalInput::Components(vec![2023.0, 12.0, 25.0, 10.0, 30.0, 0.0, 0.0]);
        let out = ArrayLikeStrategy.parse(&input, &ctx()).unwrap();
        assert_eq!((out.data.year(), out.data.month(), out.data.day(), out.data.hour()), (2023, 12, 25, 10));
    }

    #[test]
    fn validation_names_the_offending_slot() {
        let input = TemporalInput::Components(vec![2023.0, 13.0, 1.0]);
        let v = ArrayLikeStrategy.validate(&input, &ctx());
        assert!(!v.is_valid);
        assert!(v.errors[0].contains("month"));
    }

    #[test]
    fn leap_day_component_arrays() {
        let bad = TemporalInput::Components(vec![2023.0, 2.0, 29.0]);
        assert!(ArrayLikeStrategy.parse(&bad, &ctx()).is_err());
        let good = TemporalInput::Components(vec![2024.0, 2.0, 29.0]);
        assert!(ArrayLikeStrategy.parse(&good, &ctx()).is_ok());
    }

    #[test]
    fn normalize_pads_to_seven() {
        let n = ArrayLikeStrategy.normalize(&TemporalInput::Components(vec![2023.0, 12.0]), &ctx());
        assert_eq!(n.applied, vec!["pad-components"]);
        let TemporalInput::Components(parts) = n.input else { panic!("expected components") };
        assert_eq!(parts, vec![2023.0, 12.0, 1.0, 0.0, 0.0, 0.0, 0.0]);
    }
}
