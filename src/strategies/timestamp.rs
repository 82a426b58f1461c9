//! Seconds+nanoseconds timestamp structures (the shape Firestore-style
//! timestamps serialize to).

use crate::canonical::CanonicalDateTime;
use crate::error::{ErrorCode, TemporalError};
use crate::patterns::{confidence, priority};
use crate::strategy::{
    FastPath, ParseContext, ParseFailure, ParseStrategy, ParseSuccess, Validation, run_timed,
};
use crate::{StrategyKind, TemporalInput};

use super::common::timestamp_to_canonical;

pub struct TimestampStrategy;

impl ParseStrategy for TimestampStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Timestamp
    }

    fn priority(&self) -> u16 {
        priority::TIMESTAMP
    }

    fn can_handle(&self, input: &TemporalInput, _ctx: &ParseContext) -> bool {
        matches!(input, TemporalInput::Timestamp { .. })
    }

    fn confidence(&self, input: &TemporalInput, _ctx: &ParseContext) -> f64 {
        match input {
            TemporalInput::Timestamp { nanoseconds, .. } => {
                if *nanoseconds < 1_000_000_000 { confidence::STRUCTURED } else { confidence::INVALID }
            }
            _ => confidence::NONE,
        }
    }

    fn validate(&self, input: &TemporalInput, _ctx: &ParseContext) -> Validation {
        let TemporalInput::Timestamp { seconds, nanoseconds } = input else {
            return Validation::invalid("not a timestamp structure");
        };
        if *nanoseconds >= 1_000_000_000 {
            return Validation::invalid(format!("nanoseconds component out of range: {nanoseconds}"));
        }
        if chrono::DateTime::from_timestamp(*seconds, *nanoseconds).is_none() {
            return Validation::invalid(format!("seconds component out of range: {seconds}"));
        }
        Validation::valid(confidence::STRUCTURED)
    }

    fn check_fast_path(&self, input: &TemporalInput, ctx: &ParseContext) -> FastPath {
        if let TemporalInput::Timestamp { seconds, nanoseconds } = input {
            if let Ok(dt) = timestamp_to_canonical(*seconds, *nanoseconds, ctx.zone) {
                return FastPath::hit(dt, confidence::STRUCTURED);
            }
        }
        FastPath::miss()
    }

    fn parse(&self, input: &TemporalInput, ctx: &ParseContext) -> Result<ParseSuccess, ParseFailure> {
        let input = input.clone();
        let zone = ctx.zone;
        run_timed(StrategyKind::Timestamp, move || {
            let desc = input.describe();
            let TemporalInput::Timestamp { seconds, nanoseconds } = input else {
                return Err(TemporalError::strategy(ErrorCode::TimestampParse, "not a timestamp structure", desc));
            };
            timestamp_to_canonical(seconds, nanoseconds, zone)
                .map(|dt| (dt, confidence::STRUCTURED))
                .map_err(|e| TemporalError::strategy(ErrorCode::TimestampParse, e.to_string(), desc))
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
    fn seconds_and_nanos_convert_exactly() {
        let input = TemporalInput::Timestamp { seconds: 1_703_505_000, nanoseconds: 500_000_000 };
        let out = TimestampStrategy.parse(&input, &ctx()).unwrap();
        assert_eq!((out.data.year(), out.data.month(), out.data.day()), (2023, 12, 25));
        assert_eq!(out.data.millisecond(), 500);
    }

    #[test]
    fn nanosecond_overflow_is_rejected() {
        let input = TemporalInput::Timestamp { seconds: 0, nanoseconds: 1_000_000_000 };
        assert!(!TimestampStrategy.validate(&input, &ctx()).is_valid);
        let failure = TimestampStrategy.parse(&input, &ctx()).unwrap_err();
        assert_eq!(failure.error.code(), Some(ErrorCode::TimestampParse));
    }

    #[test]
    fn fast_path_converts_valid_structures() {
        let input = TemporalInput::Timestamp { seconds: 0, nanoseconds: 0 };
        let fp = TimestampStrategy.check_fast_path(&input, &ctx());
        assert!(fp.usable);
        assert_eq!(fp.data.unwrap().epoch_millis(), 0);

        let bad = TemporalInput::Timestamp { seconds: 0, nanoseconds: 2_000_000_000 };
        assert!(!TimestampStrategy.check_fast_path(&bad, &ctx()).usable);
    }
}
