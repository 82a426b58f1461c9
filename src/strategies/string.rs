//! String inputs: ISO 8601 forms, relative keywords, numeric timestamp
//! strings, month-name dates, and loose slash/dash/dot formats.
//!
//! Conversion order for the authoritative path:
//!
//! ```text
//! keyword ─▶ ISO + offset ─▶ ISO local (combined in the target zone) ─▶
//! date-only ─▶ time-of-day (anchored to the reference date) ─▶
//! numeric string ─▶ month-name ─▶ slash/dash ─▶ offset recovery ─▶
//! lenient format ladder
//! ```
//!
//! The validation layer range-checks fields itself (month 1–12, real
//! calendar days including leap-day handling, hour/minute/second bounds)
//! instead of trusting downstream parsers to reject what they might silently
//! roll forward.

use chrono::NaiveDate;
use chrono_tz::Tz;

use super::common::{self, naive_from_iso_captures};
use super::number::classify_epoch;
use crate::canonical::CanonicalDateTime;
use crate::error::{ErrorCode, TemporalError};
use crate::patterns::{self, InputSignals, confidence, priority};
use crate::strategy::{
    Complexity, FastPath, Hints, Normalized, ParseContext, ParseFailure, ParseStrategy, ParseSuccess,
    Validation, run_timed,
};
use crate::{StrategyKind, TemporalInput};

/// Recognized string shapes, cheapest checks first.
#[derive(Debug, Clone, PartialEq)]
enum TextShape {
    Keyword(String),
    IsoOffset,
    IsoLocal,
    IsoDateOnly,
    TimeOfDay,
    NumericString,
    MonthName,
    SlashDate,
    Unrecognized,
}

fn classify_text(trimmed: &str) -> TextShape {
    let signals = patterns::scan(trimmed);
    if signals.contains(InputSignals::KEYWORDISH) {
        return TextShape::Keyword(trimmed.to_ascii_lowercase());
    }
    if signals.contains(InputSignals::NUMERIC_ONLY) {
        return TextShape::NumericString;
    }
    if patterns::ISO_WITH_OFFSET.is_match(trimmed) {
        return TextShape::IsoOffset;
    }
    if patterns::ISO_LOCAL.is_match(trimmed) {
        return TextShape::IsoLocal;
    }
    if patterns::ISO_DATE_ONLY.is_match(trimmed) {
        return TextShape::IsoDateOnly;
    }
    if patterns::TIME_OF_DAY.is_match(trimmed) {
        return TextShape::TimeOfDay;
    }
    if patterns::MONTH_NAME_DATE.is_match(trimmed) {
        return TextShape::MonthName;
    }
    if patterns::SLASH_DATE.is_match(trimmed) {
        return TextShape::SlashDate;
    }
    TextShape::Unrecognized
}

fn shape_confidence(shape: &TextShape) -> f64 {
    match shape {
        TextShape::Keyword(_) => confidence::ISO_LOCAL,
        TextShape::IsoOffset => confidence::ISO_OFFSET,
        TextShape::IsoLocal => confidence::ISO_LOCAL,
        TextShape::IsoDateOnly => confidence::ISO_DATE_ONLY,
        TextShape::TimeOfDay => confidence::EPOCH_AMBIGUOUS,
        TextShape::NumericString => confidence::EPOCH_AMBIGUOUS,
        TextShape::MonthName => confidence::MONTH_NAME,
        TextShape::SlashDate => confidence::LOOSE_DATE,
        TextShape::Unrecognized => confidence::UNRECOGNIZED,
    }
}

/// Explicit field range checks, producing one message per violation.
fn civil_field_errors(year: i32, month: u32, day: u32, hour: u32, minute: u32, second: u32) -> Vec<String> {
    let mut errors = Vec::new();
    if !(1..=12).contains(&month) {
        errors.push(format!("month out of range: {month}"));
    } else if NaiveDate::from_ymd_opt(year, month, day).is_none() {
        errors.push(format!("invalid calendar date: {year:04}-{month:02}-{day:02}"));
    }
    if hour > 23 {
        errors.push(format!("hour out of range: {hour}"));
    }
    if minute > 59 {
        errors.push(format!("minute out of range: {minute}"));
    }
    if second > 59 {
        errors.push(format!("second out of range: {second}"));
    }
    errors
}

fn iso_capture_errors(caps: &regex::Captures<'_>) -> Vec<String> {
    let get = |i: usize| caps.get(i).map(|m| m.as_str().parse::<u32>().unwrap_or(u32::MAX));
    let year = caps.get(1).and_then(|m| m.as_str().parse::<i32>().ok()).unwrap_or(0);
    civil_field_errors(
        year,
        get(2).unwrap_or(0),
        get(3).unwrap_or(0),
        get(4).unwrap_or(0),
        get(5).unwrap_or(0),
        get(6).unwrap_or(0),
    )
}

/// Month-name lookup ("jan" ..= "december").
fn month_number(name: &str) -> Option<u32> {
    const MONTHS: &[&str] = &[
        "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
    ];
    let prefix = name.get(..3)?.to_ascii_lowercase();
    MONTHS.iter().position(|m| **m == prefix).map(|i| i as u32 + 1)
}

/// Anchor a bare time of day to the reference date in the target zone.
fn anchor_time_of_day(
    caps: &regex::Captures<'_>,
    ctx: &ParseContext,
) -> Result<CanonicalDateTime, TemporalError> {
    let hour: u32 = caps.get(1).and_then(|m| m.as_str().parse().ok()).unwrap_or(u32::MAX);
    let minute: u32 = caps.get(2).and_then(|m| m.as_str().parse().ok()).unwrap_or(u32::MAX);
    let second: u32 = caps.get(3).map_or(Ok(0), |m| m.as_str().parse()).unwrap_or(u32::MAX);
    let nanos = caps.get(4).and_then(|m| common::fraction_nanos(m.as_str())).unwrap_or(0);
    let anchor = &ctx.reference;
    CanonicalDateTime::from_civil(anchor.year(), anchor.month(), anchor.day(), hour, minute, second, nanos, ctx.zone)
}

fn slash_date_to_canonical(caps: &regex::Captures<'_>, zone: Tz) -> Result<CanonicalDateTime, TemporalError> {
    let a = &caps[1];
    let b: u32 = caps[2].parse().map_err(|_| TemporalError::InvalidDatetime(caps[0].to_string()))?;
    let c = &caps[3];

    let (year, month, day) = if a.len() == 4 {
        // Y-M-D
        (a.parse::<i32>().unwrap_or(0), b, c.parse::<u32>().unwrap_or(0))
    } else {
        let year = if c.len() == 4 {
            c.parse::<i32>().unwrap_or(0)
        } else {
            // Two-digit year: pivot at 70.
            let yy = c.parse::<i32>().unwrap_or(0);
            if yy < 70 { 2000 + yy } else { 1900 + yy }
        };
        let first: u32 = a.parse().unwrap_or(0);
        // Month-first unless that reading is impossible.
        if first <= 12 { (year, first, b) } else { (year, b, first) }
    };

    CanonicalDateTime::from_civil(year, month, day, 0, 0, 0, 0, zone)
}

fn month_name_to_canonical(caps: &regex::Captures<'_>, zone: Tz) -> Result<CanonicalDateTime, TemporalError> {
    let month = caps
        .get(2)
        .and_then(|m| month_number(m.as_str()))
        .ok_or_else(|| TemporalError::InvalidDatetime(caps[0].to_string()))?;
    let day: u32 = caps
        .get(1)
        .or_else(|| caps.get(3))
        .map_or(Ok(1), |m| m.as_str().parse())
        .map_err(|_| TemporalError::InvalidDatetime(caps[0].to_string()))?;
    let year: i32 = caps
        .get(4)
        .and_then(|m| m.as_str().parse().ok())
        .ok_or_else(|| TemporalError::InvalidDatetime(caps[0].to_string()))?;
    CanonicalDateTime::from_civil(year, month, day, 0, 0, 0, 0, zone)
}

/// The ordered string→canonical conversion chain.
fn text_to_canonical(raw: &str, ctx: &ParseContext) -> Result<(CanonicalDateTime, f64), TemporalError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(TemporalError::strategy(ErrorCode::StringParse, "empty input", raw));
    }
    let shape = classify_text(trimmed);
    let conf = shape_confidence(&shape);
    let fail = |message: String| TemporalError::strategy(ErrorCode::StringParse, message, trimmed);

    match shape {
        TextShape::Keyword(word) => common::resolve_keyword(&word, ctx)?
            .map(|dt| (dt, conf))
            .ok_or_else(|| fail(format!("unknown keyword: {word}"))),
        TextShape::IsoOffset => {
            let caps = patterns::ISO_WITH_OFFSET.captures(trimmed).ok_or_else(|| fail("iso shape vanished".into()))?;
            let naive = naive_from_iso_captures(&caps).ok_or_else(|| fail(format!("invalid datetime fields: {trimmed}")))?;
            let offset = caps
                .get(8)
                .and_then(|m| common::parse_offset(m.as_str()))
                .ok_or_else(|| fail(format!("invalid offset in: {trimmed}")))?;
            let fixed = chrono::TimeZone::from_local_datetime(&offset, &naive)
                .single()
                .ok_or_else(|| fail(format!("unrepresentable instant: {trimmed}")))?;
            Ok((CanonicalDateTime::from_fixed(fixed, ctx.zone), conf))
        }
        TextShape::IsoLocal => {
            let caps = patterns::ISO_LOCAL.captures(trimmed).ok_or_else(|| fail("iso shape vanished".into()))?;
            let naive = naive_from_iso_captures(&caps).ok_or_else(|| fail(format!("invalid datetime fields: {trimmed}")))?;
            let dt = CanonicalDateTime::from_local(naive, ctx.zone).map_err(|e| fail(e.to_string()))?;
            Ok((dt, conf))
        }
        TextShape::IsoDateOnly => {
            let caps = patterns::ISO_DATE_ONLY.captures(trimmed).ok_or_else(|| fail("iso shape vanished".into()))?;
            let year: i32 = caps[1].parse().map_err(|_| fail(format!("invalid year: {}", &caps[1])))?;
            let month: u32 = caps[2].parse().map_err(|_| fail(format!("invalid month: {}", &caps[2])))?;
            let day: u32 = caps[3].parse().map_err(|_| fail(format!("invalid day: {}", &caps[3])))?;
            let dt = CanonicalDateTime::from_civil(year, month, day, 0, 0, 0, 0, ctx.zone)
                .map_err(|e| fail(e.to_string()))?;
            Ok((dt, conf))
        }
        TextShape::TimeOfDay => {
            let caps = patterns::TIME_OF_DAY.captures(trimmed).ok_or_else(|| fail("time shape vanished".into()))?;
            let dt = anchor_time_of_day(&caps, ctx).map_err(|e| fail(e.to_string()))?;
            Ok((dt, conf))
        }
        TextShape::NumericString => {
            let value: f64 = trimmed.parse().map_err(|_| fail(format!("invalid numeric string: {trimmed}")))?;
            let class = classify_epoch(value).map_err(|e| fail(e.to_string()))?;
            let dt = CanonicalDateTime::from_epoch_millis(class.millis, ctx.zone)
                .map_err(|e| fail(e.to_string()))?;
            Ok((dt, class.confidence))
        }
        TextShape::MonthName => {
            let caps = patterns::MONTH_NAME_DATE.captures(trimmed).ok_or_else(|| fail("month shape vanished".into()))?;
            let dt = month_name_to_canonical(&caps, ctx.zone).map_err(|e| fail(e.to_string()))?;
            Ok((dt, conf))
        }
        TextShape::SlashDate => {
            let caps = patterns::SLASH_DATE.captures(trimmed).ok_or_else(|| fail("slash shape vanished".into()))?;
            let dt = slash_date_to_canonical(&caps, ctx.zone).map_err(|e| fail(e.to_string()))?;
            Ok((dt, conf))
        }
        TextShape::Unrecognized => recover_with_offset(trimmed, ctx)
            .map(|dt| (dt, confidence::UNRECOGNIZED))
            .ok_or_else(|| fail(format!("unrecognized datetime format: {trimmed}"))),
    }
}

/// Last-ditch recovery: extract a trailing offset the shape patterns did not
/// account for, parse the remainder as a local datetime, and recombine.
fn recover_with_offset(trimmed: &str, ctx: &ParseContext) -> Option<CanonicalDateTime> {
    if let Ok(fixed) = chrono::DateTime::parse_from_rfc3339(trimmed) {
        return Some(CanonicalDateTime::from_fixed(fixed, ctx.zone));
    }
    let caps = patterns::OFFSET_SUFFIX.captures(trimmed)?;
    let offset = common::parse_offset(caps.get(1)?.as_str())?;
    let body = trimmed[..caps.get(1)?.start()].trim();
    let naive = patterns::ISO_LOCAL
        .captures(body)
        .as_ref()
        .and_then(naive_from_iso_captures)?;
    let fixed = chrono::TimeZone::from_local_datetime(&offset, &naive).single()?;
    Some(CanonicalDateTime::from_fixed(fixed, ctx.zone))
}

pub struct StringStrategy;

impl ParseStrategy for StringStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Text
    }

    fn priority(&self) -> u16 {
        priority::TEXT
    }

    fn can_handle(&self, input: &TemporalInput, _ctx: &ParseContext) -> bool {
        matches!(input, TemporalInput::Text(_))
    }

    fn confidence(&self, input: &TemporalInput, _ctx: &ParseContext) -> f64 {
        match input {
            TemporalInput::Text(s) => shape_confidence(&classify_text(s.trim())),
            _ => confidence::NONE,
        }
    }

    fn validate(&self, input: &TemporalInput, _ctx: &ParseContext) -> Validation {
        let TemporalInput::Text(s) = input else {
            return Validation::invalid("not a string input");
        };
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Validation::invalid("empty input");
        }
        let shape = classify_text(trimmed);
        let conf = shape_confidence(&shape);

        let errors = match &shape {
            TextShape::IsoOffset => {
                patterns::ISO_WITH_OFFSET.captures(trimmed).map(|c| iso_capture_errors(&c)).unwrap_or_default()
            }
            TextShape::IsoLocal => {
                patterns::ISO_LOCAL.captures(trimmed).map(|c| iso_capture_errors(&c)).unwrap_or_default()
            }
            TextShape::IsoDateOnly => patterns::ISO_DATE_ONLY
                .captures(trimmed)
                .map(|c| {
                    civil_field_errors(
                        c[1].parse().unwrap_or(0),
                        c[2].parse().unwrap_or(0),
                        c[3].parse().unwrap_or(0),
                        0,
                        0,
                        0,
                    )
                })
                .unwrap_or_default(),
            TextShape::NumericString => match trimmed.parse::<f64>().map_err(|e| e.to_string()).and_then(|v| {
                classify_epoch(v).map_err(|e| e.to_string())
            }) {
                Ok(_) => Vec::new(),
                Err(e) => vec![e],
            },
            _ => Vec::new(),
        };

        if !errors.is_empty() {
            let mut v = Validation::invalid(errors[0].clone());
            v.errors = errors;
            return v;
        }

        let mut v = Validation::valid(conf);
        if matches!(shape, TextShape::NumericString) {
            v = v.suggesting(StrategyKind::Number);
        }
        if matches!(shape, TextShape::Unrecognized) {
            v = v.with_warning(format!("unrecognized format: {trimmed}"));
        }
        v
    }

    fn normalize(&self, input: &TemporalInput, ctx: &ParseContext) -> Normalized {
        let TemporalInput::Text(s) = input else {
            return Normalized::unchanged(input.clone());
        };
        let trimmed = s.trim();
        let mut normalized = if trimmed == s {
            Normalized::unchanged(TemporalInput::Text(trimmed.to_string()))
        } else {
            Normalized::rewritten(TemporalInput::Text(trimmed.to_string()), "trim")
        };

        match classify_text(trimmed) {
            TextShape::Keyword(word) => {
                // Resolve the keyword now so downstream sees an exact instant.
                if let Ok(Some(dt)) = common::resolve_keyword(&word, ctx) {
                    normalized = Normalized::rewritten(TemporalInput::Text(dt.to_rfc3339()), format!("keyword:{word}"));
                }
            }
            TextShape::NumericString => {
                if let Ok(value) = trimmed.parse::<f64>() {
                    normalized = Normalized::rewritten(TemporalInput::Number(value), "numeric-string");
                }
            }
            TextShape::TimeOfDay => {
                let anchor = &ctx.reference;
                let rewritten = format!(
                    "{:04}-{:02}-{:02}T{}",
                    anchor.year(),
                    anchor.month(),
                    anchor.day(),
                    trimmed
                );
                normalized = Normalized::rewritten(TemporalInput::Text(rewritten), "anchor-date")
            }
            _ => {}
        }

        // Mark the UTC assumption only when the caller has no non-UTC intent
        // to preserve.
        if let TemporalInput::Text(text) = &normalized.input {
            let assume_utc = patterns::ISO_LOCAL.is_match(text)
                && (!ctx.zone_was_explicit || ctx.zone == chrono_tz::UTC);
            if assume_utc {
                let with_zulu = format!("{text}Z");
                normalized = Normalized { input: TemporalInput::Text(with_zulu), ..normalized }.also("assume-utc");
            }
        }

        normalized
    }

    fn check_fast_path(&self, input: &TemporalInput, ctx: &ParseContext) -> FastPath {
        // Only the unambiguous shape — ISO with an explicit offset — skips the
        // full pipeline. Conversion failures fall closed to a miss.
        if let TemporalInput::Text(s) = input {
            let trimmed = s.trim();
            if patterns::ISO_WITH_OFFSET.is_match(trimmed) {
                if let Ok((dt, conf)) = text_to_canonical(trimmed, ctx) {
                    return FastPath::hit(dt, conf);
                }
            }
        }
        FastPath::miss()
    }

    fn optimization_hints(&self, input: &TemporalInput, _ctx: &ParseContext) -> Hints {
        let mut hints = Hints {
            preferred: Some(StrategyKind::Text),
            should_cache: true,
            fast_path: false,
            estimated_complexity: Complexity::Medium,
            warnings: Vec::new(),
        };
        if let TemporalInput::Text(s) = input {
            let trimmed = s.trim();
            let shape = classify_text(trimmed);
            hints.fast_path = matches!(shape, TextShape::IsoOffset);
            match shape {
                TextShape::IsoOffset | TextShape::IsoLocal | TextShape::IsoDateOnly => {
                    hints.estimated_complexity = Complexity::Low;
                }
                TextShape::Keyword(_) => {
                    // Relative keywords resolve against a moving clock; their
                    // results must not outlive the instant they refer to.
                    hints.should_cache = false;
                    hints.warnings.push("relative keyword; result is reference-dependent".to_string());
                }
                TextShape::NumericString => {
                    hints.preferred = Some(StrategyKind::Number);
                }
                TextShape::Unrecognized => {
                    hints.estimated_complexity = Complexity::High;
                }
                _ => {}
            }
        }
        hints
    }

    fn parse(&self, input: &TemporalInput, ctx: &ParseContext) -> Result<ParseSuccess, ParseFailure> {
        let input = input.clone();
        let ctx = ctx.clone();
        run_timed(StrategyKind::Text, move || match input {
            TemporalInput::Text(s) => text_to_canonical(&s, &ctx),
            // The normalizer may have rewritten a numeric string.
            TemporalInput::Number(n) => {
                let class = classify_epoch(n)
                    .map_err(|e| TemporalError::strategy(ErrorCode::StringParse, e.to_string(), n.to_string()))?;
                Ok((CanonicalDateTime::from_epoch_millis(class.millis, ctx.zone)?, class.confidence))
            }
            other => Err(TemporalError::strategy(ErrorCode::StringParse, "not a string input", other.describe())),
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

    fn parse_ok(text: &str) -> CanonicalDateTime {
        StringStrategy.parse(&TemporalInput::Text(text.to_string()), &ctx()).unwrap().data
    }

    #[test]
    fn iso_with_offset_converts_to_target_zone() {
        let dt = parse_ok("2023-12-25T10:30:00Z");
        assert_eq!((dt.year(), dt.month(), dt.day(), dt.hour(), dt.minute()), (2023, 12, 25, 10, 30));
        assert_eq!(dt.zone_name(), "UTC");

        let offset = parse_ok("2023-12-25T10:30:00+05:30");
        assert_eq!((offset.hour(), offset.minute()), (5, 0));
    }

    #[test]
    fn iso_local_combines_in_context_zone() {
        let opts = ParseOptions::new().in_zone(chrono_tz::America::New_York);
        let ctx = ParseContext::new(&opts, chrono_tz::UTC);
        let dt = StringStrategy
            .parse(&TemporalInput::Text("2023-12-25T10:30:00".into()), &ctx)
            .unwrap()
            .data;
        assert_eq!(dt.zone_name(), "America/New_York");
        assert_eq!(dt.hour(), 10); // wall clock preserved in the target zone
    }

    #[test]
    fn leap_day_validation() {
        let bad = StringStrategy.validate(&TemporalInput::Text("2023-02-29T00:00:00Z".into()), &ctx());
        assert!(!bad.is_valid);
        assert!(bad.errors[0].contains("2023-02-29"));

        let good = StringStrategy.validate(&TemporalInput::Text("2024-02-29T00:00:00Z".into()), &ctx());
        assert!(good.is_valid);
        assert!(StringStrategy.parse(&TemporalInput::Text("2023-02-29T00:00:00Z".into()), &ctx()).is_err());
        assert!(StringStrategy.parse(&TemporalInput::Text("2024-02-29T00:00:00Z".into()), &ctx()).is_ok());
    }

    #[test]
    fn rejects_out_of_range_fields() {
        for bad in ["2023-13-01T00:00:00Z", "2023-04-31T00:00:00Z", "2023-01-01T24:00:00Z", "2023-01-01T00:61:00Z"] {
            let v = StringStrategy.validate(&TemporalInput::Text(bad.into()), &ctx());
            assert!(!v.is_valid, "expected invalid: {bad}");
        }
    }

    #[test]
    fn keywords_resolve_to_reference_relative_instants() {
        let today = parse_ok("today");
        assert_eq!((today.year(), today.month(), today.day(), today.hour()), (2023, 6, 15, 0));
        let now = parse_ok(" NOW ");
        assert_eq!(now.to_rfc3339(), "2023-06-15T12:00:00+00:00");
        assert_eq!(parse_ok("tomorrow").day(), 16);
        assert_eq!(parse_ok("yesterday").day(), 14);
    }

    #[test]
    fn time_of_day_anchors_to_reference_date() {
        let dt = parse_ok("14:30");
        assert_eq!((dt.year(), dt.month(), dt.day(), dt.hour(), dt.minute()), (2023, 6, 15, 14, 30));
    }

    #[test]
    fn numeric_strings_follow_the_epoch_ladder() {
        let dt = parse_ok("1703505000000");
        assert_eq!((dt.year(), dt.month(), dt.day()), (2023, 12, 25));
    }

    #[test]
    fn month_name_dates() {
        let a = parse_ok("Dec 25, 2023");
        let b = parse_ok("25 December 2023");
        assert_eq!(a, b);
        assert_eq!((a.year(), a.month(), a.day()), (2023, 12, 25));
    }

    #[test]
    fn slash_dates_prefer_month_first_unless_impossible() {
        let us = parse_ok("12/25/2023");
        assert_eq!((us.month(), us.day()), (12, 25));
        let flipped = parse_ok("25/12/2023");
        assert_eq!((flipped.month(), flipped.day()), (12, 25));
        let iso_order = parse_ok("2023/12/25");
        assert_eq!((iso_order.year(), iso_order.month(), iso_order.day()), (2023, 12, 25));
    }

    #[test]
    fn normalize_records_transforms() {
        let c = ctx();
        let n = StringStrategy.normalize(&TemporalInput::Text("  today  ".into()), &c);
        assert!(n.applied.iter().any(|t| t == "keyword:today"));

        let n = StringStrategy.normalize(&TemporalInput::Text("1703505000".into()), &c);
        assert_eq!(n.applied, vec!["numeric-string"]);
        assert!(matches!(n.input, TemporalInput::Number(_)));

        let n = StringStrategy.normalize(&TemporalInput::Text("2023-12-25T10:30:00".into()), &c);
        assert!(n.applied.iter().any(|t| t == "assume-utc"));
        assert!(matches!(&n.input, TemporalInput::Text(s) if s.ends_with('Z')));
    }

    #[test]
    fn normalize_preserves_non_utc_intent() {
        let opts = ParseOptions::new().in_zone(chrono_tz::Europe::Paris);
        let ctx = ParseContext::new(&opts, chrono_tz::UTC);
        let n = StringStrategy.normalize(&TemporalInput::Text("2023-12-25T10:30:00".into()), &ctx);
        assert!(!n.applied.iter().any(|t| t == "assume-utc"));
    }

    #[test]
    fn fast_path_hits_only_with_explicit_offset() {
        let c = ctx();
        assert!(StringStrategy.check_fast_path(&TemporalInput::Text("2023-12-25T10:30:00Z".into()), &c).usable);
        assert!(!StringStrategy.check_fast_path(&TemporalInput::Text("2023-12-25T10:30:00".into()), &c).usable);
        // Structurally ISO but semantically impossible: fails closed.
        assert!(!StringStrategy.check_fast_path(&TemporalInput::Text("2023-02-29T00:00:00Z".into()), &c).usable);
    }

    #[test]
    fn offset_recovery_for_nonstandard_bodies() {
        // Space separator plus offset is not RFC 3339, but the offset is
        // recoverable.
        let dt = parse_ok("2023-12-25 10:30:00+02:00");
        assert_eq!(dt.to_utc().to_rfc3339(), "2023-12-25T08:30:00+00:00");
    }

    #[test]
    fn unrecognized_strings_fail_with_typed_error() {
        let failure = StringStrategy.parse(&TemporalInput::Text("not a date".into()), &ctx()).unwrap_err();
        assert_eq!(failure.error.code(), Some(ErrorCode::StringParse));
        assert!(failure.error.to_string().contains("not a date"));
    }
}
