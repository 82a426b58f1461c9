//! Helpers shared across strategies: keyword resolution, offset recovery,
//! and the component/field/timestamp conversions that more than one strategy
//! needs.

use chrono::{FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use chrono_tz::Tz;
use regex::Captures;

use crate::canonical::{CanonicalDateTime, TimeUnit, parse_zone};
use crate::error::{Result, TemporalError};
use crate::strategy::ParseContext;
use crate::DateTimeFields;

/// Resolve a relative keyword against the context's reference clock.
///
/// "today"/"tomorrow"/"yesterday" resolve to the start of the day in the
/// target zone; "now" is the reference instant itself.
pub(crate) fn resolve_keyword(word: &str, ctx: &ParseContext) -> Result<Option<CanonicalDateTime>> {
    let resolved = match word {
        "now" => Some(ctx.reference.clone()),
        "today" => Some(ctx.reference.start_of(TimeUnit::Day)?),
        "tomorrow" => Some(ctx.reference.plus_days(1)?.start_of(TimeUnit::Day)?),
        "yesterday" => Some(ctx.reference.plus_days(-1)?.start_of(TimeUnit::Day)?),
        _ => None,
    };
    Ok(resolved)
}

/// Parse an explicit offset suffix ("Z", "+05:30", "-0800").
pub(crate) fn parse_offset(text: &str) -> Option<FixedOffset> {
    let text = text.trim();
    if text.eq_ignore_ascii_case("z") {
        return FixedOffset::east_opt(0);
    }
    let (sign, rest) = match text.split_at_checked(1)? {
        ("+", rest) => (1, rest),
        ("-", rest) => (-1, rest),
        _ => return None,
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if digits.len() != 4 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let hours: i32 = digits[..2].parse().ok()?;
    let minutes: i32 = digits[2..].parse().ok()?;
    if hours > 23 || minutes > 59 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

/// Build a naive datetime from the capture groups of the ISO patterns
/// (year, month, day, hour, minute, optional second, optional fraction).
pub(crate) fn naive_from_iso_captures(caps: &Captures<'_>) -> Option<NaiveDateTime> {
    let year: i32 = caps.get(1)?.as_str().parse().ok()?;
    let month: u32 = caps.get(2)?.as_str().parse().ok()?;
    let day: u32 = caps.get(3)?.as_str().parse().ok()?;
    let hour: u32 = caps.get(4)?.as_str().parse().ok()?;
    let minute: u32 = caps.get(5)?.as_str().parse().ok()?;
    let second: u32 = caps.get(6).map_or(Some(0), |m| m.as_str().parse().ok())?;
    let nanos = caps.get(7).map_or(Some(0), |m| fraction_nanos(m.as_str()))?;

    let date = NaiveDate::from_ymd_opt(year, month, day)?;
    let time = NaiveTime::from_hms_nano_opt(hour, minute, second, nanos)?;
    Some(NaiveDateTime::new(date, time))
}

/// Sub-second digits → nanoseconds ("25" → 250_000_000).
pub(crate) fn fraction_nanos(digits: &str) -> Option<u32> {
    if digits.is_empty() || digits.len() > 9 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let value: u32 = digits.parse().ok()?;
    Some(value * 10u32.pow(9 - digits.len() as u32))
}

/// Convert a numeric component array (`[year, month, day, hour, minute,
/// second, millisecond]`, month 1-based) to a canonical value in `zone`.
pub(crate) fn components_to_canonical(parts: &[f64], zone: Tz) -> Result<CanonicalDateTime> {
    if parts.is_empty() || parts.len() > 7 {
        return Err(TemporalError::InvalidDatetime(format!(
            "component array needs 1..=7 entries, got {}",
            parts.len()
        )));
    }
    let mut fixed = [0f64; 7];
    fixed[1] = 1.0; // month and day default to 1
    fixed[2] = 1.0;
    for (slot, part) in fixed.iter_mut().zip(parts) {
        if !part.is_finite() || part.fract() != 0.0 {
            return Err(TemporalError::InvalidDatetime(format!("non-integral component: {part}")));
        }
        *slot = *part;
    }
    CanonicalDateTime::from_civil(
        fixed[0] as i32,
        fixed[1] as u32,
        fixed[2] as u32,
        fixed[3] as u32,
        fixed[4] as u32,
        fixed[5] as u32,
        (fixed[6] as u32).saturating_mul(1_000_000),
        zone,
    )
}

/// Convert a seconds+nanoseconds timestamp structure.
pub(crate) fn timestamp_to_canonical(seconds: i64, nanoseconds: u32, zone: Tz) -> Result<CanonicalDateTime> {
    if nanoseconds >= 1_000_000_000 {
        return Err(TemporalError::InvalidDatetime(format!(
            "nanoseconds component out of range: {nanoseconds}"
        )));
    }
    CanonicalDateTime::from_epoch_seconds(seconds, nanoseconds, zone)
}

/// Convert a canonical-like field bag, resolving zone precedence: an
/// explicitly-set context zone overrides the input's own claim.
///
/// Returns the canonical value plus the name of the zone transform that
/// fired, if any.
pub(crate) fn fields_to_canonical(
    fields: &DateTimeFields,
    ctx: &ParseContext,
) -> Result<(CanonicalDateTime, Option<&'static str>)> {
    let own_zone = fields.time_zone.as_deref().map(parse_zone).transpose()?;
    let (zone, transform) = match (own_zone, ctx.zone_was_explicit) {
        (Some(_), true) => (ctx.zone, Some("zone-override")),
        (Some(own), false) => (own, None),
        (None, _) => (ctx.zone, None),
    };
    let canonical = CanonicalDateTime::from_civil(
        fields.year,
        fields.month,
        fields.day,
        fields.hour,
        fields.minute,
        fields.second,
        fields.nanosecond,
        zone,
    )?;
    Ok((canonical, transform))
}
