//! The canonical timezone-aware datetime type.
//!
//! Every successful parse converges on [`CanonicalDateTime`]: an instant bound
//! to an IANA timezone. The type is never partially constructed — each
//! constructor either yields a valid, unambiguous point in time or an error.
//!
//! ```text
//! epoch millis ─┐
//! secs + nanos ─┤
//! civil fields ─┼─▶ CanonicalDateTime ─▶ getters / zone conversion /
//! RFC 3339     ─┘        (DateTime<Tz>)   truncation / signed diff
//! ```
//!
//! Calendar math goes through `chrono`; zone resolution goes through
//! `chrono-tz`. Weeks start on Monday (ISO 8601).

use std::str::FromStr;

use chrono::{
    DateTime, Datelike, Duration, FixedOffset, Months, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc,
};
use chrono_tz::Tz;

use crate::error::{Result, TemporalError};

/// Calendar/clock units used for truncation and diff scoping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub enum TimeUnit {
    Year,
    Month,
    Week,
    Day,
    Hour,
    Minute,
    Second,
    Millisecond,
}

impl TimeUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeUnit::Year => "year",
            TimeUnit::Month => "month",
            TimeUnit::Week => "week",
            TimeUnit::Day => "day",
            TimeUnit::Hour => "hour",
            TimeUnit::Minute => "minute",
            TimeUnit::Second => "second",
            TimeUnit::Millisecond => "millisecond",
        }
    }

    /// Fixed length in milliseconds, for the units that have one.
    fn fixed_millis(&self) -> Option<f64> {
        match self {
            TimeUnit::Week => Some(604_800_000.0),
            TimeUnit::Day => Some(86_400_000.0),
            TimeUnit::Hour => Some(3_600_000.0),
            TimeUnit::Minute => Some(60_000.0),
            TimeUnit::Second => Some(1_000.0),
            TimeUnit::Millisecond => Some(1.0),
            TimeUnit::Year | TimeUnit::Month => None,
        }
    }
}

impl std::fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How fractional diff counts are reduced to a reportable number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
pub enum RoundingMode {
    /// Toward zero (default).
    #[default]
    Truncate,
    /// To nearest, half away from zero.
    Round,
    Ceil,
    Floor,
}

impl RoundingMode {
    pub fn apply(&self, value: f64) -> f64 {
        match self {
            RoundingMode::Truncate => value.trunc(),
            RoundingMode::Round => value.round(),
            RoundingMode::Ceil => value.ceil(),
            RoundingMode::Floor => value.floor(),
        }
    }
}

/// Signed structured duration between two instants.
///
/// `total_milliseconds` carries the sign; the day/hour/minute/second
/// components decompose the magnitude.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct DurationBreakdown {
    pub total_milliseconds: i64,
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
    pub milliseconds: i64,
    pub human_readable: String,
}

impl DurationBreakdown {
    fn from_total(total_ms: i64) -> Self {
        let magnitude = total_ms.abs();
        let days = magnitude / 86_400_000;
        let hours = (magnitude / 3_600_000) % 24;
        let minutes = (magnitude / 60_000) % 60;
        let seconds = (magnitude / 1_000) % 60;
        let milliseconds = magnitude % 1_000;

        let mut parts: Vec<String> = Vec::new();
        if days > 0 {
            parts.push(format!("{} day{}", days, if days == 1 { "" } else { "s" }));
        }
        if hours > 0 {
            parts.push(format!("{} hour{}", hours, if hours == 1 { "" } else { "s" }));
        }
        if minutes > 0 {
            parts.push(format!("{} minute{}", minutes, if minutes == 1 { "" } else { "s" }));
        }
        if seconds > 0 && days == 0 {
            parts.push(format!("{} second{}", seconds, if seconds == 1 { "" } else { "s" }));
        }
        let mut human_readable =
            if parts.is_empty() { "0 seconds".to_string() } else { parts.join(", ") };
        if total_ms < 0 {
            human_readable = format!("-({})", human_readable);
        }

        DurationBreakdown { total_milliseconds: total_ms, days, hours, minutes, seconds, milliseconds, human_readable }
    }
}

/// Parse an IANA timezone name.
pub fn parse_zone(name: &str) -> Result<Tz> {
    Tz::from_str(name.trim()).map_err(|_| TemporalError::InvalidTimezone(name.to_string()))
}

/// An instant bound to an IANA timezone.
///
/// Equality and ordering compare the underlying instant, not the wall-clock
/// rendering, so the same moment observed from two zones is equal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CanonicalDateTime {
    inner: DateTime<Tz>,
}

impl CanonicalDateTime {
    pub fn from_utc(instant: DateTime<Utc>, zone: Tz) -> Self {
        CanonicalDateTime { inner: instant.with_timezone(&zone) }
    }

    pub fn from_fixed(instant: DateTime<FixedOffset>, zone: Tz) -> Self {
        CanonicalDateTime { inner: instant.with_timezone(&zone) }
    }

    pub fn from_epoch_millis(millis: i64, zone: Tz) -> Result<Self> {
        Utc.timestamp_millis_opt(millis)
            .single()
            .map(|dt| Self::from_utc(dt, zone))
            .ok_or_else(|| TemporalError::InvalidDatetime(format!("epoch millis out of range: {millis}")))
    }

    pub fn from_epoch_seconds(seconds: i64, nanos: u32, zone: Tz) -> Result<Self> {
        Utc.timestamp_opt(seconds, nanos)
            .single()
            .map(|dt| Self::from_utc(dt, zone))
            .ok_or_else(|| {
                TemporalError::InvalidDatetime(format!("epoch seconds out of range: {seconds}.{nanos:09}"))
            })
    }

    /// Build from wall-clock fields interpreted in `zone`.
    ///
    /// Rejects impossible calendar dates (Feb 29 on a non-leap year, Apr 31)
    /// rather than rolling them forward. Ambiguous local times (DST fall-back)
    /// resolve to the earlier offset; nonexistent local times (spring-forward
    /// gap) are an error.
    #[allow(clippy::too_many_arguments)]
    pub fn from_civil(
        year: i32,
        month: u32,
        day: u32,
        hour: u32,
        minute: u32,
        second: u32,
        nanosecond: u32,
        zone: Tz,
    ) -> Result<Self> {
        let date = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
            TemporalError::InvalidDatetime(format!("no such calendar date: {year:04}-{month:02}-{day:02}"))
        })?;
        let naive = date.and_hms_nano_opt(hour, minute, second, nanosecond).ok_or_else(|| {
            TemporalError::InvalidDatetime(format!(
                "no such time of day: {hour:02}:{minute:02}:{second:02}.{nanosecond:09}"
            ))
        })?;
        Self::from_local(naive, zone)
    }

    /// Interpret a naive wall-clock datetime in `zone`.
    pub fn from_local(naive: NaiveDateTime, zone: Tz) -> Result<Self> {
        match zone.from_local_datetime(&naive) {
            chrono::LocalResult::Single(dt) => Ok(CanonicalDateTime { inner: dt }),
            chrono::LocalResult::Ambiguous(earlier, _later) => Ok(CanonicalDateTime { inner: earlier }),
            chrono::LocalResult::None => Err(TemporalError::InvalidDatetime(format!(
                "local time {naive} does not exist in {}",
                zone.name()
            ))),
        }
    }

    /// Parse an RFC 3339 string carrying its own offset, re-expressed in `zone`.
    pub fn from_rfc3339(text: &str, zone: Tz) -> Result<Self> {
        DateTime::parse_from_rfc3339(text)
            .map(|dt| Self::from_fixed(dt, zone))
            .map_err(|e| TemporalError::InvalidDatetime(format!("{text}: {e}")))
    }

    pub fn now(zone: Tz) -> Self {
        Self::from_utc(Utc::now(), zone)
    }

    /// The epoch-zero sentinel (1970-01-01T00:00:00Z) observed from `zone`.
    pub fn epoch(zone: Tz) -> Self {
        Self::from_utc(DateTime::<Utc>::UNIX_EPOCH, zone)
    }

    /// Same instant, different zone.
    pub fn in_zone(&self, zone: Tz) -> Self {
        CanonicalDateTime { inner: self.inner.with_timezone(&zone) }
    }

    pub fn zone(&self) -> Tz {
        self.inner.timezone()
    }

    pub fn zone_name(&self) -> &'static str {
        self.inner.timezone().name()
    }

    // --- Wall-clock getters (in the bound zone) ------------------------------

    pub fn year(&self) -> i32 {
        self.inner.year()
    }

    pub fn month(&self) -> u32 {
        self.inner.month()
    }

    pub fn day(&self) -> u32 {
        self.inner.day()
    }

    pub fn hour(&self) -> u32 {
        self.inner.hour()
    }

    pub fn minute(&self) -> u32 {
        self.inner.minute()
    }

    pub fn second(&self) -> u32 {
        self.inner.second()
    }

    pub fn millisecond(&self) -> u32 {
        self.inner.nanosecond() / 1_000_000
    }

    pub fn nanosecond(&self) -> u32 {
        self.inner.nanosecond()
    }

    pub fn weekday(&self) -> chrono::Weekday {
        self.inner.weekday()
    }

    pub fn epoch_millis(&self) -> i64 {
        self.inner.timestamp_millis()
    }

    pub fn epoch_seconds(&self) -> i64 {
        self.inner.timestamp()
    }

    pub fn to_rfc3339(&self) -> String {
        self.inner.to_rfc3339()
    }

    pub fn to_utc(&self) -> DateTime<Utc> {
        self.inner.with_timezone(&Utc)
    }

    /// Shift by whole days, preserving the zone.
    pub fn plus_days(&self, days: i64) -> Result<Self> {
        self.inner
            .checked_add_signed(Duration::days(days))
            .map(|inner| CanonicalDateTime { inner })
            .ok_or_else(|| TemporalError::InvalidDatetime(format!("day shift overflow: {days}")))
    }

    /// Truncate to the start of `unit` in the bound zone.
    ///
    /// Weeks truncate to Monday 00:00 (ISO 8601).
    pub fn start_of(&self, unit: TimeUnit) -> Result<Self> {
        let local = self.inner.naive_local();
        let date = local.date();
        let midnight = |d: NaiveDate| d.and_hms_opt(0, 0, 0);

        let truncated: Option<NaiveDateTime> = match unit {
            TimeUnit::Year => NaiveDate::from_ymd_opt(date.year(), 1, 1).and_then(midnight),
            TimeUnit::Month => NaiveDate::from_ymd_opt(date.year(), date.month(), 1).and_then(midnight),
            TimeUnit::Week => {
                let back = date.weekday().num_days_from_monday() as i64;
                date.checked_sub_signed(Duration::days(back)).and_then(midnight)
            }
            TimeUnit::Day => midnight(date),
            TimeUnit::Hour => local.with_minute(0).and_then(|t| t.with_second(0)).and_then(|t| t.with_nanosecond(0)),
            TimeUnit::Minute => local.with_second(0).and_then(|t| t.with_nanosecond(0)),
            TimeUnit::Second => local.with_nanosecond(0),
            TimeUnit::Millisecond => {
                let ms_nanos = (local.nanosecond() / 1_000_000) * 1_000_000;
                local.with_nanosecond(ms_nanos)
            }
        };

        let truncated = truncated
            .ok_or_else(|| TemporalError::InvalidDatetime(format!("cannot truncate {local} to {unit}")))?;
        Self::from_local(truncated, self.zone())
    }

    /// Signed count of `unit` between `self` and `other`.
    ///
    /// Negative when `self` precedes `other`. Year/month counts are
    /// calendar-aware (whole units plus the fraction of the partial unit);
    /// everything else divides the exact millisecond delta.
    pub fn diff_in(&self, other: &CanonicalDateTime, unit: TimeUnit, rounding: RoundingMode) -> f64 {
        let exact = match unit.fixed_millis() {
            Some(unit_ms) => (self.inner.clone() - other.inner.clone()).num_milliseconds() as f64 / unit_ms,
            None => {
                let months = months_between(&self.inner, &other.inner);
                match unit {
                    TimeUnit::Year => months / 12.0,
                    _ => months,
                }
            }
        };
        rounding.apply(exact)
    }

    /// Structured duration between `self` and `other`.
    ///
    /// Negative when `self` precedes `other`.
    pub fn diff_breakdown(&self, other: &CanonicalDateTime) -> DurationBreakdown {
        DurationBreakdown::from_total((self.inner.clone() - other.inner.clone()).num_milliseconds())
    }
}

impl std::fmt::Display for CanonicalDateTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_rfc3339())
    }
}

/// Signed calendar months from `b` to `a`: whole months plus the elapsed
/// fraction of the partial month.
fn months_between(a: &DateTime<Tz>, b: &DateTime<Tz>) -> f64 {
    if a == b {
        return 0.0;
    }
    if a < b {
        return -months_between(b, a);
    }

    let mut whole = (a.year() - b.year()) * 12 + (a.month() as i32 - b.month() as i32);
    if whole < 0 {
        whole = 0;
    }
    let add = |base: &DateTime<Tz>, n: i32| base.clone().checked_add_months(Months::new(n as u32));

    let mut anchor = add(b, whole);
    while whole > 0 && anchor.as_ref().is_none_or(|d| d > a) {
        whole -= 1;
        anchor = add(b, whole);
    }

    match (anchor, add(b, whole + 1)) {
        (Some(anchor), Some(next)) => {
            let span = (next - anchor.clone()).num_milliseconds() as f64;
            let into = (a.clone() - anchor).num_milliseconds() as f64;
            whole as f64 + if span > 0.0 { into / span } else { 0.0 }
        }
        // Month arithmetic overflowed chrono's range; fall back to the mean
        // Gregorian month length.
        _ => (a.clone() - b.clone()).num_milliseconds() as f64 / 2_629_746_000.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::Tz;

    fn utc() -> Tz {
        chrono_tz::UTC
    }

    #[test]
    fn civil_construction_and_getters() {
        let dt = CanonicalDateTime::from_civil(2023, 12, 25, 10, 30, 0, 0, utc()).unwrap();
        assert_eq!(dt.year(), 2023);
        assert_eq!(dt.month(), 12);
        assert_eq!(dt.day(), 25);
        assert_eq!(dt.hour(), 10);
        assert_eq!(dt.minute(), 30);
        assert_eq!(dt.zone_name(), "UTC");
    }

    #[test]
    fn rejects_nonexistent_calendar_dates() {
        assert!(CanonicalDateTime::from_civil(2023, 2, 29, 0, 0, 0, 0, utc()).is_err());
        assert!(CanonicalDateTime::from_civil(2023, 4, 31, 0, 0, 0, 0, utc()).is_err());
        assert!(CanonicalDateTime::from_civil(2024, 2, 29, 0, 0, 0, 0, utc()).is_ok());
    }

    #[test]
    fn zone_conversion_preserves_instant() {
        let utc_dt = CanonicalDateTime::from_civil(2023, 6, 1, 12, 0, 0, 0, utc()).unwrap();
        let ny = utc_dt.in_zone(chrono_tz::America::New_York);
        assert_eq!(utc_dt, ny);
        assert_eq!(ny.hour(), 8); // EDT = UTC-4 in June
        assert_eq!(ny.zone_name(), "America/New_York");
    }

    #[test]
    fn epoch_sentinel_is_instant_zero_in_any_zone() {
        let tokyo = CanonicalDateTime::epoch(chrono_tz::Asia::Tokyo);
        assert_eq!(tokyo.epoch_millis(), 0);
        assert_eq!(tokyo.zone_name(), "Asia/Tokyo");
    }

    #[test]
    fn start_of_week_is_monday() {
        // 2023-12-25 is a Monday; the following Thursday truncates back to it.
        let thu = CanonicalDateTime::from_civil(2023, 12, 28, 15, 45, 0, 0, utc()).unwrap();
        let week = thu.start_of(TimeUnit::Week).unwrap();
        assert_eq!((week.year(), week.month(), week.day()), (2023, 12, 25));
        assert_eq!((week.hour(), week.minute()), (0, 0));
    }

    #[test]
    fn start_of_month_and_hour() {
        let dt = CanonicalDateTime::from_civil(2023, 7, 19, 8, 41, 13, 0, utc()).unwrap();
        let month = dt.start_of(TimeUnit::Month).unwrap();
        assert_eq!((month.day(), month.hour()), (1, 0));
        let hour = dt.start_of(TimeUnit::Hour).unwrap();
        assert_eq!((hour.hour(), hour.minute(), hour.second()), (8, 0, 0));
    }

    #[test]
    fn diff_sign_follows_operand_order() {
        let a = CanonicalDateTime::from_civil(2023, 1, 1, 0, 0, 0, 0, utc()).unwrap();
        let b = CanonicalDateTime::from_civil(2023, 1, 2, 0, 0, 0, 0, utc()).unwrap();
        assert_eq!(a.diff_in(&b, TimeUnit::Day, RoundingMode::Truncate), -1.0);
        assert_eq!(b.diff_in(&a, TimeUnit::Hour, RoundingMode::Truncate), 24.0);
    }

    #[test]
    fn diff_whole_months_and_years() {
        let a = CanonicalDateTime::from_civil(2024, 3, 15, 0, 0, 0, 0, utc()).unwrap();
        let b = CanonicalDateTime::from_civil(2023, 3, 15, 0, 0, 0, 0, utc()).unwrap();
        assert_eq!(a.diff_in(&b, TimeUnit::Month, RoundingMode::Truncate), 12.0);
        assert_eq!(a.diff_in(&b, TimeUnit::Year, RoundingMode::Truncate), 1.0);
    }

    #[test]
    fn diff_rounding_modes() {
        let a = CanonicalDateTime::from_civil(2023, 1, 1, 0, 0, 0, 0, utc()).unwrap();
        let b = CanonicalDateTime::from_civil(2023, 1, 2, 18, 0, 0, 0, utc()).unwrap();
        // 1.75 days apart
        assert_eq!(b.diff_in(&a, TimeUnit::Day, RoundingMode::Truncate), 1.0);
        assert_eq!(b.diff_in(&a, TimeUnit::Day, RoundingMode::Round), 2.0);
        assert_eq!(a.diff_in(&b, TimeUnit::Day, RoundingMode::Floor), -2.0);
        assert_eq!(a.diff_in(&b, TimeUnit::Day, RoundingMode::Ceil), -1.0);
    }

    #[test]
    fn breakdown_decomposes_magnitude_with_sign() {
        let a = CanonicalDateTime::from_civil(2023, 1, 3, 2, 30, 0, 0, utc()).unwrap();
        let b = CanonicalDateTime::from_civil(2023, 1, 1, 0, 0, 0, 0, utc()).unwrap();
        let d = a.diff_breakdown(&b);
        assert_eq!(d.days, 2);
        assert_eq!(d.hours, 2);
        assert_eq!(d.minutes, 30);
        assert!(d.total_milliseconds > 0);
        assert!(d.human_readable.contains("2 days"));

        let neg = b.diff_breakdown(&a);
        assert_eq!(neg.days, 2);
        assert!(neg.total_milliseconds < 0);
        assert!(neg.human_readable.starts_with('-'));
    }

    #[test]
    fn rfc3339_round_trip() {
        let dt = CanonicalDateTime::from_rfc3339("2023-12-25T10:30:00+01:00", utc()).unwrap();
        assert_eq!(dt.hour(), 9);
        let again = CanonicalDateTime::from_rfc3339(&dt.to_rfc3339(), utc()).unwrap();
        assert_eq!(dt, again);
    }
}
