//! Pattern and constant table.
//!
//! The leaf module every strategy leans on: compiled regex patterns for the
//! recognized string shapes, the static priority ladder, the confidence
//! ladder, and a coarse [`InputSignals`] scan used to classify raw string
//! input before any real parsing work happens.
//!
//! ## Design notes
//!
//! - The scan is a *heuristic*. False positives are acceptable because the
//!   string strategy still runs full pattern matches downstream; the scan only
//!   steers confidence scoring and fast-path gating.
//! - Patterns are compiled once via `Lazy` statics. Keep them anchored where
//!   the shape is total (`^...$`) so confidence scoring stays cheap.

use bitflags::bitflags;
use once_cell::sync::Lazy;
use regex::Regex;

macro_rules! pattern {
    ($name:ident, $pat:literal) => {
        pub(crate) static $name: Lazy<Regex> = Lazy::new(|| {
            Regex::new($pat).unwrap_or_else(|e| panic!("bad builtin pattern {}: {e}", stringify!($name)))
        });
    };
}

// Full ISO 8601 / RFC 3339 datetime with an explicit offset or Z suffix.
pattern!(
    ISO_WITH_OFFSET,
    r"^(\d{4})-(\d{2})-(\d{2})[Tt ](\d{2}):(\d{2})(?::(\d{2})(?:\.(\d{1,9}))?)?(Z|z|[+-]\d{2}:?\d{2})$"
);

// ISO datetime without any offset information (local wall-clock time).
pattern!(
    ISO_LOCAL,
    r"^(\d{4})-(\d{2})-(\d{2})[Tt ](\d{2}):(\d{2})(?::(\d{2})(?:\.(\d{1,9}))?)?$"
);

// Date-only ISO form.
pattern!(ISO_DATE_ONLY, r"^(\d{4})-(\d{2})-(\d{2})$");

// Trailing offset, used to recover an offset the primary parser rejected.
pattern!(OFFSET_SUFFIX, r"(Z|z|[+-]\d{2}:?\d{2})\s*$");

// Bare time of day ("14:30", "14:30:05.250").
pattern!(TIME_OF_DAY, r"^(\d{1,2}):(\d{2})(?::(\d{2})(?:\.(\d{1,9}))?)?$");

// Integer or decimal epoch timestamp serialized as a string.
pattern!(NUMERIC_STRING, r"^-?\d{1,17}(?:\.\d{1,9})?$");

// Loose slash/dash/dot separated dates ("12/25/2023", "25.12.2023", "2023/12/25").
pattern!(SLASH_DATE, r"^(\d{1,4})[/.\-](\d{1,2})[/.\-](\d{1,4})$");

// Human-readable month-name dates ("Dec 25, 2023", "25 December 2023").
pattern!(
    MONTH_NAME_DATE,
    r"(?i)^(?:(\d{1,2})\s+)?(jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|jun(?:e)?|jul(?:y)?|aug(?:ust)?|sep(?:tember)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)\.?\s+(?:(\d{1,2})(?:st|nd|rd|th)?,?\s+)?(\d{4})$"
);

// Relative keywords the normalizer resolves against the reference clock.
pattern!(KEYWORD, r"(?i)^(now|today|tomorrow|yesterday)$");

bitflags! {
    /// Coarse features of a raw string input.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct InputSignals: u16 {
        const HAS_DIGITS    = 1 << 0;
        const HAS_DASH      = 1 << 1;
        const HAS_COLON     = 1 << 2;
        const HAS_T_SEP     = 1 << 3;
        const HAS_OFFSET    = 1 << 4;
        const HAS_ZULU      = 1 << 5;
        const HAS_SLASH     = 1 << 6;
        const MONTHISH      = 1 << 7;
        const KEYWORDISH    = 1 << 8;
        const NUMERIC_ONLY  = 1 << 9;
    }
}

/// Scan `input` for coarse signals.
///
/// ASCII lowercasing is fine here: every recognized shape is ASCII.
pub(crate) fn scan(input: &str) -> InputSignals {
    let trimmed = input.trim();
    let lower = trimmed.to_ascii_lowercase();
    let mut signals = InputSignals::empty();

    if trimmed.bytes().any(|b| b.is_ascii_digit()) {
        signals |= InputSignals::HAS_DIGITS;
    }
    if trimmed.contains('-') {
        signals |= InputSignals::HAS_DASH;
    }
    if trimmed.contains(':') {
        signals |= InputSignals::HAS_COLON;
    }
    if trimmed.contains('T') || trimmed.contains('t') {
        signals |= InputSignals::HAS_T_SEP;
    }
    if OFFSET_SUFFIX.is_match(trimmed) {
        signals |= InputSignals::HAS_OFFSET;
        if lower.ends_with('z') {
            signals |= InputSignals::HAS_ZULU;
        }
    }
    if trimmed.contains('/') {
        signals |= InputSignals::HAS_SLASH;
    }

    const MONTHS: &[&str] = &[
        "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
    ];
    if MONTHS.iter().any(|m| lower.contains(m)) {
        signals |= InputSignals::MONTHISH;
    }

    if KEYWORD.is_match(trimmed) {
        signals |= InputSignals::KEYWORDISH;
    }

    if NUMERIC_STRING.is_match(trimmed) {
        signals |= InputSignals::NUMERIC_ONLY;
    }

    signals
}

/// Static strategy priorities (higher = tried first).
pub(crate) mod priority {
    pub const CANONICAL_LIKE: u16 = 100;
    pub const TIMESTAMP: u16 = 95;
    pub const DATE: u16 = 90;
    pub const ARRAY_LIKE: u16 = 80;
    pub const TEXT: u16 = 70;
    pub const NUMBER: u16 = 60;
    pub const FALLBACK: u16 = 0;
}

/// The confidence ladder. Ordering across strategies matters more than the
/// absolute values; keep these consistent with the selection epsilon in the
/// coordinator.
pub(crate) mod confidence {
    pub const EXACT: f64 = 1.0;
    pub const STRUCTURED: f64 = 0.95;
    pub const NATIVE_DATE: f64 = 0.95;
    pub const ISO_OFFSET: f64 = 0.95;
    pub const ISO_LOCAL: f64 = 0.9;
    pub const ISO_DATE_ONLY: f64 = 0.85;
    pub const EPOCH_NUMBER: f64 = 0.75;
    pub const EPOCH_AMBIGUOUS: f64 = 0.7;
    pub const MONTH_NAME: f64 = 0.6;
    pub const LOOSE_DATE: f64 = 0.5;
    pub const UNRECOGNIZED: f64 = 0.1;
    pub const INVALID: f64 = 0.1;
    pub const NONE: f64 = 0.0;
}
