//! The parsing strategy contract.
//!
//! A strategy is a stateless handler for one input shape. The coordinator
//! drives each candidate through the same pipeline:
//!
//! ```text
//! can_handle ──▶ confidence ──▶ validate ──▶ check_fast_path ──▶
//!                                               │ miss
//!                                               ▼
//!                                  normalize ──▶ parse
//! ```
//!
//! `can_handle` must stay cheap (a shape check, no parsing work).
//! `parse` and `check_fast_path` never panic and never leak raw errors:
//! failures come back as typed [`ParseFailure`]s / fast-path misses so the
//! coordinator can move on to the next candidate.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use chrono_tz::Tz;

use crate::canonical::CanonicalDateTime;
use crate::error::TemporalError;
use crate::{StrategyKind, TemporalInput};

/// Caller-facing options for a single parse.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Target timezone. When set it overrides any zone the input itself
    /// carries; when unset the coordinator's default zone applies.
    pub time_zone: Option<Tz>,
    /// Strict mode: validation errors disqualify a candidate before any
    /// conversion runs.
    pub strict: bool,
    /// Whether this parse may read/write the result cache.
    pub use_cache: bool,
    /// Wall-clock anchor for relative keywords ("now", "today", ...).
    /// Defaults to the current time; pin it for deterministic parses.
    pub reference: Option<CanonicalDateTime>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions { time_zone: None, strict: false, use_cache: true, reference: None }
    }
}

impl ParseOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the target timezone by IANA name.
    pub fn zone(mut self, name: &str) -> crate::error::Result<Self> {
        self.time_zone = Some(crate::canonical::parse_zone(name)?);
        Ok(self)
    }

    pub fn in_zone(mut self, zone: Tz) -> Self {
        self.time_zone = Some(zone);
        self
    }

    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    pub fn no_cache(mut self) -> Self {
        self.use_cache = false;
        self
    }

    pub fn with_reference(mut self, reference: CanonicalDateTime) -> Self {
        self.reference = Some(reference);
        self
    }
}

/// Ephemeral per-parse state: resolved options, the reference clock, the
/// inferred strategy, and a free-form metadata bag. Created at the start of
/// each parse, discarded at the end.
#[derive(Debug, Clone)]
pub struct ParseContext {
    /// Resolved target zone (explicit option, or the coordinator default).
    pub zone: Tz,
    /// Whether the caller set the zone explicitly (drives zone-precedence
    /// overrides for inputs that carry their own zone).
    pub zone_was_explicit: bool,
    pub strict: bool,
    pub cache_enabled: bool,
    /// Anchor instant for relative keywords, expressed in `zone`.
    pub reference: CanonicalDateTime,
    /// Strategy the selection phase settled on (filled by the coordinator).
    pub inferred: Option<StrategyKind>,
    /// Confidence of the inferred strategy (filled by the coordinator).
    pub confidence: f64,
    pub started: Instant,
    pub metadata: HashMap<String, String>,
}

impl ParseContext {
    pub fn new(options: &ParseOptions, default_zone: Tz) -> Self {
        let (zone, zone_was_explicit) = match options.time_zone {
            Some(tz) => (tz, true),
            None => (default_zone, false),
        };
        let reference = options
            .reference
            .clone()
            .map(|r| r.in_zone(zone))
            .unwrap_or_else(|| default_reference(zone));

        ParseContext {
            zone,
            zone_was_explicit,
            strict: options.strict,
            cache_enabled: options.use_cache,
            reference,
            inferred: None,
            confidence: 0.0,
            started: Instant::now(),
            metadata: HashMap::new(),
        }
    }
}

fn default_reference(zone: Tz) -> CanonicalDateTime {
    if cfg!(test) {
        // 2023-06-15T12:00:00Z, so relative keywords resolve deterministically
        // under test.
        CanonicalDateTime::from_epoch_millis(1_686_830_400_000, zone)
            .unwrap_or_else(|_| CanonicalDateTime::epoch(zone))
    } else {
        CanonicalDateTime::now(zone)
    }
}

/// Outcome of semantic validation.
///
/// Validation catches what a lenient downstream parser would silently "fix":
/// out-of-range months, Feb 29 on non-leap years, nanosecond overflow.
#[derive(Debug, Clone)]
pub struct Validation {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    /// A rewritten input, when validation already had to compute one.
    pub normalized_input: Option<TemporalInput>,
    /// A better-suited strategy, when the shape suggests one.
    pub suggested_strategy: Option<StrategyKind>,
    pub confidence: f64,
}

impl Validation {
    pub fn valid(confidence: f64) -> Self {
        Validation {
            is_valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
            normalized_input: None,
            suggested_strategy: None,
            confidence,
        }
    }

    pub fn invalid(error: impl Into<String>) -> Self {
        Validation {
            is_valid: false,
            errors: vec![error.into()],
            warnings: Vec::new(),
            normalized_input: None,
            suggested_strategy: None,
            confidence: 0.0,
        }
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }

    pub fn suggesting(mut self, strategy: StrategyKind) -> Self {
        self.suggested_strategy = Some(strategy);
        self
    }
}

/// Outcome of deterministic input rewriting.
#[derive(Debug, Clone)]
pub struct Normalized {
    pub input: TemporalInput,
    /// Names of the transforms that fired, in order (e.g. `trim`,
    /// `keyword:today`, `assume-utc`, `zone-override`).
    pub applied: Vec<String>,
    pub metadata: HashMap<String, String>,
}

impl Normalized {
    pub fn unchanged(input: TemporalInput) -> Self {
        Normalized { input, applied: Vec::new(), metadata: HashMap::new() }
    }

    pub fn rewritten(input: TemporalInput, transform: impl Into<String>) -> Self {
        Normalized { input, applied: vec![transform.into()], metadata: HashMap::new() }
    }

    pub fn also(mut self, transform: impl Into<String>) -> Self {
        self.applied.push(transform.into());
        self
    }
}

/// Outcome of the fast-path probe. Fails closed: a conversion error becomes a
/// miss, never a propagated failure.
#[derive(Debug, Clone)]
pub struct FastPath {
    pub usable: bool,
    pub data: Option<CanonicalDateTime>,
    pub confidence: f64,
}

impl FastPath {
    pub fn miss() -> Self {
        FastPath { usable: false, data: None, confidence: 0.0 }
    }

    pub fn hit(data: CanonicalDateTime, confidence: f64) -> Self {
        FastPath { usable: true, data: Some(data), confidence }
    }
}

/// Rough cost class a strategy expects for an input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum Complexity {
    Low,
    Medium,
    High,
}

/// Advisory output for the coordinator/optimizer. Never affects correctness,
/// only scheduling and caching policy.
#[derive(Debug, Clone)]
pub struct Hints {
    pub preferred: Option<StrategyKind>,
    pub should_cache: bool,
    pub fast_path: bool,
    pub estimated_complexity: Complexity,
    pub warnings: Vec<String>,
}

/// A completed conversion.
#[derive(Debug, Clone)]
pub struct ParseSuccess {
    pub data: CanonicalDateTime,
    pub strategy: StrategyKind,
    pub confidence: f64,
    pub execution: Duration,
    pub from_cache: bool,
}

/// A failed conversion, typed and timed. Never escapes as a panic.
#[derive(Debug, Clone)]
pub struct ParseFailure {
    pub error: TemporalError,
    pub strategy: StrategyKind,
    pub execution: Duration,
}

/// A self-contained handler for one input shape.
pub trait ParseStrategy {
    fn kind(&self) -> StrategyKind;

    /// Static priority; higher is tried first.
    fn priority(&self) -> u16;

    /// Cheap structural test. Side-effect free; no parsing work.
    fn can_handle(&self, input: &TemporalInput, ctx: &ParseContext) -> bool;

    /// Graded `[0, 1]` score, assuming `can_handle` returned true.
    fn confidence(&self, input: &TemporalInput, ctx: &ParseContext) -> f64;

    /// Semantic range checks, independent of what the underlying parser
    /// would itself reject.
    fn validate(&self, input: &TemporalInput, ctx: &ParseContext) -> Validation;

    /// Deterministic rewriting ahead of conversion.
    fn normalize(&self, input: &TemporalInput, _ctx: &ParseContext) -> Normalized {
        Normalized::unchanged(input.clone())
    }

    /// Allocation-light direct conversion for unambiguous shapes.
    fn check_fast_path(&self, _input: &TemporalInput, _ctx: &ParseContext) -> FastPath {
        FastPath::miss()
    }

    /// The authoritative conversion path.
    fn parse(&self, input: &TemporalInput, ctx: &ParseContext) -> Result<ParseSuccess, ParseFailure>;

    /// Advisory only; must stay cheap (no conversion work).
    fn optimization_hints(&self, _input: &TemporalInput, _ctx: &ParseContext) -> Hints {
        Hints {
            preferred: Some(self.kind()),
            should_cache: true,
            fast_path: false,
            estimated_complexity: Complexity::Low,
            warnings: Vec::new(),
        }
    }
}

/// Run `convert` under the standard timing/failure discipline: the result is
/// always a typed, timed success or failure, regardless of what `convert`
/// returns.
pub(crate) fn run_timed<F>(kind: StrategyKind, convert: F) -> Result<ParseSuccess, ParseFailure>
where
    F: FnOnce() -> Result<(CanonicalDateTime, f64), TemporalError>,
{
    let started = Instant::now();
    match convert() {
        Ok((data, confidence)) => Ok(ParseSuccess {
            data,
            strategy: kind,
            confidence,
            execution: started.elapsed(),
            from_cache: false,
        }),
        Err(error) => Err(ParseFailure { error, strategy: kind, execution: started.elapsed() }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_resolves_zone_precedence() {
        let opts = ParseOptions::new().in_zone(chrono_tz::America::New_York);
        let ctx = ParseContext::new(&opts, chrono_tz::UTC);
        assert_eq!(ctx.zone, chrono_tz::America::New_York);
        assert!(ctx.zone_was_explicit);

        let ctx = ParseContext::new(&ParseOptions::default(), chrono_tz::UTC);
        assert_eq!(ctx.zone, chrono_tz::UTC);
        assert!(!ctx.zone_was_explicit);
    }

    #[test]
    fn test_reference_is_pinned() {
        let ctx = ParseContext::new(&ParseOptions::default(), chrono_tz::UTC);
        assert_eq!(ctx.reference.to_rfc3339(), "2023-06-15T12:00:00+00:00");
    }

    #[test]
    fn options_zone_rejects_unknown_names() {
        assert!(ParseOptions::new().zone("Mars/Olympus_Mons").is_err());
        assert!(ParseOptions::new().zone("Europe/London").is_ok());
    }
}
