//! Cross-strategy case tables: every recognized input shape against its
//! expected canonical rendering, parsed through the default strategy set the
//! way the coordinator would drive it.

use crate::strategies::default_strategies;
use crate::strategy::{ParseContext, ParseOptions};
use crate::TemporalInput;

fn ctx() -> ParseContext {
    ParseContext::new(&ParseOptions::default(), chrono_tz::UTC)
}

/// Run `input` through the default set in priority order, first success wins.
fn parse_via_registry(input: TemporalInput, ctx: &ParseContext) -> Option<String> {
    for strategy in default_strategies() {
        if !strategy.can_handle(&input, ctx) {
            continue;
        }
        if let Ok(success) = strategy.parse(&input, ctx) {
            return Some(success.data.to_rfc3339());
        }
    }
    None
}

#[test]
fn string_examples_matching() {
    // (input, expected RFC 3339 in UTC context)
    let cases: Vec<(&str, &str)> = vec![
        ("2023-12-25T10:30:00Z", "2023-12-25T10:30:00+00:00"),
        ("2023-12-25t10:30:00z", "2023-12-25T10:30:00+00:00"),
        ("2023-12-25T10:30:00+05:30", "2023-12-25T05:00:00+00:00"),
        ("2023-12-25T10:30:00.250Z", "2023-12-25T10:30:00.250+00:00"),
        ("2023-12-25T10:30:00", "2023-12-25T10:30:00+00:00"),
        ("2023-12-25 10:30:00", "2023-12-25T10:30:00+00:00"),
        ("2023-12-25", "2023-12-25T00:00:00+00:00"),
        ("2024-02-29", "2024-02-29T00:00:00+00:00"),
        ("14:30", "2023-06-15T14:30:00+00:00"),
        ("14:30:05", "2023-06-15T14:30:05+00:00"),
        ("now", "2023-06-15T12:00:00+00:00"),
        ("today", "2023-06-15T00:00:00+00:00"),
        ("tomorrow", "2023-06-16T00:00:00+00:00"),
        ("yesterday", "2023-06-14T00:00:00+00:00"),
        ("  Today  ", "2023-06-15T00:00:00+00:00"),
        ("1703505000", "2023-12-25T10:30:00+00:00"),
        ("1703505000000", "2023-12-25T10:30:00+00:00"),
        ("Dec 25, 2023", "2023-12-25T00:00:00+00:00"),
        ("25 December 2023", "2023-12-25T00:00:00+00:00"),
        ("december 2023", "2023-12-01T00:00:00+00:00"),
        ("12/25/2023", "2023-12-25T00:00:00+00:00"),
        ("25/12/2023", "2023-12-25T00:00:00+00:00"),
        ("2023/12/25", "2023-12-25T00:00:00+00:00"),
        ("25.12.2023", "2023-12-25T00:00:00+00:00"),
    ];

    let ctx = ctx();
    for (input, expected) in cases {
        let got = parse_via_registry(TemporalInput::Text(input.to_string()), &ctx);
        assert_eq!(got.as_deref(), Some(expected), "input: {input:?}");
    }
}

#[test]
fn rejected_string_examples() {
    let cases = [
        "",
        "   ",
        "2023-02-29T00:00:00Z", // non-leap Feb 29
        "2023-13-01T00:00:00Z",
        "2023-04-31",
        "certainly not temporal",
    ];
    let ctx = ctx();
    for input in cases {
        let got = parse_via_registry(TemporalInput::Text(input.to_string()), &ctx);
        assert_eq!(got, None, "expected rejection for {input:?}");
    }
}

#[test]
fn structured_examples_matching() {
    let ctx = ctx();
    let cases: Vec<(TemporalInput, &str)> = vec![
        (TemporalInput::Number(1_703_505_000.0), "2023-12-25T10:30:00+00:00"),
        (TemporalInput::Number(1_703_505_000_000.0), "2023-12-25T10:30:00+00:00"),
        (TemporalInput::Number(946_684_800_000.0), "2000-01-01T00:00:00+00:00"),
        (TemporalInput::Timestamp { seconds: 1_703_505_000, nanoseconds: 0 }, "2023-12-25T10:30:00+00:00"),
        (
            TemporalInput::Components(vec![2023.0, 12.0, 25.0, 10.0, 30.0, 0.0, 0.0]),
            "2023-12-25T10:30:00+00:00",
        ),
        (TemporalInput::Components(vec![2023.0, 12.0, 25.0]), "2023-12-25T00:00:00+00:00"),
    ];
    for (input, expected) in cases {
        let desc = input.describe();
        let got = parse_via_registry(input, &ctx);
        assert_eq!(got.as_deref(), Some(expected), "input: {desc}");
    }
}

#[test]
fn every_default_strategy_reports_its_static_priority_order() {
    let set = default_strategies();
    let priorities: Vec<u16> = set.iter().map(|s| s.priority()).collect();
    let mut sorted = priorities.clone();
    sorted.sort_unstable_by(|a, b| b.cmp(a));
    assert_eq!(priorities, sorted, "default set must come out highest-priority-first");
    // Kinds are unique; registration relies on that for replacement.
    let kinds: std::collections::HashSet<_> = set.iter().map(|s| s.kind()).collect();
    assert_eq!(kinds.len(), set.len());
}

#[test]
fn empty_input_is_unhandled_by_every_strategy() {
    let ctx = ctx();
    for strategy in default_strategies() {
        assert!(!strategy.can_handle(&TemporalInput::Empty, &ctx), "kind: {}", strategy.kind());
    }
}
