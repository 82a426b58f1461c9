//! Coordinator metrics.
//!
//! Monotonically-accumulating counters plus a running mean of execution
//! time. Counters live for the lifetime of the coordinator and reset only by
//! explicit operator action (`reset`), which never touches the cache or the
//! registry.
//!
//! Per-strategy timing breakdown is opt-in (`detailed`): the hot path can
//! skip the extra bookkeeping.

use std::collections::HashMap;
use std::time::Duration;

use crate::StrategyKind;

/// Numerically-stable running mean, in milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, serde::Serialize)]
pub struct RunningMean {
    pub count: u64,
    pub mean_ms: f64,
}

impl RunningMean {
    pub fn record(&mut self, duration: Duration) {
        self.count += 1;
        let ms = duration.as_secs_f64() * 1_000.0;
        self.mean_ms += (ms - self.mean_ms) / self.count as f64;
    }
}

/// Per-strategy usage counters.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct StrategyUsage {
    pub attempts: u64,
    pub successes: u64,
    pub failures: u64,
    /// Cumulative execution time; only tracked when detailed metrics are on.
    pub total_time_ms: f64,
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct ParseMetrics {
    pub total_parses: u64,
    pub successful_parses: u64,
    pub failed_parses: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub fast_path_parses: u64,
    pub per_strategy: HashMap<StrategyKind, StrategyUsage>,
    pub execution: RunningMean,
    /// Whether per-strategy timing is being collected.
    pub detailed: bool,
}

impl ParseMetrics {
    pub fn new(detailed: bool) -> Self {
        ParseMetrics { detailed, ..Default::default() }
    }

    pub fn record_attempt(&mut self, kind: StrategyKind) {
        self.per_strategy.entry(kind).or_default().attempts += 1;
    }

    pub fn record_success(&mut self, kind: StrategyKind, duration: Duration, fast_path: bool) {
        self.total_parses += 1;
        self.successful_parses += 1;
        if fast_path {
            self.fast_path_parses += 1;
        }
        self.execution.record(duration);
        let usage = self.per_strategy.entry(kind).or_default();
        usage.successes += 1;
        if self.detailed {
            usage.total_time_ms += duration.as_secs_f64() * 1_000.0;
        }
    }

    /// One candidate strategy failed; the parse as a whole may still succeed.
    pub fn record_attempt_failure(&mut self, kind: StrategyKind, duration: Duration) {
        let usage = self.per_strategy.entry(kind).or_default();
        usage.failures += 1;
        if self.detailed {
            usage.total_time_ms += duration.as_secs_f64() * 1_000.0;
        }
    }

    /// The whole parse failed (attempt budget exhausted).
    pub fn record_failure(&mut self, duration: Duration) {
        self.total_parses += 1;
        self.failed_parses += 1;
        self.execution.record(duration);
    }

    pub fn record_cache_hit(&mut self) {
        self.total_parses += 1;
        self.successful_parses += 1;
        self.cache_hits += 1;
    }

    pub fn record_cache_miss(&mut self) {
        self.cache_misses += 1;
    }

    pub fn average_execution_ms(&self) -> f64 {
        self.execution.mean_ms
    }

    pub fn success_ratio(&self) -> f64 {
        if self.total_parses == 0 { 0.0 } else { self.successful_parses as f64 / self.total_parses as f64 }
    }

    pub fn fast_path_ratio(&self) -> f64 {
        if self.successful_parses == 0 {
            0.0
        } else {
            self.fast_path_parses as f64 / self.successful_parses as f64
        }
    }

    /// Zero every counter. Cache and registry are untouched by design.
    pub fn reset(&mut self) {
        *self = ParseMetrics::new(self.detailed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn running_mean_converges() {
        let mut mean = RunningMean::default();
        mean.record(Duration::from_millis(10));
        mean.record(Duration::from_millis(20));
        mean.record(Duration::from_millis(30));
        assert_eq!(mean.count, 3);
        assert!((mean.mean_ms - 20.0).abs() < 1e-9);
    }

    #[test]
    fn counters_accumulate_and_reset() {
        let mut m = ParseMetrics::new(true);
        m.record_attempt(StrategyKind::Text);
        m.record_success(StrategyKind::Text, Duration::from_millis(4), true);
        m.record_attempt_failure(StrategyKind::Number, Duration::from_millis(1));
        m.record_failure(Duration::from_millis(2));
        m.record_cache_hit();

        assert_eq!(m.total_parses, 3);
        assert_eq!(m.successful_parses, 2);
        assert_eq!(m.failed_parses, 1);
        assert_eq!(m.fast_path_parses, 1);
        assert_eq!(m.per_strategy[&StrategyKind::Text].successes, 1);
        assert_eq!(m.per_strategy[&StrategyKind::Number].failures, 1);
        assert!(m.per_strategy[&StrategyKind::Text].total_time_ms > 0.0);

        m.reset();
        assert_eq!(m.total_parses, 0);
        assert!(m.per_strategy.is_empty());
        assert!(m.detailed);
    }
}
