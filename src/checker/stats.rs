//! Run-scoped checker statistics.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Instant;

use serde::{Deserialize, Serialize};

use super::result::{CheckOutcome, CheckResult};
use crate::error_handling::ErrorCategory;
use crate::utils::now_millis;

/// Cumulative counters for one checker instance.
///
/// Also persisted in checkpoints, so the field names are part of the
/// checkpoint format.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckerRunStats {
    /// Checks that reached the network (every outcome except invalid and duplicate)
    pub total_checked: u64,
    pub active_found: u64,
    pub inactive_found: u64,
    /// DNS, connection, TLS, and unknown failures
    pub errors: u64,
    pub timeouts: u64,
    pub invalid_urls: u64,
    /// Inputs skipped because their canonical form was already checked
    pub duplicates: u64,
    #[serde(default)]
    pub errors_by_category: BTreeMap<ErrorCategory, u64>,
    /// Unix milliseconds
    pub start_time: i64,
    /// Seconds since `start_time`, refreshed on every snapshot
    pub total_time: f64,
}

impl CheckerRunStats {
    /// Percentage of network checks that found an active site.
    pub fn success_rate(&self) -> f64 {
        if self.total_checked == 0 {
            return 0.0;
        }
        self.active_found as f64 / self.total_checked as f64 * 100.0
    }

    pub fn checks_per_second(&self) -> f64 {
        if self.total_time <= 0.0 {
            return 0.0;
        }
        self.total_checked as f64 / self.total_time
    }

    fn record(&mut self, result: &CheckResult) {
        match result.status_result {
            CheckOutcome::Active => {
                self.total_checked += 1;
                self.active_found += 1;
            }
            CheckOutcome::Inactive => {
                self.total_checked += 1;
                self.inactive_found += 1;
            }
            CheckOutcome::Timeout => {
                self.total_checked += 1;
                self.timeouts += 1;
            }
            CheckOutcome::Error => {
                self.total_checked += 1;
                self.errors += 1;
            }
            CheckOutcome::InvalidUrl => self.invalid_urls += 1,
        }
        if let Some(category) = result.error_category {
            *self.errors_by_category.entry(category).or_insert(0) += 1;
        }
    }
}

/// Single-writer recorder behind a mutex; every completed check takes the lock
/// once.
#[derive(Debug)]
pub struct StatsRecorder {
    inner: Mutex<CheckerRunStats>,
    started: Instant,
    /// Seconds already accumulated by a previous run when resuming
    carried_secs: Mutex<f64>,
}

impl Default for StatsRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl StatsRecorder {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(CheckerRunStats {
                start_time: now_millis(),
                ..Default::default()
            }),
            started: Instant::now(),
            carried_secs: Mutex::new(0.0),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CheckerRunStats> {
        // Counters stay meaningful even if a holder panicked
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn record(&self, result: &CheckResult) {
        self.lock().record(result);
    }

    /// Records a duplicate hit. Its result is counted as an unknown error by
    /// category but not as a network check.
    pub fn record_duplicate(&self) {
        let mut stats = self.lock();
        stats.duplicates += 1;
        *stats
            .errors_by_category
            .entry(ErrorCategory::Unknown)
            .or_insert(0) += 1;
    }

    /// Current counters with `total_time` refreshed.
    pub fn snapshot(&self) -> CheckerRunStats {
        let carried = *self.carried_secs.lock().unwrap_or_else(|e| e.into_inner());
        let mut stats = self.lock().clone();
        stats.total_time = carried + self.started.elapsed().as_secs_f64();
        stats
    }

    /// Replaces the counters with ones loaded from a checkpoint.
    pub fn restore(&self, previous: CheckerRunStats) {
        *self.carried_secs.lock().unwrap_or_else(|e| e.into_inner()) = previous.total_time;
        *self.lock() = previous;
    }

    /// Puts the counters back to an earlier snapshot of this same run.
    /// Unlike [`restore`](Self::restore) the elapsed time keeps running.
    pub fn rewind(&self, snapshot: CheckerRunStats) {
        let mut stats = self.lock();
        let start_time = stats.start_time;
        *stats = CheckerRunStats {
            start_time,
            ..snapshot
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error_handling::TransportError;

    fn response(code: u16) -> CheckResult {
        CheckResult::from_response("a", "https://a.com", code, String::new(), 0.1, 0, 0)
    }

    #[test]
    fn test_record_counts_by_outcome() {
        let recorder = StatsRecorder::new();
        recorder.record(&response(200));
        recorder.record(&response(200));
        recorder.record(&response(404));
        recorder.record(&CheckResult::from_transport_error(
            "a",
            "https://a.com",
            &TransportError::Timeout,
            1.0,
            0,
            2,
        ));
        recorder.record(&CheckResult::from_transport_error(
            "a",
            "https://a.com",
            &TransportError::Tls("bad".into()),
            1.0,
            0,
            2,
        ));
        recorder.record(&CheckResult::invalid(
            "x",
            &crate::error_handling::NormalizeError::Empty,
            0,
        ));
        recorder.record_duplicate();

        let stats = recorder.snapshot();
        assert_eq!(stats.total_checked, 5);
        assert_eq!(stats.active_found, 2);
        assert_eq!(stats.inactive_found, 1);
        assert_eq!(stats.timeouts, 1);
        assert_eq!(stats.errors, 1);
        assert_eq!(stats.invalid_urls, 1);
        assert_eq!(stats.duplicates, 1);
        assert_eq!(stats.errors_by_category[&ErrorCategory::HttpStatus], 1);
        assert_eq!(stats.errors_by_category[&ErrorCategory::Tls], 1);
        assert_eq!(stats.errors_by_category[&ErrorCategory::Unknown], 1);
        assert!((stats.success_rate() - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_rates_with_no_checks() {
        let stats = CheckerRunStats::default();
        assert_eq!(stats.success_rate(), 0.0);
        assert_eq!(stats.checks_per_second(), 0.0);
    }

    #[test]
    fn test_restore_carries_counters_and_time() {
        let recorder = StatsRecorder::new();
        recorder.restore(CheckerRunStats {
            total_checked: 10,
            active_found: 7,
            start_time: 42,
            total_time: 100.0,
            ..Default::default()
        });
        recorder.record(&response(200));
        let stats = recorder.snapshot();
        assert_eq!(stats.total_checked, 11);
        assert_eq!(stats.active_found, 8);
        assert_eq!(stats.start_time, 42);
        assert!(stats.total_time >= 100.0);
    }

    #[test]
    fn test_rewind_drops_later_counts() {
        let recorder = StatsRecorder::new();
        recorder.record(&response(200));
        let committed = recorder.snapshot();
        recorder.record(&response(200));
        recorder.record(&response(500));

        recorder.rewind(committed.clone());
        let stats = recorder.snapshot();
        assert_eq!(stats.total_checked, 1);
        assert_eq!(stats.active_found, 1);
        assert_eq!(stats.inactive_found, 0);
        assert!(stats.errors_by_category.is_empty());
        assert_eq!(stats.start_time, committed.start_time);
        assert!(stats.total_time >= committed.total_time);
    }

    #[test]
    fn test_stats_json_field_names() {
        let json = serde_json::to_value(CheckerRunStats::default()).unwrap();
        for field in [
            "total_checked",
            "active_found",
            "inactive_found",
            "errors",
            "timeouts",
            "invalid_urls",
            "start_time",
            "total_time",
        ] {
            assert!(json.get(field).is_some(), "missing {field}");
        }
    }
}
