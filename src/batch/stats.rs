//! Batch-level progress statistics.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::checker::{CheckOutcome, CheckResult, CheckerRunStats};
use crate::utils::format_hms;

/// Progress of one batch run, refreshed after every chunk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessingStats {
    /// URLs in the input, when known (zero for stdin)
    pub total_input_urls: u64,
    pub batches_processed: u64,
    pub total_batches: u64,
    /// Input rows consumed so far, including rows skipped on resume
    pub processed_urls: u64,
    pub active_websites: u64,
    pub inactive_websites: u64,
    /// Error, timeout, and invalid outcomes
    pub error_websites: u64,
    /// URLs per second over this session
    pub processing_rate: f64,
    /// `HH:MM:SS`, or empty when the total is unknown
    pub estimated_completion: String,
    /// Seconds spent in this session
    pub elapsed_time: f64,
}

impl ProcessingStats {
    /// Stats for a run over `total_input_urls` URLs (zero if unknown).
    pub fn new(total_input_urls: u64, batch_size: usize) -> Self {
        let batch_size = batch_size.max(1) as u64;
        Self {
            total_input_urls,
            total_batches: total_input_urls.div_ceil(batch_size),
            ..Default::default()
        }
    }

    pub fn completion_percentage(&self) -> f64 {
        if self.total_batches == 0 {
            return 0.0;
        }
        self.batches_processed as f64 / self.total_batches as f64 * 100.0
    }

    /// Active share of all URLs with a recorded outcome.
    pub fn success_rate(&self) -> f64 {
        let total = self.active_websites + self.inactive_websites + self.error_websites;
        if total == 0 {
            return 0.0;
        }
        self.active_websites as f64 / total as f64 * 100.0
    }

    /// Counts one chunk's results.
    pub fn record_chunk(&mut self, results: &[CheckResult]) {
        for result in results {
            match result.status_result {
                CheckOutcome::Active => self.active_websites += 1,
                CheckOutcome::Inactive => self.inactive_websites += 1,
                CheckOutcome::Error | CheckOutcome::Timeout | CheckOutcome::InvalidUrl => {
                    self.error_websites += 1
                }
            }
        }
        self.processed_urls += results.len() as u64;
        self.batches_processed += 1;
    }

    /// Seeds the outcome counters from checker stats restored on resume.
    pub fn restore_from(&mut self, checker: &CheckerRunStats, rows: u64, batches: u64) {
        self.active_websites = checker.active_found;
        self.inactive_websites = checker.inactive_found;
        self.error_websites =
            checker.errors + checker.timeouts + checker.invalid_urls + checker.duplicates;
        self.processed_urls = rows;
        self.batches_processed = batches;
    }

    /// Refreshes rate and ETA. `session_processed` counts only URLs checked
    /// since this process started.
    pub fn update_timing(&mut self, elapsed: Duration, session_processed: u64) {
        self.elapsed_time = elapsed.as_secs_f64();
        if self.elapsed_time > 0.0 {
            self.processing_rate = session_processed as f64 / self.elapsed_time;
        }
        if self.total_input_urls > 0 && self.processing_rate > 0.0 {
            let remaining = self.total_input_urls.saturating_sub(self.processed_urls);
            let eta = remaining as f64 / self.processing_rate;
            self.estimated_completion = format_hms(Duration::from_secs_f64(eta));
        }
    }
}
