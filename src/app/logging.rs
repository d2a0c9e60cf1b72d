//! Progress logging utilities.

use log::info;

use crate::batch::ProcessingStats;

/// Builds the one-line progress message for `stats`.
pub fn progress_line(stats: &ProcessingStats) -> String {
    let total_urls = if stats.total_input_urls > 0 {
        stats.total_input_urls.to_string()
    } else {
        "?".to_string()
    };
    let eta = if stats.estimated_completion.is_empty() {
        "unknown"
    } else {
        stats.estimated_completion.as_str()
    };
    format!(
        "Progress: {}/{} batches ({:.1}%) | Processed: {}/{} URLs | Active: {} ({:.1}%) | Rate: {:.1} URLs/sec | ETA: {}",
        stats.batches_processed,
        stats.total_batches,
        stats.completion_percentage(),
        stats.processed_urls,
        total_urls,
        stats.active_websites,
        stats.success_rate(),
        stats.processing_rate,
        eta
    )
}

/// Logs progress information about batch processing.
pub fn log_progress(stats: &ProcessingStats) {
    info!("{}", progress_line(stats));
}
