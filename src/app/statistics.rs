//! Final statistics printing.

use log::info;
use strum::IntoEnumIterator;

use crate::batch::ProcessingStats;
use crate::checker::CheckerRunStats;
use crate::error_handling::ErrorCategory;

/// Prints per-category failure counts.
pub fn print_error_statistics(stats: &CheckerRunStats) {
    let total: u64 = stats.errors_by_category.values().sum();
    if total == 0 {
        return;
    }
    info!("Failure Counts ({} total):", total);
    for category in ErrorCategory::iter() {
        let count = stats.errors_by_category.get(&category).copied().unwrap_or(0);
        if count > 0 {
            info!("   {} ({}): {}", category.label(), category.as_str(), count);
        }
    }
}

/// Prints the end-of-run summary.
pub fn print_final_statistics(stats: &ProcessingStats, checker_stats: &CheckerRunStats) {
    info!(
        "Processing complete: {} URLs in {:.1}s ({:.1} URLs/sec)",
        stats.processed_urls, stats.elapsed_time, stats.processing_rate
    );
    info!(
        "   Active: {} | Inactive: {} | Errors: {} | Success rate: {:.2}%",
        stats.active_websites,
        stats.inactive_websites,
        stats.error_websites,
        stats.success_rate()
    );
    if checker_stats.duplicates > 0 || checker_stats.invalid_urls > 0 {
        info!(
            "   Skipped: {} invalid, {} duplicate",
            checker_stats.invalid_urls, checker_stats.duplicates
        );
    }
    print_error_statistics(checker_stats);
}
