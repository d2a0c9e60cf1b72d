//! End-of-run JSON report.

use std::fs;
use std::path::Path;

use log::info;
use serde_json::{json, Value};

use super::stats::ProcessingStats;
use crate::checker::CheckerRunStats;
use crate::config::BatchConfig;
use crate::error_handling::OutputError;
use crate::utils::now_millis;

/// Builds the report document.
pub fn generate_report(
    stats: &ProcessingStats,
    config: &BatchConfig,
    checker_stats: &CheckerRunStats,
) -> Value {
    json!({
        "processing_summary": {
            "total_input_urls": stats.total_input_urls,
            "processed_urls": stats.processed_urls,
            "active_websites": stats.active_websites,
            "inactive_websites": stats.inactive_websites,
            "error_websites": stats.error_websites,
            "success_rate": format!("{:.2}%", stats.success_rate()),
            "processing_time": format!("{:.2} minutes", stats.elapsed_time / 60.0),
            "processing_rate": format!("{:.2} URLs/second", stats.processing_rate),
        },
        "configuration": config,
        "checker_stats": checker_stats,
        "timestamp": now_millis(),
    })
}

/// Writes the report as pretty JSON.
pub fn write_report(
    path: &Path,
    stats: &ProcessingStats,
    config: &BatchConfig,
    checker_stats: &CheckerRunStats,
) -> Result<(), OutputError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let report = generate_report(stats, config, checker_stats);
    fs::write(path, serde_json::to_string_pretty(&report)?)?;
    info!("Processing report saved to {}", path.display());
    Ok(())
}
