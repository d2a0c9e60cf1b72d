//! site_status library: bulk website liveness checking
//!
//! This library checks large lists of URLs for liveness. Every input is
//! normalized and screened against internal targets, fetched with retries and
//! exponential backoff, and classified as active, inactive, or failed by
//! cause. Large inputs are streamed in chunks with a bounded number of
//! requests in flight, and long runs can be resumed from a checkpoint.
//!
//! # Example
//!
//! ```no_run
//! use site_status::{run_check, BatchConfig, CheckJob};
//! use tokio_util::sync::CancellationToken;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let job = CheckJob {
//!     input: "urls.csv".into(),
//!     output: "results.csv".into(),
//!     url_column: "url".to_string(),
//!     format: None,
//!     report: None,
//!     config: BatchConfig {
//!         max_concurrent: 50,
//!         ..Default::default()
//!     },
//! };
//!
//! let summary = run_check(job, CancellationToken::new()).await?;
//! println!("{} active of {} checked",
//!          summary.stats.active_websites, summary.stats.processed_urls);
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime. Use `#[tokio::main]` in your application
//! or ensure you're calling library functions within an async context.

mod app;
pub mod batch;
mod checker;
pub mod config;
mod error_handling;
pub mod initialization;
mod security;
mod utils;

// Re-export public API
pub use app::{normalize_url, shutdown_gracefully, spawn_ctrl_c_handler, NormalizedUrl};
pub use batch::{should_include, BatchProcessor, ProcessingStats, ProgressCheckpoint};
pub use checker::{
    CheckOutcome, CheckResult, CheckerRunStats, HttpProbe, ReqwestTransport, StatusChecker,
    Transport,
};
pub use config::{BatchConfig, CheckJob, LogFormat, LogLevel, Opt, OutputFormat};
pub use error_handling::{
    ConfigError, ErrorCategory, InitializationError, InputError, NormalizeError, OutputError,
    TransportError,
};
pub use run::{run_check, RunSummary};
pub use security::is_blocked_ip;

// Internal run module (wires a CLI job to the batch processor)
mod run {
    use std::path::PathBuf;

    use anyhow::{Context, Result};
    use log::{info, warn};
    use tokio_util::sync::CancellationToken;

    use crate::app::print_final_statistics;
    use crate::batch::{BatchProcessor, ProcessingStats};
    use crate::checker::CheckerRunStats;
    use crate::config::CheckJob;

    /// Results of a check run.
    #[derive(Debug, Clone)]
    pub struct RunSummary {
        /// Batch-level counters and timing
        pub stats: ProcessingStats,
        /// Checker counters, including per-category failures
        pub checker_stats: CheckerRunStats,
        /// Where results were written
        pub output: PathBuf,
        /// Where the checkpoint was written
        pub checkpoint: PathBuf,
        /// True when the run stopped early on cancellation
        pub cancelled: bool,
    }

    /// Runs a check job to completion or cancellation.
    ///
    /// Reads URLs from `job.input`, checks them in chunks, writes the kept
    /// results to `job.output`, and writes the processing report when
    /// `job.report` is set. Cancelling `cancel` stops the run after in-flight
    /// checks settle; the summary then has `cancelled` set and the checkpoint
    /// allows a later `resume`.
    ///
    /// # Errors
    ///
    /// This function will return an error if:
    /// - The configuration is out of range
    /// - The HTTP client cannot be built
    /// - The input cannot be read or lacks the URL column
    /// - The output or report cannot be written
    pub async fn run_check(job: CheckJob, cancel: CancellationToken) -> Result<RunSummary> {
        let format = job.output_format();
        let checkpoint = job.config.checkpoint_path_for(&job.output);
        info!(
            "Checking URLs from {} (batch size {}, concurrency {}, timeout {}s, retries {})",
            job.input.display(),
            job.config.batch_size,
            job.config.max_concurrent,
            job.config.timeout_secs,
            job.config.retry_count
        );

        let mut processor = BatchProcessor::new(job.config)?
            .with_cancellation(cancel.clone())
            .with_checkpoint(&checkpoint);

        let stats = processor
            .process_file(&job.input, &job.output, &job.url_column, format)
            .await
            .context("Batch processing failed")?;

        if let Some(report) = &job.report {
            processor.write_report(report)?;
        }

        let checker_stats = processor.checker().stats();
        let cancelled = cancel.is_cancelled();
        if cancelled {
            warn!(
                "Stopped early; rerun with --resume to continue from {}",
                checkpoint.display()
            );
        } else {
            print_final_statistics(&stats, &checker_stats);
        }

        Ok(RunSummary {
            stats,
            checker_stats,
            output: job.output,
            checkpoint,
            cancelled,
        })
    }
}
