//! Chunked batch processing.
//!
//! A [`BatchProcessor`] streams URLs from a [`UrlSource`] in chunks of
//! `batch_size`, checks each chunk with a shared [`StatusChecker`], writes the
//! filtered results to a [`ResultSink`], and keeps a resume checkpoint next to
//! the output. Chunks run strictly one after another; concurrency lives inside
//! a chunk.

mod checkpoint;
pub mod input;
pub mod output;
mod report;
mod stats;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use log::{debug, info, warn};
use tokio_util::sync::CancellationToken;

use crate::app::log_progress;
use crate::checker::{CheckOutcome, CheckResult, CheckerRunStats, StatusChecker, Transport};
use crate::config::{BatchConfig, OutputFormat, INTER_BATCH_PAUSE, PROGRESS_LOG_DIVISOR};
use crate::utils::now_millis;

pub use checkpoint::ProgressCheckpoint;
pub use input::{count_records, open_source, CsvSource, InMemorySource, TextSource, UrlSource};
pub use output::{open_sink, CsvSink, JsonArraySink, JsonlSink, ResultSink, VecSink};
pub use report::{generate_report, write_report};
pub use stats::ProcessingStats;

/// Whether a result belongs in the output under `config`'s filters.
///
/// Active results are always kept. Inactive ones need `include_inactive`;
/// errors, timeouts, and invalid URLs need `include_errors`.
pub fn should_include(result: &CheckResult, config: &BatchConfig) -> bool {
    match result.status_result {
        CheckOutcome::Active => true,
        CheckOutcome::Inactive => config.include_inactive,
        CheckOutcome::Error | CheckOutcome::Timeout | CheckOutcome::InvalidUrl => {
            config.include_errors
        }
    }
}

/// Where a resumed run picks up.
#[derive(Debug, Clone)]
struct ResumePoint {
    rows: u64,
    batches: u64,
    checkpoint: ProgressCheckpoint,
}

/// Checker counters as of the last chunk that reached the sink.
#[derive(Debug, Clone)]
struct Committed {
    stats: CheckerRunStats,
    checked_urls: usize,
}

/// Drives one batch run.
pub struct BatchProcessor {
    config: BatchConfig,
    checker: Arc<StatusChecker>,
    cancel: CancellationToken,
    checkpoint_path: Option<PathBuf>,
    stats: ProcessingStats,
}

impl BatchProcessor {
    /// Validates `config` and builds a checker with a real HTTP client.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is out of range or the HTTP
    /// client cannot be built.
    pub fn new(config: BatchConfig) -> Result<Self> {
        config.validate().context("Invalid batch configuration")?;
        let checker = StatusChecker::new(&config).context("Failed to initialize status checker")?;
        Ok(Self::from_parts(config, Arc::new(checker)))
    }

    /// Like [`new`](Self::new) but sends requests through `transport`.
    pub fn with_transport(config: BatchConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        config.validate().context("Invalid batch configuration")?;
        let checker = StatusChecker::with_transport(&config, transport);
        Ok(Self::from_parts(config, Arc::new(checker)))
    }

    fn from_parts(config: BatchConfig, checker: Arc<StatusChecker>) -> Self {
        let checkpoint_path = config.checkpoint_path.clone();
        Self {
            stats: ProcessingStats::new(0, config.batch_size),
            config,
            checker,
            cancel: CancellationToken::new(),
            checkpoint_path,
        }
    }

    /// Uses `cancel` to stop the run. Defaults to a token nobody cancels.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Writes checkpoints to `path` and resumes from it when `resume` is set.
    pub fn with_checkpoint(mut self, path: impl Into<PathBuf>) -> Self {
        self.checkpoint_path = Some(path.into());
        self
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    pub fn checker(&self) -> &Arc<StatusChecker> {
        &self.checker
    }

    pub fn stats(&self) -> &ProcessingStats {
        &self.stats
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Processes every URL in `source`, writing kept results to `sink`.
    ///
    /// Resumes from the checkpoint when configured. The caller is responsible
    /// for opening `sink` in append mode when resuming.
    ///
    /// # Errors
    ///
    /// Fails only when reading the source or writing the sink fails.
    pub async fn process_input(
        &mut self,
        source: &mut dyn UrlSource,
        sink: &mut dyn ResultSink,
    ) -> Result<ProcessingStats> {
        let resume = self.load_resume_point();
        let total = source.len_hint();
        self.run(source, sink, total, resume).await
    }

    /// Reads `input`, checks every URL, and writes results to `output`.
    ///
    /// The checkpoint defaults to `<output>.progress.json`. A resumed run
    /// appends to the existing output instead of truncating it.
    ///
    /// # Errors
    ///
    /// Returns an error if the input cannot be read (including a missing URL
    /// column) or the output cannot be written.
    pub async fn process_file(
        &mut self,
        input: &Path,
        output: &Path,
        url_column: &str,
        format: OutputFormat,
    ) -> Result<ProcessingStats> {
        if self.checkpoint_path.is_none() {
            self.checkpoint_path = Some(self.config.checkpoint_path_for(output));
        }

        let mut source = open_source(input, url_column)
            .with_context(|| format!("Failed to open input {}", input.display()))?;
        let total = count_records(input, url_column)
            .with_context(|| format!("Failed to count URLs in {}", input.display()))?;
        match total {
            Some(total) => info!("Total URLs in {}: {total}", input.display()),
            None => info!("Reading URLs from stdin"),
        }

        let resume = self.load_resume_point();
        let mut sink = open_sink(output, format, resume.is_some());
        let stats = self
            .run(source.as_mut(), sink.as_mut(), total, resume)
            .await?;
        info!("Results written to {}", output.display());
        Ok(stats)
    }

    /// Writes the JSON processing report for the current state.
    pub fn write_report(&self, path: &Path) -> Result<()> {
        write_report(path, &self.stats, &self.config, &self.checker.stats())
            .with_context(|| format!("Failed to write report {}", path.display()))
    }

    fn load_resume_point(&self) -> Option<ResumePoint> {
        if !self.config.resume {
            return None;
        }
        let path = self.checkpoint_path.as_deref()?;
        match ProgressCheckpoint::load(path) {
            Some(checkpoint) => Some(ResumePoint {
                rows: checkpoint.rows_to_skip(self.config.batch_size),
                batches: checkpoint.processed_batches,
                checkpoint,
            }),
            None => {
                info!("No checkpoint at {}, starting fresh", path.display());
                None
            }
        }
    }

    async fn run(
        &mut self,
        source: &mut dyn UrlSource,
        sink: &mut dyn ResultSink,
        total: Option<u64>,
        resume: Option<ResumePoint>,
    ) -> Result<ProcessingStats> {
        let started = Instant::now();
        let batch_size = self.config.batch_size;

        let mut memory_source;
        let source: &mut dyn UrlSource = if self.config.memory_efficient {
            source
        } else {
            memory_source = InMemorySource::drain(source).context("Failed to read input")?;
            debug!("Loaded {} URLs into memory", memory_source.len());
            &mut memory_source
        };
        let total = total.or_else(|| source.len_hint());
        self.stats = ProcessingStats::new(total.unwrap_or(0), batch_size);

        if let Some(resume) = resume {
            let skipped = source
                .skip(resume.rows)
                .context("Failed to skip already processed rows")?;
            info!(
                "Resuming after {} completed batches ({skipped} rows skipped)",
                resume.batches
            );
            self.checker.restore_stats(resume.checkpoint.stats.clone());
            self.stats
                .restore_from(&resume.checkpoint.stats, skipped, resume.batches);
        }
        let mut committed = self.commit();
        self.save_checkpoint(self.stats.batches_processed, &committed);

        let progress_every = (self.stats.total_batches / PROGRESS_LOG_DIVISOR).max(1);
        let mut session_processed = 0u64;
        let mut cancelled = false;
        let mut batch_num = self.stats.batches_processed;

        loop {
            if self.cancel.is_cancelled() {
                cancelled = true;
                break;
            }
            let urls = source
                .next_chunk(batch_size)
                .context("Failed to read input")?;
            if urls.is_empty() {
                break;
            }
            batch_num += 1;
            debug!(
                "Processing batch {batch_num}/{} ({} URLs)",
                self.stats.total_batches,
                urls.len()
            );

            let Some(results) = self.checker.check_batch_until(urls, &self.cancel).await else {
                // The open chunk never reached the sink, so its checks do not count
                self.checker.rewind_stats(committed.stats.clone());
                cancelled = true;
                break;
            };

            let kept: Vec<CheckResult> = results
                .iter()
                .filter(|r| should_include(r, &self.config))
                .cloned()
                .collect();
            sink.write_chunk(&kept)
                .context("Failed to write results")?;
            committed = self.commit();

            session_processed += results.len() as u64;
            self.stats.record_chunk(&results);
            self.stats.update_timing(started.elapsed(), session_processed);

            let is_last = self.stats.total_batches > 0 && batch_num >= self.stats.total_batches;
            if batch_num % progress_every == 0 || is_last {
                log_progress(&self.stats);
            }
            if batch_num % self.config.save_interval as u64 == 0 {
                self.save_checkpoint(batch_num, &committed);
            }

            tokio::select! {
                _ = self.cancel.cancelled() => {}
                _ = tokio::time::sleep(INTER_BATCH_PAUSE) => {}
            }
        }

        sink.finish().context("Failed to finalize output")?;
        self.stats.update_timing(started.elapsed(), session_processed);
        self.save_checkpoint(self.stats.batches_processed, &committed);

        if cancelled {
            warn!(
                "Run cancelled after {} batches; the open batch was discarded",
                self.stats.batches_processed
            );
        } else {
            log_progress(&self.stats);
        }
        self.checker.log_stats();
        Ok(self.stats.clone())
    }

    fn commit(&self) -> Committed {
        Committed {
            stats: self.checker.stats(),
            checked_urls: self.checker.checked_urls_count(),
        }
    }

    /// Writes the checkpoint from `committed`, never from the live counters.
    /// Failures are logged, not fatal.
    fn save_checkpoint(&self, current_batch: u64, committed: &Committed) {
        let Some(path) = self.checkpoint_path.as_deref() else {
            return;
        };
        let mut stats = committed.stats.clone();
        stats.total_time = self.checker.stats().total_time;
        let checkpoint = ProgressCheckpoint {
            processed_batches: self.stats.batches_processed,
            current_batch,
            stats,
            checked_urls_count: committed.checked_urls,
            timestamp: now_millis(),
            processed_rows: Some(self.stats.processed_urls),
            batch_size: Some(self.config.batch_size),
        };
        match checkpoint.save(path) {
            Ok(()) => debug!("Checkpoint saved to {}", path.display()),
            Err(e) => warn!("Failed to save checkpoint {}: {e}", path.display()),
        }
    }
}

impl std::fmt::Debug for BatchProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchProcessor")
            .field("config", &self.config)
            .field("checkpoint_path", &self.checkpoint_path)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}
