//! Command-line options.

use std::path::PathBuf;

use clap::{ArgAction, Parser};

use crate::config::constants::*;
use crate::config::types::{BatchConfig, CheckJob, LogFormat, LogLevel, OutputFormat};

/// Command-line options for the `site_status` binary.
///
/// Every tuning flag can also be set through an environment variable (or a
/// `.env` file), which is handy for container deployments.
///
/// # Examples
///
/// ```bash
/// # Basic usage
/// site_status urls.csv -o results.csv
///
/// # Plain text input, active sites only, higher concurrency
/// site_status urls.txt -o live.jsonl --active-only --concurrent 500
///
/// # Resume an interrupted run
/// site_status urls.csv -o results.csv --resume
/// ```
#[derive(Debug, Parser)]
#[command(
    name = "site_status",
    version,
    about = "Checks large lists of URLs for liveness and classifies failures by cause."
)]
pub struct Opt {
    /// Input file (CSV with a header row, or plain text with one URL per line; `-` for stdin)
    #[arg(value_parser)]
    pub file: PathBuf,

    /// Output file path
    #[arg(long, short = 'o', default_value = "site_status_results.csv")]
    pub output: PathBuf,

    /// Column name containing URLs (CSV input only)
    #[arg(long, default_value = "url")]
    pub url_column: String,

    /// Write a JSON processing report to this path
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Number of URLs per batch
    #[arg(long, env = "DEFAULT_BATCH_SIZE", default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,

    /// Maximum concurrent requests
    #[arg(long, env = "DEFAULT_CONCURRENT", default_value_t = DEFAULT_MAX_CONCURRENT)]
    pub concurrent: usize,

    /// Per-request timeout in seconds
    #[arg(long, env = "DEFAULT_TIMEOUT", default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout: u64,

    /// Number of retries after the first attempt
    #[arg(long, env = "DEFAULT_RETRY_COUNT", default_value_t = DEFAULT_RETRY_COUNT)]
    pub retry_count: u32,

    /// Delay before the first retry, in seconds
    #[arg(long, env = "DEFAULT_RETRY_DELAY", default_value_t = DEFAULT_RETRY_DELAY_SECS)]
    pub retry_delay: f64,

    /// Multiplier applied to the retry delay for each further retry
    #[arg(long, env = "DEFAULT_BACKOFF_FACTOR", default_value_t = DEFAULT_BACKOFF_FACTOR)]
    pub backoff_factor: f64,

    /// Save a checkpoint every N batches
    #[arg(long, env = "DEFAULT_SAVE_INTERVAL", default_value_t = DEFAULT_SAVE_INTERVAL)]
    pub save_interval: usize,

    /// Include inactive (non-200) websites in results
    #[arg(long)]
    pub include_inactive: bool,

    /// Include error, timeout, and invalid-URL results
    #[arg(long)]
    pub include_errors: bool,

    /// Only output active websites (overrides the include options)
    #[arg(long)]
    pub active_only: bool,

    /// Read the whole input into memory instead of streaming it
    #[arg(long)]
    pub no_memory_efficient: bool,

    /// Resume an interrupted run from its checkpoint
    #[arg(long)]
    pub resume: bool,

    /// Checkpoint path (default: `<output>.progress.json`)
    #[arg(long)]
    pub checkpoint: Option<PathBuf>,

    /// Output format: csv|json|jsonl (default: inferred from the output extension)
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Disable TLS certificate verification (use only for testing)
    #[arg(long)]
    pub disable_ssl_verify: bool,

    #[arg(
        long,
        env = "SSL_VERIFY_DEFAULT",
        default_value_t = true,
        action = ArgAction::Set,
        hide = true
    )]
    pub ssl_verify_default: bool,

    /// Reject private addresses after DNS resolution, not just literal ones
    #[arg(long)]
    pub block_private_resolution: bool,

    /// HTTP User-Agent header value
    #[arg(long, env = "USER_AGENT", default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,

    /// Log level: error|warn|info|debug|trace
    #[arg(long, value_enum, env = "LOG_LEVEL", default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    /// Log format: plain|json
    #[arg(long, value_enum, env = "LOG_FORMAT", default_value_t = LogFormat::Plain)]
    pub log_format: LogFormat,

    /// Suppress everything except warnings and errors
    #[arg(long, short = 'q')]
    pub quiet: bool,
}

impl Opt {
    /// Log level after applying `--quiet`.
    pub fn effective_log_level(&self) -> LogLevel {
        if self.quiet {
            LogLevel::Warn
        } else {
            self.log_level.clone()
        }
    }

    /// Converts parsed options into a [`CheckJob`]. Bounds are checked later by
    /// [`BatchConfig::validate`].
    pub fn into_job(self) -> CheckJob {
        let config = BatchConfig {
            batch_size: self.batch_size,
            max_concurrent: self.concurrent,
            timeout_secs: self.timeout,
            retry_count: self.retry_count,
            retry_delay_secs: self.retry_delay,
            backoff_factor: self.backoff_factor,
            verify_ssl: self.ssl_verify_default && !self.disable_ssl_verify,
            save_interval: self.save_interval,
            include_inactive: self.include_inactive && !self.active_only,
            include_errors: self.include_errors && !self.active_only,
            memory_efficient: !self.no_memory_efficient,
            resume: self.resume,
            checkpoint_path: self.checkpoint,
            user_agent: self.user_agent,
            block_private_resolution: self.block_private_resolution,
        };

        CheckJob {
            input: self.file,
            output: self.output,
            url_column: self.url_column,
            format: self.format,
            report: self.report,
            config,
        }
    }
}
