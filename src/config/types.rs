//! Configuration types.
//!
//! This module defines the run configuration consumed by the library and the
//! enums shared by the CLI (log level, log format, output format).

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::ValueEnum;
use serde::Serialize;

use crate::config::constants::*;
use crate::error_handling::ConfigError;

/// Logging level for the application.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace).
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: Structured JSON format for machine parsing
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// Encoding of the results file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Comma-separated values with a header row
    Csv,
    /// A single JSON array, kept valid after every chunk
    Json,
    /// One JSON object per line
    Jsonl,
}

impl OutputFormat {
    /// Infers the format from a file extension, defaulting to CSV.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("json") => OutputFormat::Json,
            Some("jsonl") | Some("ndjson") => OutputFormat::Jsonl,
            _ => OutputFormat::Csv,
        }
    }
}

/// Configuration for one batch run.
///
/// Immutable for the lifetime of a [`BatchProcessor`](crate::BatchProcessor);
/// [`BatchConfig::validate`] is called before any check is issued.
///
/// # Examples
///
/// ```
/// use site_status::BatchConfig;
///
/// let config = BatchConfig {
///     batch_size: 500,
///     max_concurrent: 50,
///     include_errors: true,
///     ..Default::default()
/// };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct BatchConfig {
    /// Number of URLs read per chunk
    pub batch_size: usize,
    /// Maximum number of checks in flight at once
    pub max_concurrent: usize,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Retries after the initial attempt
    pub retry_count: u32,
    /// Delay before the first retry, in seconds
    pub retry_delay_secs: f64,
    /// Multiplier applied to the delay for each further retry
    pub backoff_factor: f64,
    /// Verify TLS certificates
    pub verify_ssl: bool,
    /// Chunks between checkpoint writes
    pub save_interval: usize,
    /// Write inactive (non-200) results to the output
    pub include_inactive: bool,
    /// Write error, timeout, and invalid-URL results to the output
    pub include_errors: bool,
    /// Stream the input instead of loading it into memory
    pub memory_efficient: bool,
    /// Resume from an existing checkpoint
    pub resume: bool,
    /// Checkpoint location (defaults to `<output>.progress.json`)
    pub checkpoint_path: Option<PathBuf>,
    /// HTTP User-Agent header value
    pub user_agent: String,
    /// Reject private addresses at connection time, after DNS resolution
    pub block_private_resolution: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            retry_count: DEFAULT_RETRY_COUNT,
            retry_delay_secs: DEFAULT_RETRY_DELAY_SECS,
            backoff_factor: DEFAULT_BACKOFF_FACTOR,
            verify_ssl: true,
            save_interval: DEFAULT_SAVE_INTERVAL,
            include_inactive: true,
            include_errors: false,
            memory_efficient: true,
            resume: false,
            checkpoint_path: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            block_private_resolution: false,
        }
    }
}

impl BatchConfig {
    /// Checks every numeric setting against its documented bounds.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_range("batch_size", self.batch_size, 1, MAX_BATCH_SIZE)?;
        check_range("max_concurrent", self.max_concurrent, 1, MAX_CONCURRENT_LIMIT)?;
        check_range(
            "timeout",
            self.timeout_secs,
            MIN_TIMEOUT_SECS,
            MAX_TIMEOUT_SECS,
        )?;
        check_range("retry_count", self.retry_count, 0, MAX_RETRY_COUNT)?;

        let max_delay = MAX_RETRY_DELAY_SECS as f64;
        if !(0.0..=max_delay).contains(&self.retry_delay_secs) {
            return Err(ConfigError::OutOfRange {
                field: "retry_delay",
                value: self.retry_delay_secs.to_string(),
                expected: format!("between 0 and {max_delay} seconds"),
            });
        }
        if !(1.0..=MAX_BACKOFF_FACTOR).contains(&self.backoff_factor) {
            return Err(ConfigError::OutOfRange {
                field: "backoff_factor",
                value: self.backoff_factor.to_string(),
                expected: format!("between 1.0 and {MAX_BACKOFF_FACTOR}"),
            });
        }
        if self.save_interval < 1 {
            return Err(ConfigError::OutOfRange {
                field: "save_interval",
                value: self.save_interval.to_string(),
                expected: "at least 1".to_string(),
            });
        }
        if self.user_agent.trim().is_empty() {
            return Err(ConfigError::OutOfRange {
                field: "user_agent",
                value: String::new(),
                expected: "a non-empty string".to_string(),
            });
        }
        Ok(())
    }

    /// Per-request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Delay before the first retry. Only meaningful after [`validate`](Self::validate).
    pub fn retry_delay(&self) -> Duration {
        Duration::try_from_secs_f64(self.retry_delay_secs).unwrap_or_default()
    }

    /// Returns the configured checkpoint path, or `<output>.progress.json`.
    pub fn checkpoint_path_for(&self, output: &Path) -> PathBuf {
        self.checkpoint_path.clone().unwrap_or_else(|| {
            let mut name = output.as_os_str().to_owned();
            name.push(CHECKPOINT_SUFFIX);
            PathBuf::from(name)
        })
    }
}

/// Everything a single command-line run needs: where to read, where to write,
/// and how to check.
#[derive(Debug, Clone)]
pub struct CheckJob {
    /// Input file, or `-` for stdin
    pub input: PathBuf,
    /// Results file
    pub output: PathBuf,
    /// CSV column holding the URLs
    pub url_column: String,
    /// Output encoding; inferred from `output` when `None`
    pub format: Option<OutputFormat>,
    /// Optional JSON processing report
    pub report: Option<PathBuf>,
    /// Batch settings
    pub config: BatchConfig,
}

impl CheckJob {
    /// Output encoding, explicit or inferred from the output extension.
    pub fn output_format(&self) -> OutputFormat {
        self.format
            .unwrap_or_else(|| OutputFormat::from_path(&self.output))
    }
}

fn check_range<T>(field: &'static str, value: T, min: T, max: T) -> Result<(), ConfigError>
where
    T: PartialOrd + std::fmt::Display,
{
    if value < min || value > max {
        return Err(ConfigError::OutOfRange {
            field,
            value: value.to_string(),
            expected: format!("between {min} and {max}"),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_conversion() {
        assert_eq!(
            log::LevelFilter::from(LogLevel::Error),
            log::LevelFilter::Error
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Warn),
            log::LevelFilter::Warn
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Info),
            log::LevelFilter::Info
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Debug),
            log::LevelFilter::Debug
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Trace),
            log::LevelFilter::Trace
        );
    }

    #[test]
    fn test_batch_config_default_is_valid() {
        let config = BatchConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.batch_size, 1000);
        assert_eq!(config.max_concurrent, 100);
        assert_eq!(config.timeout_secs, 10);
        assert_eq!(config.retry_count, 2);
        assert!(config.verify_ssl);
        assert!(config.include_inactive);
        assert!(!config.include_errors);
        assert!(config.memory_efficient);
    }

    #[test]
    fn test_batch_config_rejects_zero_concurrency() {
        let config = BatchConfig {
            max_concurrent: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_concurrent"));
    }

    #[test]
    fn test_batch_config_rejects_excessive_values() {
        let cases = [
            BatchConfig {
                max_concurrent: 10_001,
                ..Default::default()
            },
            BatchConfig {
                batch_size: 100_001,
                ..Default::default()
            },
            BatchConfig {
                timeout_secs: 301,
                ..Default::default()
            },
            BatchConfig {
                timeout_secs: 0,
                ..Default::default()
            },
            BatchConfig {
                retry_count: 11,
                ..Default::default()
            },
            BatchConfig {
                backoff_factor: 0.5,
                ..Default::default()
            },
            BatchConfig {
                retry_delay_secs: -1.0,
                ..Default::default()
            },
            BatchConfig {
                retry_delay_secs: 1e300,
                ..Default::default()
            },
            BatchConfig {
                retry_delay_secs: f64::NAN,
                ..Default::default()
            },
            BatchConfig {
                backoff_factor: 1e9,
                ..Default::default()
            },
            BatchConfig {
                save_interval: 0,
                ..Default::default()
            },
        ];
        for config in cases {
            assert!(config.validate().is_err(), "{config:?} should be rejected");
        }
    }

    #[test]
    fn test_batch_config_accepts_bounds() {
        let config = BatchConfig {
            max_concurrent: 10_000,
            batch_size: 1,
            timeout_secs: 300,
            retry_count: 0,
            retry_delay_secs: 0.0,
            backoff_factor: 1.0,
            ..Default::default()
        };
        assert!(config.validate().is_ok());

        let config = BatchConfig {
            retry_delay_secs: 300.0,
            backoff_factor: 10.0,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_retry_delay_conversion() {
        let config = BatchConfig {
            retry_delay_secs: 0.25,
            ..Default::default()
        };
        assert_eq!(config.retry_delay(), Duration::from_millis(250));
    }

    #[test]
    fn test_checkpoint_path_defaults_next_to_output() {
        let config = BatchConfig::default();
        assert_eq!(
            config.checkpoint_path_for(Path::new("out/results.csv")),
            PathBuf::from("out/results.csv.progress.json")
        );

        let config = BatchConfig {
            checkpoint_path: Some(PathBuf::from("custom.json")),
            ..Default::default()
        };
        assert_eq!(
            config.checkpoint_path_for(Path::new("results.csv")),
            PathBuf::from("custom.json")
        );
    }

    #[test]
    fn test_output_format_from_path() {
        assert_eq!(OutputFormat::from_path(Path::new("a.csv")), OutputFormat::Csv);
        assert_eq!(OutputFormat::from_path(Path::new("a.JSON")), OutputFormat::Json);
        assert_eq!(OutputFormat::from_path(Path::new("a.jsonl")), OutputFormat::Jsonl);
        assert_eq!(OutputFormat::from_path(Path::new("a")), OutputFormat::Csv);
    }
}
