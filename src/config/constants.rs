//! Configuration constants.
//!
//! Defaults, validation bounds, and operational limits used throughout the
//! checker and the batch orchestrator.

use std::time::Duration;

/// Default number of URLs read from the input per chunk.
pub const DEFAULT_BATCH_SIZE: usize = 1000;
/// Default cap on concurrently in-flight checks.
pub const DEFAULT_MAX_CONCURRENT: usize = 100;
/// Default per-request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
/// Default number of retries after the initial attempt.
pub const DEFAULT_RETRY_COUNT: u32 = 2;
/// Default delay before the first retry, in seconds.
pub const DEFAULT_RETRY_DELAY_SECS: f64 = 1.0;
/// Default multiplier applied to the retry delay after each attempt.
pub const DEFAULT_BACKOFF_FACTOR: f64 = 1.5;
/// Default number of chunks between checkpoint writes.
pub const DEFAULT_SAVE_INTERVAL: usize = 10;

// Validation bounds
pub const MAX_BATCH_SIZE: usize = 100_000;
pub const MAX_CONCURRENT_LIMIT: usize = 10_000;
pub const MIN_TIMEOUT_SECS: u64 = 1;
pub const MAX_TIMEOUT_SECS: u64 = 300;
pub const MAX_RETRY_COUNT: u32 = 10;
/// Ceiling for the configured retry delay and for any single backoff sleep.
pub const MAX_RETRY_DELAY_SECS: u64 = 300;
pub const MAX_BACKOFF_FACTOR: f64 = 10.0;

// Network operation timeouts
/// Upper bound for the TCP connect phase; the effective value is
/// `min(TCP_CONNECT_TIMEOUT_SECS, timeout)`.
pub const TCP_CONNECT_TIMEOUT_SECS: u64 = 5;
/// Idle pooled connections are closed after this many seconds.
pub const POOL_IDLE_TIMEOUT_SECS: u64 = 30;
/// Upper bound on idle pooled connections kept per host.
pub const POOL_MAX_IDLE_PER_HOST: usize = 10;

/// Default User-Agent string for HTTP requests.
///
/// Browser-like so that sites which reject unknown clients still answer with
/// their real status. Users can override this via `--user-agent` or the
/// `USER_AGENT` environment variable.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36 SiteStatus/1.0";

/// Accept header sent with every probe.
pub const DEFAULT_ACCEPT: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";
/// Accept-Language header sent with every probe.
pub const DEFAULT_ACCEPT_LANGUAGE: &str = "en-US,en;q=0.5";

// Redirect handling
/// Maximum number of redirect hops to follow
/// Prevents infinite redirect loops and excessive request chains
pub const MAX_REDIRECT_HOPS: usize = 10;

// URL validation
/// Maximum URL length (2048 characters), matching common browser and server limits.
pub const MAX_URL_LENGTH: usize = 2048;

// Error message size limits
/// Maximum error message length in characters.
/// Messages longer than this are truncated with a note about the original length.
pub const MAX_ERROR_MESSAGE_LENGTH: usize = 300;

// Batch orchestration
/// Pause between chunks so target servers and the host process get a breather.
pub const INTER_BATCH_PAUSE: Duration = Duration::from_millis(100);
/// Progress is logged roughly every `1 / PROGRESS_LOG_DIVISOR` of the total chunks.
pub const PROGRESS_LOG_DIVISOR: u64 = 20;
/// Suffix appended to the output path to derive the default checkpoint path.
pub const CHECKPOINT_SUFFIX: &str = ".progress.json";
