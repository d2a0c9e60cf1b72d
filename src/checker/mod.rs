//! Per-URL status checking.
//!
//! A [`StatusChecker`] owns everything that is scoped to one run: the
//! transport (and with it the connection pool), the admission semaphore, the
//! dedup set of canonical URLs, and the counters. Each check walks the same
//! state machine:
//!
//! 1. normalize, rejecting invalid or unsafe input without any I/O
//! 2. claim the canonical URL in the dedup set
//! 3. GET with retries and exponential backoff on transport failures
//! 4. fold the last attempt into a [`CheckResult`] and record it

mod result;
mod stats;
mod transport;

use std::collections::HashSet;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use futures::stream::FuturesUnordered;
use futures::StreamExt;
use log::{debug, info, warn};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use crate::app::normalize_url;
use crate::config::BatchConfig;
use crate::error_handling::{retry_strategy, InitializationError, NormalizeError};
use crate::initialization::init_semaphore;
use crate::utils::now_millis;

pub use result::{CheckOutcome, CheckResult};
pub use stats::CheckerRunStats;
use stats::StatsRecorder;
pub use transport::{HttpProbe, ReqwestTransport, Transport};

/// Run-scoped URL status checker.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use site_status::{BatchConfig, StatusChecker};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let checker = Arc::new(StatusChecker::new(&BatchConfig::default())?);
/// let results = checker
///     .check_batch(vec!["example.com".to_string(), "mailto:x@y.z".to_string()])
///     .await;
/// assert_eq!(results.len(), 2);
/// # Ok(())
/// # }
/// ```
pub struct StatusChecker {
    transport: Arc<dyn Transport>,
    semaphore: Arc<Semaphore>,
    checked_urls: Mutex<HashSet<String>>,
    stats: StatsRecorder,
    retry_count: u32,
    retry_delay: Duration,
    backoff_factor: f64,
}

impl std::fmt::Debug for StatusChecker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatusChecker")
            .field("retry_count", &self.retry_count)
            .field("retry_delay", &self.retry_delay)
            .field("backoff_factor", &self.backoff_factor)
            .field("available_permits", &self.semaphore.available_permits())
            .finish_non_exhaustive()
    }
}

impl StatusChecker {
    /// Creates a checker backed by a `reqwest` client built from `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &BatchConfig) -> Result<Self, InitializationError> {
        let transport = ReqwestTransport::from_config(config)?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Creates a checker that sends its requests through `transport`.
    pub fn with_transport(config: &BatchConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            semaphore: init_semaphore(config.max_concurrent.max(1)),
            checked_urls: Mutex::new(HashSet::new()),
            stats: StatsRecorder::new(),
            retry_count: config.retry_count,
            retry_delay: config.retry_delay(),
            backoff_factor: config.backoff_factor,
        }
    }

    /// Checks one raw URL. Never fails: every problem becomes a classified result.
    pub async fn check(&self, raw: &str) -> CheckResult {
        let started = Instant::now();
        let timestamp = now_millis();

        let normalized = match normalize_url(raw) {
            Ok(normalized) => normalized,
            Err(e) => {
                if matches!(e, NormalizeError::UnsafeTarget(_)) {
                    warn!("Blocked unsafe URL '{}': {e}", raw.trim());
                } else {
                    debug!("Rejected URL '{}': {e}", raw.trim());
                }
                let result = CheckResult::invalid(raw, &e, timestamp);
                self.stats.record(&result);
                return result;
            }
        };
        let normalized = normalized.as_str();

        if !self.claim(normalized) {
            debug!("Skipping already processed URL: {normalized}");
            self.stats.record_duplicate();
            return CheckResult::duplicate(raw, normalized, timestamp);
        }

        let attempts = AtomicU32::new(0);
        let attempts_ref = &attempts;
        let transport = self.transport.as_ref();
        let outcome = tokio_retry::Retry::spawn(
            retry_strategy(self.retry_delay, self.backoff_factor, self.retry_count),
            move || {
                let attempt = attempts_ref.fetch_add(1, Ordering::SeqCst) + 1;
                if attempt > 1 {
                    debug!("Retrying {normalized} (attempt {attempt})");
                }
                transport.probe(normalized)
            },
        )
        .await;

        let retry_count = attempts.load(Ordering::SeqCst).saturating_sub(1);
        let response_time = started.elapsed().as_secs_f64();

        let result = match outcome {
            Ok(probe) => CheckResult::from_response(
                raw,
                normalized,
                probe.status_code,
                probe.final_url,
                response_time,
                timestamp,
                retry_count,
            ),
            Err(e) => {
                debug!("Giving up on {normalized} after {} attempt(s): {e}", retry_count + 1);
                CheckResult::from_transport_error(
                    raw,
                    normalized,
                    &e,
                    response_time,
                    timestamp,
                    retry_count,
                )
            }
        };

        debug!(
            "{} -> {} ({}) in {:.3}s",
            raw.trim(),
            result.status_result,
            result.status_code,
            result.response_time
        );
        self.stats.record(&result);
        result
    }

    /// Checks many URLs concurrently, at most `max_concurrent` at a time.
    /// Results come back in input order.
    pub async fn check_batch(self: &Arc<Self>, urls: Vec<String>) -> Vec<CheckResult> {
        let never = CancellationToken::new();
        self.check_batch_until(urls, &never)
            .await
            .unwrap_or_default()
    }

    /// Like [`check_batch`](Self::check_batch), but stops admitting new checks
    /// once `cancel` fires. In-flight checks are awaited either way; a
    /// cancelled batch returns `None` and its partial results are dropped.
    pub async fn check_batch_until(
        self: &Arc<Self>,
        urls: Vec<String>,
        cancel: &CancellationToken,
    ) -> Option<Vec<CheckResult>> {
        let total = urls.len();
        let mut tasks = FuturesUnordered::new();

        for (index, url) in urls.into_iter().enumerate() {
            let permit = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                permit = Arc::clone(&self.semaphore).acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => {
                        warn!("Semaphore closed, no further checks admitted");
                        break;
                    }
                },
            };

            let checker = Arc::clone(self);
            let task_url = url.clone();
            let handle = tokio::spawn(async move {
                let _permit = permit;
                checker.check(&task_url).await
            });
            tasks.push(async move { (index, url, handle.await) });
        }

        let mut slots: Vec<Option<CheckResult>> = (0..total).map(|_| None).collect();
        while let Some((index, url, joined)) = tasks.next().await {
            let result = match joined {
                Ok(result) => result,
                Err(join_error) => {
                    warn!("Check task for {url} failed: {join_error}");
                    let result = CheckResult::task_failure(&url, &join_error.to_string(), now_millis());
                    self.stats.record(&result);
                    result
                }
            };
            slots[index] = Some(result);
        }

        if cancel.is_cancelled() {
            return None;
        }
        Some(slots.into_iter().flatten().collect())
    }

    /// Claims `normalized` for this run. Returns false if it was already claimed.
    fn claim(&self, normalized: &str) -> bool {
        self.checked_urls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(normalized.to_string())
    }

    /// Number of distinct canonical URLs admitted so far.
    pub fn checked_urls_count(&self) -> usize {
        self.checked_urls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    /// Snapshot of the run counters.
    pub fn stats(&self) -> CheckerRunStats {
        self.stats.snapshot()
    }

    /// Restores counters saved in a checkpoint.
    pub fn restore_stats(&self, previous: CheckerRunStats) {
        self.stats.restore(previous);
    }

    /// Rolls the counters back to `snapshot`, taken earlier in this run.
    pub fn rewind_stats(&self, snapshot: CheckerRunStats) {
        self.stats.rewind(snapshot);
    }

    /// Logs the one-line counter summary.
    pub fn log_stats(&self) {
        let stats = self.stats();
        info!(
            "Stats: {} checked, {} active ({:.1}%), {:.1} checks/sec, Runtime: {:.1}min",
            stats.total_checked,
            stats.active_found,
            stats.success_rate(),
            stats.checks_per_second(),
            stats.total_time / 60.0
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error_handling::{ErrorCategory, TransportError};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::AtomicUsize;

    /// Answers from a fixed table; unknown URLs get 200.
    struct TableTransport {
        responses: HashMap<String, Result<u16, TransportError>>,
        calls: AtomicUsize,
    }

    impl TableTransport {
        fn new(entries: &[(&str, Result<u16, TransportError>)]) -> Self {
            Self {
                responses: entries
                    .iter()
                    .map(|(url, r)| (url.to_string(), r.clone()))
                    .collect(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Transport for TableTransport {
        async fn probe(&self, url: &str) -> Result<HttpProbe, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.responses.get(url).cloned().unwrap_or(Ok(200)) {
                Ok(status_code) => Ok(HttpProbe {
                    status_code,
                    final_url: format!("{url}/"),
                }),
                Err(e) => Err(e),
            }
        }
    }

    /// Fails with the given error for the first `failures` calls, then answers 200.
    struct FlakyTransport {
        failures: u32,
        error: TransportError,
        calls: AtomicU32,
    }

    #[async_trait]
    impl Transport for FlakyTransport {
        async fn probe(&self, url: &str) -> Result<HttpProbe, TransportError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                Err(self.error.clone())
            } else {
                Ok(HttpProbe {
                    status_code: 200,
                    final_url: url.to_string(),
                })
            }
        }
    }

    fn fast_config(retry_count: u32) -> BatchConfig {
        BatchConfig {
            retry_count,
            retry_delay_secs: 0.0,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_check_active() {
        let transport = Arc::new(TableTransport::new(&[]));
        let checker = StatusChecker::with_transport(&fast_config(2), transport.clone());
        let result = checker.check("example.com").await;
        assert_eq!(result.status_result, CheckOutcome::Active);
        assert_eq!(result.status_code, 200);
        assert_eq!(result.retry_count, 0);
        assert_eq!(result.error_category, None);
        assert_eq!(result.normalized_url, "https://example.com");
        assert_eq!(result.final_url, "https://example.com/");
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_check_not_found_is_inactive_and_not_retried() {
        let transport = Arc::new(TableTransport::new(&[("https://gone.com", Ok(404))]));
        let checker = StatusChecker::with_transport(&fast_config(3), transport.clone());
        let result = checker.check("gone.com").await;
        assert_eq!(result.status_result, CheckOutcome::Inactive);
        assert_eq!(result.error_category, Some(ErrorCategory::HttpStatus));
        assert_eq!(result.error_message, "HTTP 404");
        assert_eq!(result.retry_count, 0);
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_check_invalid_url_makes_no_request() {
        let transport = Arc::new(TableTransport::new(&[]));
        let checker = StatusChecker::with_transport(&fast_config(2), transport.clone());
        for raw in ["mailto:a@b.com", "http://127.0.0.1", "", "N/A"] {
            let result = checker.check(raw).await;
            assert_eq!(result.status_result, CheckOutcome::InvalidUrl, "{raw}");
            assert_eq!(result.error_category, Some(ErrorCategory::InvalidUrl));
        }
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
        assert_eq!(checker.stats().invalid_urls, 4);
        assert_eq!(checker.stats().total_checked, 0);
    }

    #[tokio::test]
    async fn test_check_timeout_exhausts_retries() {
        let transport = Arc::new(TableTransport::new(&[(
            "https://slow.com",
            Err(TransportError::Timeout),
        )]));
        let checker = StatusChecker::with_transport(&fast_config(2), transport.clone());
        let result = checker.check("slow.com").await;
        assert_eq!(result.status_result, CheckOutcome::Timeout);
        assert_eq!(result.error_category, Some(ErrorCategory::Timeout));
        assert_eq!(result.retry_count, 2);
        assert_eq!(transport.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_check_connection_error_becomes_error() {
        let transport = Arc::new(TableTransport::new(&[(
            "https://refused.com",
            Err(TransportError::Connection("Connection refused".into())),
        )]));
        let checker = StatusChecker::with_transport(&fast_config(1), transport.clone());
        let result = checker.check("refused.com").await;
        assert_eq!(result.status_result, CheckOutcome::Error);
        assert_eq!(result.error_category, Some(ErrorCategory::Connection));
        assert!(result.error_message.starts_with("Connection error"));
        assert_eq!(result.retry_count, 1);
    }

    #[tokio::test]
    async fn test_check_recovers_after_transient_failure() {
        let transport = Arc::new(FlakyTransport {
            failures: 1,
            error: TransportError::Dns("temporary failure in name resolution".into()),
            calls: AtomicU32::new(0),
        });
        let checker = StatusChecker::with_transport(&fast_config(2), transport);
        let result = checker.check("example.org").await;
        assert_eq!(result.status_result, CheckOutcome::Active);
        assert_eq!(result.retry_count, 1);
        assert_eq!(result.error_category, None);
    }

    #[tokio::test]
    async fn test_check_zero_retries_single_attempt() {
        let transport = Arc::new(FlakyTransport {
            failures: 5,
            error: TransportError::Tls("bad certificate".into()),
            calls: AtomicU32::new(0),
        });
        let checker = StatusChecker::with_transport(&fast_config(0), transport.clone());
        let result = checker.check("example.org").await;
        assert_eq!(result.status_result, CheckOutcome::Error);
        assert_eq!(result.error_category, Some(ErrorCategory::Tls));
        assert_eq!(result.retry_count, 0);
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_check_duplicate_is_not_rechecked() {
        let transport = Arc::new(TableTransport::new(&[]));
        let checker = StatusChecker::with_transport(&fast_config(0), transport.clone());
        let first = checker.check("example.com").await;
        let second = checker.check("HTTPS://EXAMPLE.COM/").await;
        assert_eq!(first.status_result, CheckOutcome::Active);
        assert_eq!(second.status_result, CheckOutcome::Error);
        assert_eq!(second.error_category, Some(ErrorCategory::Unknown));
        assert_eq!(second.error_message, "Already processed");
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
        assert_eq!(checker.checked_urls_count(), 1);
        assert_eq!(checker.stats().duplicates, 1);
    }

    #[tokio::test]
    async fn test_failed_url_stays_claimed() {
        let transport = Arc::new(TableTransport::new(&[(
            "https://down.com",
            Err(TransportError::Connection("reset".into())),
        )]));
        let checker = StatusChecker::with_transport(&fast_config(0), transport.clone());
        checker.check("down.com").await;
        let again = checker.check("down.com").await;
        assert_eq!(again.error_message, "Already processed");
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_check_batch_preserves_order() {
        let transport = Arc::new(TableTransport::new(&[
            ("https://b.com", Ok(500)),
            ("https://d.com", Err(TransportError::Timeout)),
        ]));
        let config = BatchConfig {
            max_concurrent: 2,
            ..fast_config(0)
        };
        let checker = Arc::new(StatusChecker::with_transport(&config, transport));
        let urls: Vec<String> = ["a.com", "b.com", "not a url", "d.com", "e.com"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let results = checker.check_batch(urls.clone()).await;
        let got: Vec<&str> = results.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(got, urls.iter().map(String::as_str).collect::<Vec<_>>());
        let outcomes: Vec<CheckOutcome> = results.iter().map(|r| r.status_result).collect();
        assert_eq!(
            outcomes,
            vec![
                CheckOutcome::Active,
                CheckOutcome::Inactive,
                CheckOutcome::InvalidUrl,
                CheckOutcome::Timeout,
                CheckOutcome::Active,
            ]
        );
    }

    #[tokio::test]
    async fn test_check_batch_until_cancelled_returns_none() {
        let transport = Arc::new(TableTransport::new(&[]));
        let checker = Arc::new(StatusChecker::with_transport(&fast_config(0), transport));
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = checker
            .check_batch_until(vec!["a.com".into(), "b.com".into()], &cancel)
            .await;
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_restore_stats() {
        let checker = StatusChecker::with_transport(
            &fast_config(0),
            Arc::new(TableTransport::new(&[])),
        );
        checker.restore_stats(CheckerRunStats {
            total_checked: 3,
            active_found: 3,
            ..Default::default()
        });
        checker.check("example.net").await;
        let stats = checker.stats();
        assert_eq!(stats.total_checked, 4);
        assert_eq!(stats.active_found, 4);
    }
}
