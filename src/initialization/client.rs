//! HTTP client initialization.
//!
//! One `reqwest::Client` is built per run and shared by every check, so all
//! probes reuse the same connection pool.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::redirect::Policy;
use reqwest::ClientBuilder;

use crate::config::{
    BatchConfig, DEFAULT_ACCEPT, DEFAULT_ACCEPT_LANGUAGE, MAX_REDIRECT_HOPS,
    POOL_IDLE_TIMEOUT_SECS, POOL_MAX_IDLE_PER_HOST, TCP_CONNECT_TIMEOUT_SECS,
};
use crate::error_handling::InitializationError;
use crate::security::{check_host_safe, SafeResolver};

/// Initializes the HTTP client for a run.
///
/// Creates a `reqwest::Client` configured with:
/// - User-Agent, Accept, and Accept-Language headers
/// - Request timeout from the config; connect timeout capped at 5 seconds
/// - Redirect following (up to 10 hops)
/// - Connection pool tuning for many distinct hosts
/// - Certificate verification unless `verify_ssl` is false
/// - The private-address resolver when `block_private_resolution` is set
///
/// # Errors
///
/// Returns `InitializationError::HttpClientError` if the builder rejects the
/// configuration (for example an invalid User-Agent header value).
pub fn init_client(config: &BatchConfig) -> Result<reqwest::Client, InitializationError> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(DEFAULT_ACCEPT));
    headers.insert(
        ACCEPT_LANGUAGE,
        HeaderValue::from_static(DEFAULT_ACCEPT_LANGUAGE),
    );

    let timeout = config.timeout();
    let connect_timeout = timeout.min(Duration::from_secs(TCP_CONNECT_TIMEOUT_SECS));

    let mut builder = ClientBuilder::new()
        .timeout(timeout)
        .connect_timeout(connect_timeout)
        .user_agent(config.user_agent.clone())
        .default_headers(headers)
        .pool_idle_timeout(Duration::from_secs(POOL_IDLE_TIMEOUT_SECS))
        .pool_max_idle_per_host(POOL_MAX_IDLE_PER_HOST)
        .redirect(redirect_policy(config.block_private_resolution));

    if !config.verify_ssl {
        log::warn!("TLS certificate verification is DISABLED; use this only for testing");
        builder = builder.danger_accept_invalid_certs(true);
    }

    if config.block_private_resolution {
        builder = builder.dns_resolver(Arc::new(SafeResolver));
    }

    Ok(builder.build()?)
}

/// Follows up to `MAX_REDIRECT_HOPS` redirects. With `block_private` set,
/// redirects to internal hosts are refused as well, since literal IP targets
/// never reach the resolver.
fn redirect_policy(block_private: bool) -> Policy {
    if !block_private {
        return Policy::limited(MAX_REDIRECT_HOPS);
    }

    Policy::custom(|attempt| {
        if attempt.previous().len() > MAX_REDIRECT_HOPS {
            return attempt.error("too many redirects");
        }
        let unsafe_target = attempt
            .url()
            .host()
            .map(|host| check_host_safe(&host).is_err())
            .unwrap_or(true);
        if unsafe_target {
            let message = format!(
                "redirect to {} {}",
                attempt.url(),
                crate::error_handling::BLOCKED_ADDRESS_MARKER
            );
            return attempt.error(message);
        }
        attempt.follow()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_client_default_config() {
        assert!(init_client(&BatchConfig::default()).is_ok());
    }

    #[test]
    fn test_init_client_without_tls_verification() {
        let config = BatchConfig {
            verify_ssl: false,
            ..Default::default()
        };
        assert!(init_client(&config).is_ok());
    }

    #[test]
    fn test_init_client_with_safe_resolver() {
        let config = BatchConfig {
            block_private_resolution: true,
            ..Default::default()
        };
        assert!(init_client(&config).is_ok());
    }

    #[test]
    fn test_init_client_rejects_invalid_user_agent() {
        let config = BatchConfig {
            user_agent: "bad\nagent".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            init_client(&config),
            Err(InitializationError::HttpClientError(_))
        ));
    }
}
