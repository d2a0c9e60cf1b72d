//! Error categorization and retry strategy.
//!
//! This module maps `reqwest` failures onto [`TransportError`] values and
//! builds the backoff schedule used between attempts.

use std::error::Error as StdError;
use std::time::Duration;

use super::types::TransportError;
use crate::config::MAX_RETRY_DELAY_SECS;

/// Substrings of an error chain that indicate name resolution failed.
const DNS_MARKERS: &[&str] = &[
    "dns error",
    "failed to lookup address",
    "name or service not known",
    "no such host",
    "nodename nor servname",
    "no address associated with hostname",
    "temporary failure in name resolution",
];

/// Substrings of an error chain that indicate a TLS failure.
const TLS_MARKERS: &[&str] = &["certificate", "tls", "ssl", "handshake"];

/// Raised by the private-address resolver; reported as a connection failure.
pub(crate) const BLOCKED_ADDRESS_MARKER: &str = "resolved to blocked address";

/// Creates the backoff schedule for one check.
///
/// Yields `retry_count` delays; the delay before retry `n` (0-based) is
/// `retry_delay * backoff_factor^n`, capped at [`MAX_RETRY_DELAY_SECS`].
pub fn retry_strategy(
    retry_delay: Duration,
    backoff_factor: f64,
    retry_count: u32,
) -> impl Iterator<Item = Duration> {
    let base = retry_delay.as_secs_f64();
    let ceiling = Duration::from_secs(MAX_RETRY_DELAY_SECS);
    (0..retry_count).map(move |n| {
        let exponent = i32::try_from(n).unwrap_or(i32::MAX);
        Duration::try_from_secs_f64(base * backoff_factor.powi(exponent))
            .unwrap_or(ceiling)
            .min(ceiling)
    })
}

/// Joins an error and all of its sources into one message, skipping sources
/// whose text is already contained in the message.
pub fn error_chain_message(error: &(dyn StdError + 'static)) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !text.is_empty() && !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}

/// Categorizes a `reqwest::Error` into a [`TransportError`].
///
/// `reqwest` only exposes coarse predicates (`is_timeout`, `is_connect`), so
/// DNS and TLS failures are told apart by walking the error source chain.
/// TLS markers are checked before the generic connection case since
/// handshake failures surface as connect errors.
pub fn classify_reqwest_error(error: &reqwest::Error) -> TransportError {
    let message = error_chain_message(error);
    classify_error_message(
        &message,
        error.is_timeout() || chain_has_timeout(error),
        error.is_connect(),
    )
}

/// Categorization shared by [`classify_reqwest_error`] and tests.
pub(crate) fn classify_error_message(
    message: &str,
    is_timeout: bool,
    is_connect: bool,
) -> TransportError {
    if is_timeout {
        return TransportError::Timeout;
    }

    let lower = message.to_lowercase();
    if lower.contains(BLOCKED_ADDRESS_MARKER) {
        return TransportError::Connection(message.to_string());
    }
    if DNS_MARKERS.iter().any(|m| lower.contains(m)) {
        return TransportError::Dns(message.to_string());
    }
    if TLS_MARKERS.iter().any(|m| lower.contains(m)) {
        return TransportError::Tls(message.to_string());
    }
    if is_connect
        || lower.contains("connection refused")
        || lower.contains("connection reset")
        || lower.contains("connection closed")
        || lower.contains("broken pipe")
    {
        return TransportError::Connection(message.to_string());
    }
    TransportError::Other(message.to_string())
}

fn chain_has_timeout(error: &(dyn StdError + 'static)) -> bool {
    let mut source = error.source();
    while let Some(cause) = source {
        if let Some(io) = cause.downcast_ref::<std::io::Error>() {
            if io.kind() == std::io::ErrorKind::TimedOut {
                return true;
            }
        }
        source = cause.source();
    }
    false
}
