//! Per-URL check results.

use serde::{Deserialize, Serialize};

use crate::error_handling::{ErrorCategory, NormalizeError, TransportError};
use crate::utils::sanitize_and_truncate_error_message;

/// Terminal outcome of one check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckOutcome {
    /// The site answered 200 (after redirects)
    Active,
    /// The site answered with any other status
    Inactive,
    /// DNS, connection, TLS, or unknown failure after all retries
    Error,
    /// Every attempt timed out
    Timeout,
    /// The input was rejected before any request was made
    InvalidUrl,
}

impl CheckOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckOutcome::Active => "active",
            CheckOutcome::Inactive => "inactive",
            CheckOutcome::Error => "error",
            CheckOutcome::Timeout => "timeout",
            CheckOutcome::InvalidUrl => "invalid_url",
        }
    }
}

impl std::fmt::Display for CheckOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The result of checking one input URL. Field order is the output column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    /// The raw input value
    pub url: String,
    /// Canonical form, empty when normalization failed
    pub normalized_url: String,
    pub status_result: CheckOutcome,
    /// HTTP status, 0 when no response was received
    pub status_code: u16,
    /// Set iff `status_result` is not `Active`
    pub error_category: Option<ErrorCategory>,
    pub error_message: String,
    /// Seconds from check start to completion
    pub response_time: f64,
    /// Check start, Unix milliseconds
    pub timestamp: i64,
    /// Attempts used beyond the first
    pub retry_count: u32,
    /// URL after redirects, empty when unknown
    pub final_url: String,
}

impl CheckResult {
    /// Result for input rejected by the normalizer.
    pub fn invalid(url: &str, error: &NormalizeError, timestamp: i64) -> Self {
        Self {
            url: url.to_string(),
            normalized_url: String::new(),
            status_result: CheckOutcome::InvalidUrl,
            status_code: 0,
            error_category: Some(ErrorCategory::InvalidUrl),
            error_message: sanitize_and_truncate_error_message(&format!(
                "Invalid URL format: {error}"
            )),
            response_time: 0.0,
            timestamp,
            retry_count: 0,
            final_url: String::new(),
        }
    }

    /// Result for a URL whose canonical form was already checked in this run.
    pub fn duplicate(url: &str, normalized_url: &str, timestamp: i64) -> Self {
        Self {
            url: url.to_string(),
            normalized_url: normalized_url.to_string(),
            status_result: CheckOutcome::Error,
            status_code: 0,
            error_category: Some(ErrorCategory::Unknown),
            error_message: "Already processed".to_string(),
            response_time: 0.0,
            timestamp,
            retry_count: 0,
            final_url: String::new(),
        }
    }

    /// Result for a response that arrived, active or not.
    pub fn from_response(
        url: &str,
        normalized_url: &str,
        status_code: u16,
        final_url: String,
        response_time: f64,
        timestamp: i64,
        retry_count: u32,
    ) -> Self {
        let (status_result, error_category, error_message) = if status_code == 200 {
            (CheckOutcome::Active, None, String::new())
        } else {
            (
                CheckOutcome::Inactive,
                Some(ErrorCategory::HttpStatus),
                format!("HTTP {status_code}"),
            )
        };
        Self {
            url: url.to_string(),
            normalized_url: normalized_url.to_string(),
            status_result,
            status_code,
            error_category,
            error_message,
            response_time,
            timestamp,
            retry_count,
            final_url,
        }
    }

    /// Result for a request that failed on its last attempt.
    pub fn from_transport_error(
        url: &str,
        normalized_url: &str,
        error: &TransportError,
        response_time: f64,
        timestamp: i64,
        retry_count: u32,
    ) -> Self {
        let status_result = match error {
            TransportError::Timeout => CheckOutcome::Timeout,
            _ => CheckOutcome::Error,
        };
        Self {
            url: url.to_string(),
            normalized_url: normalized_url.to_string(),
            status_result,
            status_code: 0,
            error_category: Some(error.category()),
            error_message: sanitize_and_truncate_error_message(&error.to_string()),
            response_time,
            timestamp,
            retry_count,
            final_url: String::new(),
        }
    }

    /// Result for a check task that panicked or was aborted.
    pub fn task_failure(url: &str, reason: &str, timestamp: i64) -> Self {
        Self {
            url: url.to_string(),
            normalized_url: String::new(),
            status_result: CheckOutcome::Error,
            status_code: 0,
            error_category: Some(ErrorCategory::Unknown),
            error_message: sanitize_and_truncate_error_message(&format!("Exception: {reason}")),
            response_time: 0.0,
            timestamp,
            retry_count: 0,
            final_url: String::new(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.status_result == CheckOutcome::Active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_serialized_names() {
        assert_eq!(
            serde_json::to_string(&CheckOutcome::InvalidUrl).unwrap(),
            "\"invalid_url\""
        );
        assert_eq!(serde_json::to_string(&CheckOutcome::Active).unwrap(), "\"active\"");
        assert_eq!(CheckOutcome::Timeout.to_string(), "timeout");
    }

    #[test]
    fn test_from_response_active() {
        let r = CheckResult::from_response(
            "example.com",
            "https://example.com",
            200,
            "https://www.example.com/".into(),
            0.2,
            1,
            0,
        );
        assert!(r.is_active());
        assert_eq!(r.error_category, None);
        assert!(r.error_message.is_empty());
        assert_eq!(r.final_url, "https://www.example.com/");
    }

    #[test]
    fn test_from_response_inactive() {
        let r = CheckResult::from_response("a.com", "https://a.com", 404, String::new(), 0.1, 1, 0);
        assert_eq!(r.status_result, CheckOutcome::Inactive);
        assert_eq!(r.error_category, Some(ErrorCategory::HttpStatus));
        assert_eq!(r.error_message, "HTTP 404");
    }

    #[test]
    fn test_from_transport_error_timeout() {
        let r = CheckResult::from_transport_error(
            "a.com",
            "https://a.com",
            &TransportError::Timeout,
            30.0,
            1,
            2,
        );
        assert_eq!(r.status_result, CheckOutcome::Timeout);
        assert_eq!(r.error_category, Some(ErrorCategory::Timeout));
        assert_eq!(r.error_message, "Request timeout");
        assert_eq!(r.retry_count, 2);
    }

    #[test]
    fn test_from_transport_error_dns() {
        let r = CheckResult::from_transport_error(
            "a.com",
            "https://a.com",
            &TransportError::Dns("no such host".into()),
            0.5,
            1,
            0,
        );
        assert_eq!(r.status_result, CheckOutcome::Error);
        assert_eq!(r.error_category, Some(ErrorCategory::Dns));
    }

    #[test]
    fn test_invalid_result_has_no_normalized_url() {
        let r = CheckResult::invalid("mailto:x@y.com", &NormalizeError::UnsupportedScheme("mailto".into()), 1);
        assert_eq!(r.status_result, CheckOutcome::InvalidUrl);
        assert!(r.normalized_url.is_empty());
        assert!(r.error_message.starts_with("Invalid URL format"));
    }

    #[test]
    fn test_error_category_set_iff_not_active() {
        let results = [
            CheckResult::from_response("a", "a", 200, String::new(), 0.0, 0, 0),
            CheckResult::from_response("a", "a", 500, String::new(), 0.0, 0, 0),
            CheckResult::duplicate("a", "a", 0),
            CheckResult::task_failure("a", "panic", 0),
        ];
        for r in results {
            assert_eq!(r.error_category.is_none(), r.is_active());
        }
    }
}
