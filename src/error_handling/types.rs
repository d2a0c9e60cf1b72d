//! Error type definitions.
//!
//! This module defines the typed errors used throughout the crate and the
//! failure categories recorded on every unsuccessful check.

use std::path::PathBuf;

use log::SetLoggerError;
use reqwest::Error as ReqwestError;
use serde::{Deserialize, Serialize};
use strum_macros::EnumIter as EnumIterMacro;
use thiserror::Error;

/// Error types for initialization failures.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)] // All variants end with "Error" by convention
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),

    /// Error initializing the HTTP client.
    #[error("HTTP client initialization error: {0}")]
    HttpClientError(#[from] ReqwestError),
}

/// A configuration value outside its accepted range.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid {field}: {value} (expected {expected})")]
    OutOfRange {
        field: &'static str,
        value: String,
        expected: String,
    },
}

/// Failures reading URLs from an input source. Always fatal for a run.
#[derive(Error, Debug)]
pub enum InputError {
    /// The input file could not be opened or read.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A CSV record could not be decoded.
    #[error("malformed CSV input: {0}")]
    Csv(#[from] csv::Error),

    /// The input file extension is not a supported format.
    #[error("unsupported input format '{0}' (supported: .csv, .txt, or - for stdin)")]
    UnsupportedFormat(String),

    /// The requested URL column is not in the CSV header.
    #[error("column '{column}' not found in input (available: {})", available.join(", "))]
    MissingColumn {
        column: String,
        available: Vec<String>,
    },
}

/// Failures writing results to an output sink. Always fatal for a run.
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("output I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON encode error: {0}")]
    Json(#[from] serde_json::Error),

    /// An existing JSON array output does not end with `]`.
    #[error("cannot append to {0}: not a JSON array")]
    NotJsonArray(PathBuf),
}

/// Reasons a raw string is not accepted as a checkable URL.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("empty URL")]
    Empty,

    #[error("URL too long ({0} characters)")]
    TooLong(usize),

    #[error("placeholder value '{0}'")]
    Placeholder(String),

    #[error("unsupported scheme '{0}'")]
    UnsupportedScheme(String),

    #[error("not a URL or bare domain")]
    NotAUrl,

    #[error("parse error: {0}")]
    Parse(String),

    #[error("URL has no host")]
    MissingHost,

    /// Loopback, private, link-local, or otherwise internal target.
    #[error("unsafe target: {0}")]
    UnsafeTarget(String),

    #[error("reserved or invalid top-level domain in '{0}'")]
    InvalidTld(String),
}

/// Why a check did not end with an active site.
///
/// Present on a result iff its outcome is not `Active`. The serialized names
/// are part of the output format.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, EnumIterMacro,
)]
pub enum ErrorCategory {
    #[serde(rename = "dns_error")]
    Dns,
    #[serde(rename = "connection_error")]
    Connection,
    #[serde(rename = "ssl_error")]
    Tls,
    #[serde(rename = "timeout_error")]
    Timeout,
    #[serde(rename = "http_error")]
    HttpStatus,
    #[serde(rename = "invalid_url_error")]
    InvalidUrl,
    #[serde(rename = "unknown_error")]
    Unknown,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Dns => "dns_error",
            ErrorCategory::Connection => "connection_error",
            ErrorCategory::Tls => "ssl_error",
            ErrorCategory::Timeout => "timeout_error",
            ErrorCategory::HttpStatus => "http_error",
            ErrorCategory::InvalidUrl => "invalid_url_error",
            ErrorCategory::Unknown => "unknown_error",
        }
    }

    /// Human-readable label for summaries.
    pub fn label(&self) -> &'static str {
        match self {
            ErrorCategory::Dns => "DNS resolution failure",
            ErrorCategory::Connection => "Connection failure",
            ErrorCategory::Tls => "TLS/SSL failure",
            ErrorCategory::Timeout => "Request timeout",
            ErrorCategory::HttpStatus => "Non-200 HTTP status",
            ErrorCategory::InvalidUrl => "Invalid URL",
            ErrorCategory::Unknown => "Unknown error",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed HTTP exchange, already classified.
///
/// Produced by a [`Transport`](crate::checker::Transport); the status checker
/// folds it into a terminal result once retries are exhausted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Request timeout")]
    Timeout,

    #[error("DNS error: {0}")]
    Dns(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("SSL error: {0}")]
    Tls(String),

    #[error("Unknown error: {0}")]
    Other(String),
}

impl TransportError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            TransportError::Timeout => ErrorCategory::Timeout,
            TransportError::Dns(_) => ErrorCategory::Dns,
            TransportError::Connection(_) => ErrorCategory::Connection,
            TransportError::Tls(_) => ErrorCategory::Tls,
            TransportError::Other(_) => ErrorCategory::Unknown,
        }
    }
}
