//! Error handling.
//!
//! This module provides:
//! - Typed errors for configuration, initialization, input, output, and URL normalization
//! - The failure categories recorded on check results
//! - Categorization of `reqwest` failures
//! - The retry backoff schedule

mod categorization;
mod types;

// Re-export public API
pub(crate) use categorization::BLOCKED_ADDRESS_MARKER;
pub use categorization::{classify_reqwest_error, error_chain_message, retry_strategy};
pub use types::{
    ConfigError, ErrorCategory, InitializationError, InputError, NormalizeError, OutputError,
    TransportError,
};
