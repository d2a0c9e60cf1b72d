//! Utility functions.
//!
//! This module provides string sanitization for error messages and
//! formatting helpers for durations.

pub mod sanitize;
mod timing;

pub use sanitize::{sanitize_and_truncate_error_message, sanitize_error_message};
pub use timing::{format_hms, now_millis};
