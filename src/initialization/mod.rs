//! Application initialization and resource setup.
//!
//! This module provides functions to initialize the shared resources of a run:
//! - the HTTP client (timeouts, TLS policy, pool tuning, optional safe resolver)
//! - the concurrency semaphore
//! - the logger
//!
//! All initialization functions return proper error types for error handling.

mod client;
mod logger;

use std::sync::Arc;

use tokio::sync::Semaphore;

// Re-export public API
pub use client::init_client;
pub use logger::init_logger_with;

/// Initializes a semaphore for controlling concurrency.
///
/// Creates a new semaphore with the specified permit count. This semaphore is
/// the admission gate for URL checks.
pub fn init_semaphore(count: usize) -> Arc<Semaphore> {
    Arc::new(Semaphore::new(count))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_semaphore_permits() {
        let semaphore = init_semaphore(7);
        assert_eq!(semaphore.available_permits(), 7);
    }
}
