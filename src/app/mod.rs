//! Main application modules.
//!
//! URL normalization, progress logging, shutdown handling, and statistics
//! printing used by the batch runner and the binary.

pub mod logging;
pub mod shutdown;
pub mod statistics;
pub mod url;

// Re-export public API
pub use logging::log_progress;
pub use shutdown::{shutdown_gracefully, spawn_ctrl_c_handler};
pub use statistics::{print_error_statistics, print_final_statistics};
pub use url::{normalize_url, NormalizedUrl};
