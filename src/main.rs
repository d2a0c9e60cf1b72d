//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `site_status` library that handles:
//! - Command-line argument parsing
//! - Environment variable loading (.env file)
//! - Logger initialization
//! - Ctrl-C handling
//! - User-facing output formatting
//!
//! All core functionality is implemented in the library crate.

use anyhow::{Context, Result};
use clap::Parser;
use std::process;
use tokio_util::sync::CancellationToken;

use site_status::initialization::init_logger_with;
use site_status::{run_check, shutdown_gracefully, spawn_ctrl_c_handler, Opt};

/// Exit code for a run stopped by Ctrl-C.
const EXIT_CANCELLED: i32 = 130;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file (if it exists)
    // Try loading from current directory first, then from the executable's directory
    if dotenvy::dotenv().is_err() {
        if let Ok(exe_path) = std::env::current_exe() {
            if let Some(exe_dir) = exe_path.parent() {
                let env_path = exe_dir.join(".env");
                if env_path.exists() {
                    let _ = dotenvy::from_path(&env_path);
                }
            }
        }
    }

    let opt = Opt::parse();

    let log_level = opt.effective_log_level();
    let log_format = opt.log_format.clone();
    init_logger_with(log_level.into(), log_format).context("Failed to initialize logger")?;

    let job = opt.into_job();
    let cancel = CancellationToken::new();
    let listener = spawn_ctrl_c_handler(cancel.clone());

    let outcome = run_check(job, cancel).await;
    shutdown_gracefully(Some(listener)).await;

    match outcome {
        Ok(summary) => {
            let stats = &summary.stats;
            println!(
                "{} Checked {} URL{} ({} active, {} inactive, {} errors) in {:.1}s",
                if summary.cancelled { "⚠️" } else { "✅" },
                stats.processed_urls,
                if stats.processed_urls == 1 { "" } else { "s" },
                stats.active_websites,
                stats.inactive_websites,
                stats.error_websites,
                stats.elapsed_time
            );
            println!("Results saved in {}", summary.output.display());
            if summary.cancelled {
                println!(
                    "Progress saved in {}; rerun with --resume to continue",
                    summary.checkpoint.display()
                );
                process::exit(EXIT_CANCELLED);
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("site_status error: {:#}", e);
            process::exit(1);
        }
    }
}
