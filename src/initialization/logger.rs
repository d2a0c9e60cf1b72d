//! Logger setup on top of `env_logger`.

use std::io::Write;

use crate::config::LogFormat;
use crate::error_handling::InitializationError;
use colored::*;
use log::{Level, LevelFilter};

/// Dependencies that are chatty at debug level and quiet otherwise.
const NOISY_MODULES: &[(&str, LevelFilter)] = &[
    ("hyper", LevelFilter::Warn),
    ("hyper_util", LevelFilter::Warn),
    ("rustls", LevelFilter::Warn),
    ("h2", LevelFilter::Warn),
];

/// Installs the global logger.
///
/// `RUST_LOG` is read first, then `level` overrides it for this crate and for
/// reqwest (capped at info). `Plain` writes colored lines for a terminal;
/// `Json` writes one object per line for log shippers.
///
/// # Errors
///
/// Returns `InitializationError::LoggerError` if a logger is already installed.
pub fn init_logger_with(level: LevelFilter, format: LogFormat) -> Result<(), InitializationError> {
    let mut builder = env_logger::Builder::from_default_env();
    builder.filter_level(level);
    builder.filter_module("reqwest", LevelFilter::Info.min(level));
    for (module, filter) in NOISY_MODULES {
        builder.filter_module(module, *filter);
    }
    builder.filter_module("site_status", level);

    match format {
        LogFormat::Json => {
            colored::control::set_override(false);
            builder.format(|buf, record| {
                writeln!(
                    buf,
                    "{}",
                    json_line(
                        chrono::Utc::now().timestamp_millis(),
                        record.level(),
                        record.target(),
                        &record.args().to_string(),
                    )
                )
            });
        }
        LogFormat::Plain => {
            colored::control::set_override(true);
            builder.format(|buf, record| {
                let (marker, label) = level_badge(record.level());
                writeln!(
                    buf,
                    "{marker} {} [{label}] {}",
                    record.target().cyan(),
                    record.args()
                )
            });
        }
    }

    builder.try_init().map_err(InitializationError::from)
}

fn level_badge(level: Level) -> (&'static str, ColoredString) {
    let text = level.to_string();
    match level {
        Level::Error => ("❌", text.red()),
        Level::Warn => ("⚠️", text.yellow()),
        Level::Info => ("✔️", text.green()),
        Level::Debug => ("🔍", text.blue()),
        Level::Trace => ("🔬", text.purple()),
    }
}

fn json_line(ts: i64, level: Level, target: &str, message: &str) -> String {
    serde_json::json!({
        "ts": ts,
        "level": level.as_str(),
        "target": target,
        "msg": message,
    })
    .to_string()
}
