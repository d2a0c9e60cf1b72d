//! Resume checkpoints.

use std::fs;
use std::path::Path;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::checker::CheckerRunStats;
use crate::error_handling::OutputError;

/// Progress snapshot written next to the output file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressCheckpoint {
    /// Chunks fully written to the sink
    pub processed_batches: u64,
    /// Last chunk number reached
    pub current_batch: u64,
    pub stats: CheckerRunStats,
    pub checked_urls_count: usize,
    /// Unix milliseconds
    pub timestamp: i64,
    #[serde(default)]
    pub processed_rows: Option<u64>,
    #[serde(default)]
    pub batch_size: Option<usize>,
}

impl ProgressCheckpoint {
    /// Input rows to skip when resuming. Older checkpoints without a row count
    /// fall back to whole chunks.
    pub fn rows_to_skip(&self, current_batch_size: usize) -> u64 {
        self.processed_rows.unwrap_or_else(|| {
            let size = self.batch_size.unwrap_or(current_batch_size) as u64;
            self.processed_batches * size
        })
    }

    /// Writes the checkpoint as pretty JSON, replacing any previous one.
    pub fn save(&self, path: &Path) -> Result<(), OutputError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }

    /// Loads a checkpoint. A missing file is `None`; an unreadable one is
    /// logged and also `None`, so the run starts fresh.
    pub fn load(path: &Path) -> Option<Self> {
        let contents = match fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!("Could not read checkpoint {}: {e}", path.display());
                return None;
            }
        };
        match serde_json::from_str(&contents) {
            Ok(checkpoint) => Some(checkpoint),
            Err(e) => {
                warn!("Ignoring corrupt checkpoint {}: {e}", path.display());
                None
            }
        }
    }
}
