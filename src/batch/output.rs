//! Result sinks.
//!
//! Every sink opens its file lazily on the first write. A fresh sink
//! truncates; an appending sink (used when resuming) keeps what is there.
//! Files are flushed after every chunk so a crash loses at most the open
//! chunk.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::checker::CheckResult;
use crate::config::OutputFormat;
use crate::error_handling::OutputError;

/// Column order of every output format.
pub const RESULT_FIELDS: [&str; 10] = [
    "url",
    "normalized_url",
    "status_result",
    "status_code",
    "error_category",
    "error_message",
    "response_time",
    "timestamp",
    "retry_count",
    "final_url",
];

/// Destination for filtered check results.
pub trait ResultSink: Send {
    /// Writes one chunk. May be called with an empty slice.
    fn write_chunk(&mut self, results: &[CheckResult]) -> Result<(), OutputError>;

    /// Makes sure the output exists and is flushed.
    fn finish(&mut self) -> Result<(), OutputError> {
        self.write_chunk(&[])
    }
}

fn ensure_parent(path: &Path) -> Result<(), OutputError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

fn is_missing_or_empty(path: &Path) -> bool {
    fs::metadata(path).map(|m| m.len() == 0).unwrap_or(true)
}

/// CSV with a header row on creation only.
pub struct CsvSink {
    path: PathBuf,
    append: bool,
    writer: Option<csv::Writer<File>>,
}

impl CsvSink {
    pub fn new(path: impl Into<PathBuf>, append: bool) -> Self {
        Self {
            path: path.into(),
            append,
            writer: None,
        }
    }

    fn open(&mut self) -> Result<(), OutputError> {
        ensure_parent(&self.path)?;
        let write_header = !self.append || is_missing_or_empty(&self.path);
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(open_file(&self.path, self.append)?);
        if write_header {
            writer.write_record(RESULT_FIELDS)?;
        }
        self.writer = Some(writer);
        Ok(())
    }
}

fn open_file(path: &Path, append: bool) -> Result<File, OutputError> {
    Ok(OpenOptions::new()
        .create(true)
        .write(true)
        .append(append)
        .truncate(!append)
        .open(path)?)
}

impl ResultSink for CsvSink {
    fn write_chunk(&mut self, results: &[CheckResult]) -> Result<(), OutputError> {
        if self.writer.is_none() {
            self.open()?;
        }
        let Some(writer) = self.writer.as_mut() else {
            return Ok(());
        };
        for result in results {
            writer.serialize(result)?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// A single JSON array, valid after every chunk.
///
/// Appending truncates the file just past the last element and rewrites the
/// closing bracket.
pub struct JsonArraySink {
    path: PathBuf,
    append: bool,
    opened: bool,
    empty: bool,
}

impl JsonArraySink {
    pub fn new(path: impl Into<PathBuf>, append: bool) -> Self {
        Self {
            path: path.into(),
            append,
            opened: false,
            empty: true,
        }
    }

    fn open(&mut self) -> Result<(), OutputError> {
        ensure_parent(&self.path)?;
        if !self.append || is_missing_or_empty(&self.path) {
            fs::write(&self.path, "[\n]\n")?;
            self.empty = true;
        } else {
            self.empty = array_is_empty(&self.path)?;
        }
        self.opened = true;
        Ok(())
    }
}

/// Finds where the closing bracket starts and whether the array has elements.
fn locate_tail(path: &Path, file: &mut File) -> Result<(u64, bool), OutputError> {
    let len = file.metadata()?.len();
    let window = len.min(4096);
    file.seek(SeekFrom::Start(len - window))?;
    let mut tail = Vec::with_capacity(window as usize);
    file.read_to_end(&mut tail)?;

    let not_array = || OutputError::NotJsonArray(path.to_path_buf());
    let close = tail
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .filter(|&i| tail[i] == b']')
        .ok_or_else(not_array)?;
    let last = tail[..close]
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .ok_or_else(not_array)?;
    let cut = len - window + last as u64 + 1;
    Ok((cut, tail[last] == b'['))
}

fn array_is_empty(path: &Path) -> Result<bool, OutputError> {
    let mut file = File::open(path)?;
    Ok(locate_tail(path, &mut file)?.1)
}

impl ResultSink for JsonArraySink {
    fn write_chunk(&mut self, results: &[CheckResult]) -> Result<(), OutputError> {
        if !self.opened {
            self.open()?;
        }
        if results.is_empty() {
            return Ok(());
        }

        let mut file = OpenOptions::new().read(true).write(true).open(&self.path)?;
        let (cut, _) = locate_tail(&self.path, &mut file)?;
        file.set_len(cut)?;
        file.seek(SeekFrom::Start(cut))?;

        let mut writer = BufWriter::new(file);
        for result in results {
            let separator: &[u8] = if self.empty { b"\n  " } else { b",\n  " };
            writer.write_all(separator)?;
            serde_json::to_writer(&mut writer, result)?;
            self.empty = false;
        }
        writer.write_all(b"\n]\n")?;
        writer.flush()?;
        Ok(())
    }
}

/// One JSON object per line.
pub struct JsonlSink {
    path: PathBuf,
    append: bool,
    writer: Option<BufWriter<File>>,
}

impl JsonlSink {
    pub fn new(path: impl Into<PathBuf>, append: bool) -> Self {
        Self {
            path: path.into(),
            append,
            writer: None,
        }
    }
}

impl ResultSink for JsonlSink {
    fn write_chunk(&mut self, results: &[CheckResult]) -> Result<(), OutputError> {
        if self.writer.is_none() {
            ensure_parent(&self.path)?;
            self.writer = Some(BufWriter::new(open_file(&self.path, self.append)?));
        }
        let Some(writer) = self.writer.as_mut() else {
            return Ok(());
        };
        for result in results {
            serde_json::to_writer(&mut *writer, result)?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// Collects results in memory. Used by library callers and tests.
#[derive(Debug, Default)]
pub struct VecSink {
    pub results: Vec<CheckResult>,
    pub chunks_written: usize,
}

impl ResultSink for VecSink {
    fn write_chunk(&mut self, results: &[CheckResult]) -> Result<(), OutputError> {
        self.results.extend_from_slice(results);
        self.chunks_written += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), OutputError> {
        Ok(())
    }
}

/// Opens the sink for `format` at `path`.
pub fn open_sink(path: &Path, format: OutputFormat, append: bool) -> Box<dyn ResultSink> {
    match format {
        OutputFormat::Csv => Box::new(CsvSink::new(path, append)),
        OutputFormat::Json => Box::new(JsonArraySink::new(path, append)),
        OutputFormat::Jsonl => Box::new(JsonlSink::new(path, append)),
    }
}
