//! URL input sources.
//!
//! Sources hand out URLs in bounded chunks so a run never needs the whole
//! input in memory. Blank cells, blank lines, and `#` comment lines are
//! skipped and do not count as rows.

use std::collections::VecDeque;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;

use csv::{StringRecord, Trim};

use crate::error_handling::InputError;

/// A stream of raw URL strings.
pub trait UrlSource: Send {
    /// Returns up to `max` URLs; an empty vector means the source is exhausted.
    fn next_chunk(&mut self, max: usize) -> Result<Vec<String>, InputError>;

    /// Discards up to `rows` URLs and returns how many were discarded.
    fn skip(&mut self, rows: u64) -> Result<u64, InputError> {
        let mut skipped = 0u64;
        while skipped < rows {
            let want = usize::try_from(rows - skipped).unwrap_or(usize::MAX).min(10_000);
            let chunk = self.next_chunk(want)?;
            if chunk.is_empty() {
                break;
            }
            skipped += chunk.len() as u64;
        }
        Ok(skipped)
    }

    /// Number of URLs remaining, when known without reading.
    fn len_hint(&self) -> Option<u64> {
        None
    }
}

/// CSV input with a header row; URLs come from one named column.
pub struct CsvSource<R: Read> {
    reader: csv::Reader<R>,
    column: usize,
    record: StringRecord,
}

impl CsvSource<File> {
    /// Opens `path` and locates `url_column` in its header.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::Io`] if the file cannot be opened and
    /// [`InputError::MissingColumn`] if the header lacks the column.
    pub fn from_path(path: &Path, url_column: &str) -> Result<Self, InputError> {
        let file = File::open(path).map_err(|source| InputError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(file, url_column)
    }
}

impl<R: Read + Send> CsvSource<R> {
    pub fn from_reader(reader: R, url_column: &str) -> Result<Self, InputError> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(Trim::All)
            .from_reader(reader);
        let headers = reader.headers()?;
        let column = headers
            .iter()
            .position(|h| h.trim_start_matches('\u{feff}') == url_column)
            .ok_or_else(|| InputError::MissingColumn {
                column: url_column.to_string(),
                available: headers.iter().map(str::to_string).collect(),
            })?;
        Ok(Self {
            reader,
            column,
            record: StringRecord::new(),
        })
    }
}

impl<R: Read + Send> UrlSource for CsvSource<R> {
    fn next_chunk(&mut self, max: usize) -> Result<Vec<String>, InputError> {
        let mut urls = Vec::with_capacity(max.min(4096));
        while urls.len() < max && self.reader.read_record(&mut self.record)? {
            if let Some(cell) = self.record.get(self.column).filter(|c| !c.is_empty()) {
                urls.push(cell.to_string());
            }
        }
        Ok(urls)
    }
}

/// Plain text input, one URL per line.
pub struct TextSource<R: BufRead> {
    reader: R,
    line: String,
}

impl TextSource<BufReader<File>> {
    pub fn from_path(path: &Path) -> Result<Self, InputError> {
        let file = File::open(path).map_err(|source| InputError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_reader(BufReader::new(file)))
    }
}

impl TextSource<BufReader<io::Stdin>> {
    pub fn stdin() -> Self {
        Self::from_reader(BufReader::new(io::stdin()))
    }
}

impl<R: BufRead + Send> TextSource<R> {
    pub fn from_reader(reader: R) -> Self {
        Self {
            reader,
            line: String::new(),
        }
    }
}

impl<R: BufRead + Send> UrlSource for TextSource<R> {
    fn next_chunk(&mut self, max: usize) -> Result<Vec<String>, InputError> {
        let mut urls = Vec::with_capacity(max.min(4096));
        while urls.len() < max {
            self.line.clear();
            let read = self
                .reader
                .read_line(&mut self.line)
                .map_err(|source| InputError::Io {
                    path: "<input>".into(),
                    source,
                })?;
            if read == 0 {
                break;
            }
            let trimmed = self.line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            urls.push(trimmed.to_string());
        }
        Ok(urls)
    }
}

/// A fully materialized list of URLs.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    urls: VecDeque<String>,
}

impl InMemorySource {
    pub fn new<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            urls: urls
                .into_iter()
                .map(Into::into)
                .filter(|u: &String| !u.trim().is_empty())
                .collect(),
        }
    }

    /// Reads every remaining URL out of `source`.
    pub fn drain(source: &mut dyn UrlSource) -> Result<Self, InputError> {
        let mut urls = VecDeque::new();
        loop {
            let chunk = source.next_chunk(10_000)?;
            if chunk.is_empty() {
                break;
            }
            urls.extend(chunk);
        }
        Ok(Self { urls })
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}

impl UrlSource for InMemorySource {
    fn next_chunk(&mut self, max: usize) -> Result<Vec<String>, InputError> {
        let take = max.min(self.urls.len());
        Ok(self.urls.drain(..take).collect())
    }

    fn skip(&mut self, rows: u64) -> Result<u64, InputError> {
        let take = usize::try_from(rows).unwrap_or(usize::MAX).min(self.urls.len());
        self.urls.drain(..take);
        Ok(take as u64)
    }

    fn len_hint(&self) -> Option<u64> {
        Some(self.urls.len() as u64)
    }
}

/// True when `path` means "read from stdin".
pub fn is_stdin(path: &Path) -> bool {
    path.as_os_str() == "-"
}

/// Opens the source matching `path`: `-` is stdin text, `.csv` is CSV, `.txt`
/// or no extension is plain text.
///
/// # Errors
///
/// Returns [`InputError::UnsupportedFormat`] for any other extension, plus the
/// errors of the individual constructors.
pub fn open_source(path: &Path, url_column: &str) -> Result<Box<dyn UrlSource>, InputError> {
    if is_stdin(path) {
        return Ok(Box::new(TextSource::stdin()));
    }
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match extension.as_str() {
        "csv" => Ok(Box::new(CsvSource::from_path(path, url_column)?)),
        "txt" | "list" | "" => Ok(Box::new(TextSource::from_path(path)?)),
        other => Err(InputError::UnsupportedFormat(other.to_string())),
    }
}

/// Counts the URLs in `path` with a streaming pass. Returns `None` for stdin.
pub fn count_records(path: &Path, url_column: &str) -> Result<Option<u64>, InputError> {
    if is_stdin(path) {
        return Ok(None);
    }
    let mut source = open_source(path, url_column)?;
    let mut total = 0u64;
    loop {
        let chunk = source.next_chunk(10_000)?;
        if chunk.is_empty() {
            break;
        }
        total += chunk.len() as u64;
    }
    Ok(Some(total))
}
