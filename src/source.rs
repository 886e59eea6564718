//! Row sources.
//!
//! A [`RowSource`] is a scoped producer of records. [`RowSource::open`]
//! acquires the underlying resource and returns a [`Rows`] iterator; dropping
//! that iterator releases the resource. The engine keeps the iterator inside
//! one scope, so the source is released exactly once per run on every exit
//! path, including errors.
//!
//! Two sources ship with the crate:
//!
//! - [`MemorySource`]: rows already in memory
//! - [`CsvSource`]: a header-driven delimited reader built on the `csv` crate
//!
//! ```rust
//! use tabnest::{CsvSource, RowSource};
//!
//! let data = "id,name\n1,Ada\n2,Grace\n";
//! let mut source = CsvSource::from_reader(data.as_bytes());
//! let rows: Vec<_> = source.open().unwrap().collect::<Result<_, _>>().unwrap();
//! assert_eq!(rows.len(), 2);
//! assert_eq!(rows[1].get("name").and_then(|v| v.as_str()), Some("Grace"));
//! ```

use crate::{Delimiter, Error, Record, Result, Value};
use std::fmt;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Iterator over the records of an opened source.
pub type Rows<'a> = Box<dyn Iterator<Item = Result<Record>> + 'a>;

/// A scoped, iterable producer of field → value records.
pub trait RowSource {
    /// Acquires the source. The returned iterator owns the acquired resource
    /// and releases it when dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the resource cannot be acquired.
    fn open(&mut self) -> Result<Rows<'_>>;
}

/// Rows held in memory. Can be opened any number of times.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    rows: Vec<Record>,
}

impl MemorySource {
    #[must_use]
    pub fn new(rows: Vec<Record>) -> Self {
        MemorySource { rows }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl From<Vec<Record>> for MemorySource {
    fn from(rows: Vec<Record>) -> Self {
        MemorySource::new(rows)
    }
}

impl FromIterator<Record> for MemorySource {
    fn from_iter<T: IntoIterator<Item = Record>>(iter: T) -> Self {
        MemorySource::new(iter.into_iter().collect())
    }
}

impl RowSource for MemorySource {
    fn open(&mut self) -> Result<Rows<'_>> {
        Ok(Box::new(self.rows.iter().cloned().map(Ok)))
    }
}

enum CsvInput {
    Path(PathBuf),
    Reader(Option<Box<dyn io::Read>>),
}

/// Header-driven delimited reader.
///
/// Every cell becomes a [`Value::String`] keyed by its header. Sources built
/// with [`CsvSource::from_path`] re-open the file on every run; sources built
/// with [`CsvSource::from_reader`] can be opened once.
pub struct CsvSource {
    input: CsvInput,
    delimiter: Delimiter,
    trim: bool,
}

impl CsvSource {
    #[must_use]
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        CsvSource {
            input: CsvInput::Path(path.as_ref().to_path_buf()),
            delimiter: Delimiter::default(),
            trim: false,
        }
    }

    #[must_use]
    pub fn from_reader<R: io::Read + 'static>(reader: R) -> Self {
        CsvSource {
            input: CsvInput::Reader(Some(Box::new(reader))),
            delimiter: Delimiter::default(),
            trim: false,
        }
    }

    /// Sets the field delimiter.
    ///
    /// ```rust
    /// use tabnest::{CsvSource, Delimiter, RowSource};
    ///
    /// let mut source = CsvSource::from_reader("a|b\n1|2\n".as_bytes()).with_delimiter(Delimiter::Pipe);
    /// let row = source.open().unwrap().next().unwrap().unwrap();
    /// assert_eq!(row.get("b").and_then(|v| v.as_str()), Some("2"));
    /// ```
    #[must_use]
    pub fn with_delimiter(mut self, delimiter: Delimiter) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Trims surrounding whitespace from headers and cells.
    #[must_use]
    pub fn with_trim(mut self, trim: bool) -> Self {
        self.trim = trim;
        self
    }

    fn label(&self) -> String {
        match &self.input {
            CsvInput::Path(path) => path.display().to_string(),
            CsvInput::Reader(_) => "<reader>".to_string(),
        }
    }
}

impl fmt::Debug for CsvSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CsvSource")
            .field("input", &self.label())
            .field("delimiter", &self.delimiter)
            .field("trim", &self.trim)
            .finish()
    }
}

impl RowSource for CsvSource {
    fn open(&mut self) -> Result<Rows<'_>> {
        let label = self.label();
        let input: Box<dyn io::Read> = match &mut self.input {
            CsvInput::Path(path) => Box::new(File::open(&*path).map_err(|e| {
                Error::io(&format!("Cannot open {}: {}", path.display(), e))
            })?),
            CsvInput::Reader(reader) => reader
                .take()
                .ok_or_else(|| Error::io("CSV reader source was already consumed"))?,
        };

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter.as_byte())
            .trim(if self.trim {
                csv::Trim::All
            } else {
                csv::Trim::None
            })
            .from_reader(input);
        let headers = reader.headers()?.clone();
        debug!(source = %label, columns = headers.len(), "opened csv source");

        Ok(Box::new(CsvRows {
            reader,
            headers,
            record: csv::StringRecord::new(),
            label,
            rows: 0,
            done: false,
        }))
    }
}

struct CsvRows {
    reader: csv::Reader<Box<dyn io::Read>>,
    headers: csv::StringRecord,
    record: csv::StringRecord,
    label: String,
    rows: usize,
    done: bool,
}

impl Iterator for CsvRows {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.reader.read_record(&mut self.record) {
            Ok(true) => {
                self.rows += 1;
                Some(Ok(self
                    .headers
                    .iter()
                    .zip(self.record.iter())
                    .map(|(header, cell)| (header.to_string(), Value::from(cell)))
                    .collect()))
            }
            Ok(false) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e.into()))
            }
        }
    }
}

impl Drop for CsvRows {
    fn drop(&mut self) {
        debug!(source = %self.label, rows = self.rows, "closed csv source");
    }
}
