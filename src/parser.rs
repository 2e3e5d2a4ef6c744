// 🏗️ CSV Reader - header-keyed rows from heterogeneous member exports
//
// Every input file is read the same way:
// - First line is the header; names are trimmed and upper-cased
// - Rows are yielded lazily and carry their physical line number
// - Blank rows are skipped, but still count toward line numbers
// - The first row whose width differs from the header stops the stream

use crate::error::{ImportError, Result};
use csv::{ReaderBuilder, StringRecord, StringRecordsIntoIter, WriterBuilder};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

// ============================================================================
// OPTIONS
// ============================================================================

/// Dialect shared by parsing and export
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvOptions {
    pub delimiter: u8,
    pub quote: u8,

    /// Escape byte inside quoted fields. Off by default: a doubled quote
    /// escapes a quote and backslashes are ordinary data. Setting it turns
    /// doubled-quote escaping off.
    pub escape: Option<u8>,
}

impl Default for CsvOptions {
    fn default() -> Self {
        CsvOptions {
            delimiter: b',',
            quote: b'"',
            escape: None,
        }
    }
}

// ============================================================================
// ROW
// ============================================================================

/// One data line keyed by normalized header names
///
/// Keys keep header order, so a row can be written back out unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    headers: Arc<[String]>,
    values: Vec<String>,
    line: u64,
}

impl Row {
    /// Build a row by hand (fixtures, export of derived data)
    ///
    /// Keys are normalized the same way file headers are.
    pub fn from_pairs<K, V>(line: u64, pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut headers = Vec::new();
        let mut values = Vec::new();
        for (key, value) in pairs {
            headers.push(normalize_header(key.as_ref()));
            values.push(value.into());
        }

        Row {
            headers: headers.into(),
            values,
            line,
        }
    }

    /// Physical line number in the source file (header is line 1)
    pub fn line(&self) -> u64 {
        self.line
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.headers.iter().map(|h| h.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers
            .iter()
            .map(|h| h.as_str())
            .zip(self.values.iter().map(|v| v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Raw value, if the column exists in this file
    pub fn get(&self, column: &str) -> Option<&str> {
        self.headers
            .iter()
            .position(|h| h == column)
            .map(|i| self.values[i].as_str())
    }

    /// Whether the column exists in this file, regardless of value
    pub fn has(&self, column: &str) -> bool {
        self.headers.iter().any(|h| h == column)
    }

    /// Value if the column exists and is not blank
    pub fn optional(&self, column: &str) -> Option<&str> {
        self.get(column).filter(|v| !v.trim().is_empty())
    }

    /// Value of a column the file must carry; blank values are returned as is
    pub fn required(&self, column: &str) -> Result<&str> {
        self.get(column).ok_or_else(|| ImportError::MissingColumn {
            column: column.to_string(),
            row: self.line,
        })
    }
}

fn normalize_header(raw: &str) -> String {
    raw.trim_start_matches('\u{feff}').trim().to_uppercase()
}

fn is_blank(record: &StringRecord) -> bool {
    record.iter().all(|field| field.trim().is_empty())
}

// ============================================================================
// ROW STREAM
// ============================================================================

/// Lazy, single-pass stream of rows from one file
///
/// Fused after the first error: a shape mismatch or read failure is
/// yielded once and the stream ends.
pub struct Rows {
    records: StringRecordsIntoIter<File>,
    headers: Arc<[String]>,
    path: PathBuf,
    done: bool,
}

impl Rows {
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Iterator for Rows {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        loop {
            let record = match self.records.next()? {
                Ok(record) => record,
                Err(e) => {
                    self.done = true;
                    return Some(Err(e.into()));
                }
            };

            let line = record.position().map(|p| p.line()).unwrap_or(0);

            if is_blank(&record) {
                continue;
            }

            if record.len() != self.headers.len() {
                self.done = true;
                return Some(Err(ImportError::RowShapeMismatch {
                    row: line,
                    expected: self.headers.len(),
                    actual: record.len(),
                }));
            }

            return Some(Ok(Row {
                headers: Arc::clone(&self.headers),
                values: record.iter().map(|v| v.to_string()).collect(),
                line,
            }));
        }
    }
}

// ============================================================================
// READER
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct CsvReader {
    options: CsvOptions,
}

impl CsvReader {
    pub fn new(options: CsvOptions) -> Self {
        CsvReader { options }
    }

    pub fn options(&self) -> CsvOptions {
        self.options
    }

    /// Open a file and read its header; rows are read on demand
    pub fn parse(&self, path: &Path) -> Result<Rows> {
        if !path.exists() {
            return Err(ImportError::FileNotFound(path.to_path_buf()));
        }

        let reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(self.options.delimiter)
            .quote(self.options.quote)
            .double_quote(self.options.escape.is_none())
            .escape(self.options.escape)
            .from_path(path)?;

        let mut records = reader.into_records();

        let header = match records.next() {
            Some(Ok(record)) if !is_blank(&record) => record,
            _ => return Err(ImportError::HeaderReadFailure(path.to_path_buf())),
        };

        let headers: Arc<[String]> = header.iter().map(normalize_header).collect();

        Ok(Rows {
            records,
            headers,
            path: path.to_path_buf(),
            done: false,
        })
    }

    /// Read every row; any error discards the rows read so far
    pub fn parse_all(&self, path: &Path) -> Result<Vec<Row>> {
        self.parse(path)?.collect()
    }

    /// Write rows back out, header taken from the first row's keys
    pub fn export(&self, rows: &[Row], path: &Path) -> Result<()> {
        let first = rows.first().ok_or(ImportError::EmptyExport)?;
        let headers: Vec<&str> = first.keys().collect();

        let mut builder = WriterBuilder::new();
        builder
            .delimiter(self.options.delimiter)
            .quote(self.options.quote);
        if let Some(escape) = self.options.escape {
            builder.double_quote(false).escape(escape);
        }
        let mut writer = builder.from_path(path)?;

        writer.write_record(&headers)?;

        for row in rows {
            let values: Vec<&str> = headers
                .iter()
                .map(|h| row.get(h).unwrap_or(""))
                .collect();
            writer.write_record(&values)?;
        }

        writer.flush()?;
        Ok(())
    }
}

/// SHA-256 of a file's bytes, for import provenance
pub fn file_digest(path: &Path) -> Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)?;
    Ok(format!("{:x}", hasher.finalize()))
}
