//! Batched, tolerant CSV ingestion.
//!
//! A source is read in fixed-size row batches which are concatenated, in
//! order, into a [`RawTable`]. Rows that cannot be parsed, or that carry more
//! fields than the header, are skipped and counted; short rows are padded
//! with empty cells. Only whole-source failures surface as errors.

use std::{io::Read, path::Path};

use log::{debug, info, warn};

use crate::{
    error::{RepriceError, Result},
    io_utils,
};

pub const DEFAULT_BATCH_SIZE: usize = 10_000;

#[derive(Debug, Clone)]
pub struct ReadOptions {
    pub batch_size: usize,
    pub delimiter: Option<u8>,
    pub encoding: Option<String>,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            delimiter: None,
            encoding: None,
        }
    }
}

/// Untyped table exactly as read: header names and string cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    pub source_name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub skipped_rows: usize,
}

impl RawTable {
    pub fn new(source_name: impl Into<String>, headers: Vec<String>) -> Self {
        Self {
            source_name: source_name.into(),
            headers,
            rows: Vec::new(),
            skipped_rows: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Yields the rows of a CSV source one batch at a time.
pub struct BatchReader<R: Read> {
    source_name: String,
    reader: csv::Reader<R>,
    headers: Vec<String>,
    batch_size: usize,
    skipped_rows: usize,
    exhausted: bool,
}

impl<R: Read> BatchReader<R> {
    pub fn new(
        reader: R,
        source_name: impl Into<String>,
        delimiter: u8,
        batch_size: usize,
    ) -> Result<Self> {
        let source_name = source_name.into();
        let mut reader = io_utils::open_csv_reader(reader, delimiter);
        let headers = reader
            .headers()
            .map_err(|err| RepriceError::ingestion(&source_name, err))?
            .iter()
            .enumerate()
            .map(|(idx, header)| {
                if idx == 0 {
                    io_utils::strip_bom(header).to_string()
                } else {
                    header.to_string()
                }
            })
            .collect();
        Ok(Self {
            source_name,
            reader,
            headers,
            batch_size: batch_size.max(1),
            skipped_rows: 0,
            exhausted: false,
        })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn skipped_rows(&self) -> usize {
        self.skipped_rows
    }

    /// Next batch of rows, or `None` once the source is exhausted.
    pub fn next_batch(&mut self) -> Result<Option<Vec<Vec<String>>>> {
        if self.exhausted {
            return Ok(None);
        }
        let width = self.headers.len();
        let mut batch = Vec::with_capacity(self.batch_size.min(DEFAULT_BATCH_SIZE));
        let mut record = csv::StringRecord::new();
        while batch.len() < self.batch_size {
            match self.reader.read_record(&mut record) {
                Ok(false) => {
                    self.exhausted = true;
                    break;
                }
                Ok(true) => {
                    if record.len() > width {
                        self.skip(format_args!(
                            "{} field(s), expected {width}",
                            record.len()
                        ));
                        continue;
                    }
                    let mut row: Vec<String> = record.iter().map(|s| s.to_string()).collect();
                    row.resize(width, String::new());
                    batch.push(row);
                }
                Err(err) => {
                    if matches!(err.kind(), csv::ErrorKind::Io(_)) {
                        return Err(RepriceError::ingestion(&self.source_name, err));
                    }
                    self.skip(format_args!("{err}"));
                }
            }
        }
        if batch.is_empty() {
            Ok(None)
        } else {
            Ok(Some(batch))
        }
    }

    fn skip(&mut self, reason: std::fmt::Arguments<'_>) {
        self.skipped_rows += 1;
        debug!(
            "Skipping malformed line {} in {}: {}",
            self.reader.position().line(),
            self.source_name,
            reason
        );
    }
}

/// Reads a whole source into memory, batch by batch.
pub fn read_table<R: Read>(
    reader: R,
    source_name: &str,
    options: &ReadOptions,
    delimiter: u8,
) -> Result<RawTable> {
    let encoding = io_utils::resolve_encoding(options.encoding.as_deref())
        .map_err(|reason| RepriceError::ingestion(source_name, reason))?;
    let decoded = io_utils::decoding_reader(reader, encoding);
    let mut batches = BatchReader::new(decoded, source_name, delimiter, options.batch_size)?;
    let mut table = RawTable::new(source_name, batches.headers().to_vec());
    let mut batch_count = 0usize;
    while let Some(mut batch) = batches.next_batch()? {
        batch_count += 1;
        debug!(
            "Read batch {} of {} row(s) from {}",
            batch_count,
            batch.len(),
            source_name
        );
        table.rows.append(&mut batch);
    }
    table.skipped_rows = batches.skipped_rows();
    if table.skipped_rows > 0 {
        warn!(
            "Skipped {} malformed row(s) in {}",
            table.skipped_rows, source_name
        );
    }
    info!(
        "Loaded {} row(s) across {} batch(es) from {}",
        table.len(),
        batch_count,
        source_name
    );
    Ok(table)
}

pub fn read_table_from_path(path: &Path, options: &ReadOptions) -> Result<RawTable> {
    let source_name = io_utils::display_path(path);
    let reader =
        io_utils::open_input(path).map_err(|err| RepriceError::ingestion(&source_name, err))?;
    let delimiter = io_utils::resolve_input_delimiter(path, options.delimiter);
    read_table(reader, &source_name, options, delimiter)
}
