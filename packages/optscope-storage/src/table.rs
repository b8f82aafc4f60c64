//! Result Table Writer
//!
//! Append-only CSV: header written once when the file is created, then one
//! flushed row per processed file. Re-running against an existing table
//! appends a fresh pass (duplicates included); callers that want a clean
//! dataset remove the file first.
//!
//! Rows land in completion order, not filename order.

use crate::error::{Result, StorageError};
use crate::row::{self, COLUMN_COUNT, HEADER};
use optscope_analysis::BenchmarkResult;
use parking_lot::Mutex;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Shared handle to the result table (one per run, shared across workers)
pub struct ResultTable {
    path: PathBuf,
    file: Mutex<File>,
}

impl ResultTable {
    /// Open the table for appending, writing the header only if the file is new or empty.
    ///
    /// Never truncates. An error here means no row could ever be recorded.
    pub fn initialize(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                StorageError::io(format!("Cannot create {}", parent.display())).with_source(e)
            })?;
        }

        let mut file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&path)
            .map_err(|e| {
                StorageError::io(format!("Cannot open {} for appending", path.display()))
                    .with_source(e)
            })?;

        let is_empty = file.metadata()?.len() == 0;
        if is_empty {
            write_durably(&mut file, row::encode_line(&HEADER).as_bytes())?;
            info!("Created result table {}", path.display());
        } else {
            check_header(&path);
            info!("Appending to existing result table {}", path.display());
        }

        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one row; returns once the row is flushed to disk.
    ///
    /// The whole line goes out in a single write under the table lock, so
    /// rows from concurrent workers never interleave.
    pub fn append(&self, result: &BenchmarkResult) -> Result<()> {
        let line = row::encode_line(&row::fields(result));

        let mut file = self.file.lock();
        write_durably(&mut file, line.as_bytes()).map_err(|e| {
            StorageError::io(format!(
                "Failed to append {} to {}",
                result.filename,
                self.path.display()
            ))
            .with_source(e)
        })?;

        debug!("Appended row for {}", result.filename);
        Ok(())
    }

    /// All data rows currently on disk (header excluded), in file order.
    pub fn read_rows(&self) -> Result<Vec<Vec<String>>> {
        // Keep appenders out while reading
        let _guard = self.file.lock();
        read_rows(&self.path)
    }
}

/// Read a result table from disk (header excluded).
pub fn read_rows(path: &Path) -> Result<Vec<Vec<String>>> {
    let text = fs::read_to_string(path)?;
    let mut records = row::parse_records(&text)?.into_iter();

    match records.next() {
        Some(header) if header == HEADER => {}
        Some(header) => return Err(StorageError::header_mismatch(header.join(","))),
        None => return Ok(Vec::new()),
    }

    records
        .enumerate()
        .map(|(i, record)| {
            if record.len() == COLUMN_COUNT {
                Ok(record)
            } else {
                Err(StorageError::malformed_row(
                    i + 2,
                    format!("expected {} fields, found {}", COLUMN_COUNT, record.len()),
                ))
            }
        })
        .collect()
}

fn write_durably(file: &mut File, bytes: &[u8]) -> std::io::Result<()> {
    file.write_all(bytes)?;
    file.flush()?;
    file.sync_data()
}

fn check_header(path: &Path) {
    let mut first_line = String::new();
    let read = File::open(path).and_then(|f| BufReader::new(f).read_line(&mut first_line));
    let expected = HEADER.join(",");

    if read.is_err() || first_line.trim_end() != expected {
        warn!(
            "{} does not start with the expected header; rows will be appended anyway",
            path.display()
        );
    }
}
