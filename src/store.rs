//! Record store
//!
//! An append-only table persisted as a single JSON document with a fixed
//! header row. Every append is a whole-document read-modify-write.

use crate::state_machine::CapturedFields;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;

/// Column names, in storage order
pub const HEADER: [&str; 4] = ["Timestamp", "Name", "PhoneNumber", "Location"];

/// Local date-time format of the timestamp column
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to access table {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Malformed table document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Unexpected table header: {0:?}")]
    HeaderMismatch(Vec<String>),
    #[error("Table writer task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// One completed intake, stamped at capture time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub captured_at: DateTime<Local>,
    pub fields: CapturedFields,
}

impl Record {
    /// Stamp captured fields with the current local time
    pub fn new(fields: CapturedFields) -> Self {
        Self {
            captured_at: Local::now(),
            fields,
        }
    }

    /// Row cells in header order
    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.captured_at.format(TIMESTAMP_FORMAT).to_string(),
            self.fields.name.clone(),
            self.fields.phone_number.clone(),
            self.fields.location.clone(),
        ]
    }
}

/// On-disk shape of the table
#[derive(Debug, Serialize, Deserialize)]
struct TableDocument {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl TableDocument {
    fn empty() -> Self {
        Self {
            header: HEADER.iter().map(ToString::to_string).collect(),
            rows: Vec::new(),
        }
    }
}

/// Handle to the table file.
///
/// Clones share one writer lock, so read-modify-write cycles from concurrent
/// sessions in this process are serialised and no appended row is lost.
/// Other processes writing the same file are not coordinated.
#[derive(Debug, Clone)]
pub struct TableStore {
    path: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl TableStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the table with only its header row if the file does not exist.
    ///
    /// Idempotent: an existing file is never rewritten.
    pub fn ensure_initialized(&self) -> StoreResult<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);

        if self.path.exists() {
            tracing::debug!(path = %self.path.display(), "Table already exists");
            return Ok(());
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        self.save(&TableDocument::empty())?;
        tracing::info!(path = %self.path.display(), "Created table");
        Ok(())
    }

    /// Append one row and persist the whole table before returning.
    ///
    /// Fails if the table cannot be opened, parsed or written; nothing is
    /// retried here.
    pub fn append(&self, record: &Record) -> StoreResult<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let mut doc = self.load()?;
        doc.rows.push(record.to_row());
        self.save(&doc)?;

        tracing::debug!(path = %self.path.display(), rows = doc.rows.len(), "Appended row");
        Ok(())
    }

    /// All data rows in arrival order
    pub fn rows(&self) -> StoreResult<Vec<Vec<String>>> {
        Ok(self.load()?.rows)
    }

    fn load(&self) -> StoreResult<TableDocument> {
        let raw = fs::read_to_string(&self.path).map_err(|source| self.io_error(source))?;
        let doc: TableDocument = serde_json::from_str(&raw)?;
        if doc.header != HEADER {
            return Err(StoreError::HeaderMismatch(doc.header));
        }
        Ok(doc)
    }

    /// Write to a sibling file, sync it, then rename over the table so a
    /// failed save leaves the previous contents intact.
    fn save(&self, doc: &TableDocument) -> StoreResult<()> {
        let tmp = temp_path(&self.path);
        let write = || -> io::Result<()> {
            let mut writer = BufWriter::new(File::create(&tmp)?);
            serde_json::to_writer_pretty(&mut writer, doc)?;
            writer.flush()?;
            writer.into_inner().map_err(io::IntoInnerError::into_error)?.sync_all()?;
            fs::rename(&tmp, &self.path)
        };

        write().map_err(|source| {
            let _ = fs::remove_file(&tmp);
            self.io_error(source)
        })
    }

    fn io_error(&self, source: io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("table"));
    name.push(".tmp");
    path.with_file_name(name)
}
