//! Persistence of the document table as `;`-delimited UTF-8 text.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use thiserror::Error;

use super::atomic::write_atomic;
use super::record::{COLUMNS, DocumentId, DocumentRecord, DocumentTable, TableViolation};

/// Field delimiter shared by every persisted table in the data directory.
pub const DELIMITER: u8 = b';';

/// Errors raised while reading or writing persisted files.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Malformed table at {path}: {source}")]
    Csv { path: PathBuf, source: csv::Error },
    #[error("Malformed JSON at {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Unexpected header in {path}: expected {expected}, found {found}")]
    Header {
        path: PathBuf,
        expected: String,
        found: String,
    },
    #[error("Duplicate document id {id} in {path}")]
    DuplicateId { path: PathBuf, id: DocumentId },
    #[error("Document {id} in {path} has a label that disagrees with its isLabeled flag")]
    InconsistentLabel { path: PathBuf, id: DocumentId },
    #[error("Malformed record in {path}: {message}")]
    Malformed { path: PathBuf, message: String },
}

impl StoreError {
    fn from_violation(path: &Path, violation: TableViolation) -> Self {
        match violation {
            TableViolation::DuplicateId(id) => StoreError::DuplicateId {
                path: path.to_path_buf(),
                id,
            },
            TableViolation::InconsistentLabel(id) => StoreError::InconsistentLabel {
                path: path.to_path_buf(),
                id,
            },
        }
    }
}

/// Load/save port for a document table.
pub trait TableStore {
    fn load(&self) -> Result<DocumentTable, StoreError>;

    fn save(&self, table: &DocumentTable) -> Result<(), StoreError>;

    /// Clear every label and persist the result.
    fn reset(&self) -> Result<DocumentTable, StoreError> {
        let mut table = self.load()?;
        table.reset_labels();
        self.save(&table)?;
        Ok(table)
    }
}

/// Table store backed by a single delimited text file.
#[derive(Debug, Clone)]
pub struct CsvTableStore {
    path: PathBuf,
}

impl CsvTableStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }
}

impl TableStore for CsvTableStore {
    fn load(&self) -> Result<DocumentTable, StoreError> {
        let file = File::open(&self.path).map_err(|source| StoreError::Read {
            path: self.path.clone(),
            source,
        })?;
        let table = decode_table(file, &self.path)?;
        table
            .validate()
            .map_err(|violation| StoreError::from_violation(&self.path, violation))?;
        Ok(table)
    }

    fn save(&self, table: &DocumentTable) -> Result<(), StoreError> {
        let bytes = encode_table(table, &self.path)?;
        write_atomic(&self.path, &bytes)?;
        tracing::debug!(rows = table.len(), path = %self.path.display(), "Saved document table");
        Ok(())
    }
}

/// In-memory table store, mainly used as a test double.
#[derive(Debug, Default)]
pub struct MemoryTableStore {
    table: Mutex<DocumentTable>,
}

impl MemoryTableStore {
    pub fn new(table: DocumentTable) -> Self {
        Self {
            table: Mutex::new(table),
        }
    }
}

impl TableStore for MemoryTableStore {
    fn load(&self) -> Result<DocumentTable, StoreError> {
        Ok(self
            .table
            .lock()
            .unwrap_or_else(|err| err.into_inner())
            .clone())
    }

    fn save(&self, table: &DocumentTable) -> Result<(), StoreError> {
        *self.table.lock().unwrap_or_else(|err| err.into_inner()) = table.clone();
        Ok(())
    }
}

fn decode_table<R: std::io::Read>(reader: R, path: &Path) -> Result<DocumentTable, StoreError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(DELIMITER)
        .from_reader(reader);
    let headers = reader.headers().map_err(|source| StoreError::Csv {
        path: path.to_path_buf(),
        source,
    })?;
    if headers.iter().ne(COLUMNS.iter().copied()) {
        return Err(StoreError::Header {
            path: path.to_path_buf(),
            expected: COLUMNS.join(";"),
            found: headers.iter().collect::<Vec<_>>().join(";"),
        });
    }
    let mut rows = Vec::new();
    for record in reader.deserialize::<DocumentRecord>() {
        rows.push(record.map_err(|source| StoreError::Csv {
            path: path.to_path_buf(),
            source,
        })?);
    }
    Ok(DocumentTable::new(rows))
}

fn encode_table(table: &DocumentTable, path: &Path) -> Result<Vec<u8>, StoreError> {
    let csv_err = |source: csv::Error| StoreError::Csv {
        path: path.to_path_buf(),
        source,
    };
    // Headers are written explicitly so that an empty table still round-trips.
    let mut writer = csv::WriterBuilder::new()
        .delimiter(DELIMITER)
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(COLUMNS).map_err(csv_err)?;
    for row in table.rows() {
        writer.serialize(row).map_err(csv_err)?;
    }
    writer.into_inner().map_err(|err| StoreError::Write {
        path: path.to_path_buf(),
        source: std::io::Error::other(err.to_string()),
    })
}
