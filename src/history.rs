//! Append-only log of evaluation scores, oldest first.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::dataset::{DELIMITER, StoreError};
use crate::error::LearnerError;

/// Port for the metrics history.
pub trait HistoryLog {
    fn append(&self, value: f64) -> Result<(), StoreError>;

    /// Every recorded value in insertion order.
    fn read_all(&self) -> Result<Vec<f64>, StoreError>;

    /// Most recent value.
    fn latest(&self) -> Result<f64, LearnerError> {
        self.read_all()?
            .last()
            .copied()
            .ok_or(LearnerError::EmptyHistory)
    }
}

/// History stored as one value per line, without a header.
#[derive(Debug, Clone)]
pub struct CsvHistoryLog {
    path: PathBuf,
}

impl CsvHistoryLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl HistoryLog for CsvHistoryLog {
    fn append(&self, value: f64) -> Result<(), StoreError> {
        let write_err = |source: std::io::Error| StoreError::Write {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(write_err)?;
        let mut writer = csv::WriterBuilder::new()
            .delimiter(DELIMITER)
            .has_headers(false)
            .from_writer(file);
        writer
            .write_record([value.to_string()])
            .and_then(|_| writer.flush().map_err(csv::Error::from))
            .map_err(|source| StoreError::Csv {
                path: self.path.clone(),
                source,
            })?;
        Ok(())
    }

    fn read_all(&self) -> Result<Vec<f64>, StoreError> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(StoreError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(DELIMITER)
            .has_headers(false)
            .flexible(true)
            .from_reader(file);
        let mut values = Vec::new();
        for (line, record) in reader.records().enumerate() {
            let record = record.map_err(|source| StoreError::Csv {
                path: self.path.clone(),
                source,
            })?;
            let Some(field) = record.get(0).map(str::trim).filter(|f| !f.is_empty()) else {
                continue;
            };
            let value = field.parse::<f64>().map_err(|err| StoreError::Malformed {
                path: self.path.clone(),
                message: format!("line {}: {err}", line + 1),
            })?;
            values.push(value);
        }
        Ok(values)
    }
}

/// In-memory history for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryHistoryLog {
    values: Mutex<Vec<f64>>,
}

impl HistoryLog for MemoryHistoryLog {
    fn append(&self, value: f64) -> Result<(), StoreError> {
        self.values
            .lock()
            .unwrap_or_else(|err| err.into_inner())
            .push(value);
        Ok(())
    }

    fn read_all(&self) -> Result<Vec<f64>, StoreError> {
        Ok(self
            .values
            .lock()
            .unwrap_or_else(|err| err.into_inner())
            .clone())
    }
}
