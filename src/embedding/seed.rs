//! Persisted layout used to seed the next embedding run.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use ndarray::{Array2, ArrayView2};

use crate::dataset::{DELIMITER, StoreError, write_atomic};

const HEADER: [&str; 2] = ["x", "y"];

/// Load/save port for the previous layout.
pub trait SeedStore {
    /// `None` when no layout has been saved yet.
    fn load(&self) -> Result<Option<Array2<f64>>, StoreError>;

    /// Replace the stored layout.
    fn save(&self, positions: ArrayView2<'_, f64>) -> Result<(), StoreError>;
}

/// Seed stored as a two-column `x;y` table, one row per document in table order.
#[derive(Debug, Clone)]
pub struct CsvSeedStore {
    path: PathBuf,
}

impl CsvSeedStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn malformed(&self, message: impl Into<String>) -> StoreError {
        StoreError::Malformed {
            path: self.path.clone(),
            message: message.into(),
        }
    }
}

impl SeedStore for CsvSeedStore {
    fn load(&self) -> Result<Option<Array2<f64>>, StoreError> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(StoreError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        let csv_err = |source: csv::Error| StoreError::Csv {
            path: self.path.clone(),
            source,
        };
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(DELIMITER)
            .from_reader(file);
        let headers = reader.headers().map_err(csv_err)?;
        if headers.iter().ne(HEADER.iter().copied()) {
            return Err(StoreError::Header {
                path: self.path.clone(),
                expected: HEADER.join(";"),
                found: headers.iter().collect::<Vec<_>>().join(";"),
            });
        }
        let mut values = Vec::new();
        for (line, record) in reader.deserialize::<(f64, f64)>().enumerate() {
            let (x, y) = record.map_err(csv_err)?;
            if !x.is_finite() || !y.is_finite() {
                return Err(self.malformed(format!("row {}: non-finite coordinate", line + 1)));
            }
            values.push(x);
            values.push(y);
        }
        let rows = values.len() / 2;
        Array2::from_shape_vec((rows, 2), values)
            .map(Some)
            .map_err(|err| self.malformed(err.to_string()))
    }

    fn save(&self, positions: ArrayView2<'_, f64>) -> Result<(), StoreError> {
        if positions.ncols() != 2 {
            return Err(self.malformed(format!(
                "expected 2 columns, got {}",
                positions.ncols()
            )));
        }
        let csv_err = |source: csv::Error| StoreError::Csv {
            path: self.path.clone(),
            source,
        };
        let mut writer = csv::WriterBuilder::new()
            .delimiter(DELIMITER)
            .has_headers(false)
            .from_writer(Vec::new());
        writer.write_record(HEADER).map_err(csv_err)?;
        for row in positions.rows() {
            writer.serialize((row[0], row[1])).map_err(csv_err)?;
        }
        let bytes = writer.into_inner().map_err(|err| StoreError::Write {
            path: self.path.clone(),
            source: std::io::Error::other(err.to_string()),
        })?;
        write_atomic(&self.path, &bytes)?;
        tracing::debug!(rows = positions.nrows(), path = %self.path.display(), "Saved embedding seed");
        Ok(())
    }
}

/// In-memory seed for tests.
#[derive(Debug, Default)]
pub struct MemorySeedStore {
    positions: Mutex<Option<Array2<f64>>>,
}

impl SeedStore for MemorySeedStore {
    fn load(&self) -> Result<Option<Array2<f64>>, StoreError> {
        Ok(self
            .positions
            .lock()
            .unwrap_or_else(|err| err.into_inner())
            .clone())
    }

    fn save(&self, positions: ArrayView2<'_, f64>) -> Result<(), StoreError> {
        *self.positions.lock().unwrap_or_else(|err| err.into_inner()) = Some(positions.to_owned());
        Ok(())
    }
}
