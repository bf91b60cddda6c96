//! Persistent dataset: the document table, the held-out split and the shared feature JSON.

mod atomic;
pub mod feature_json;
pub mod import;
pub mod record;
pub mod store;

pub(crate) use atomic::write_atomic;
pub use feature_json::ExportKeys;
pub use import::{ImportKeys, ImportOptions, ImportedDataset};
pub use record::{COLUMNS, DocumentId, DocumentRecord, DocumentTable, UNLABELED};
pub use store::{CsvTableStore, DELIMITER, MemoryTableStore, StoreError, TableStore};
