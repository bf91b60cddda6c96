//! Label ingestion.

mod ingest;

pub use ingest::apply_label;
