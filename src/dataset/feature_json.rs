//! Document-feature JSON shared with the visualization front end.
//!
//! The file is a JSON array of documents. Each document has an `id`, a `values` object and a
//! `features` object of per-context objects, all keyed by numeric strings. The schema belongs
//! to the front end, so documents are handled as [`serde_json::Value`] and every field this
//! crate does not own is preserved as-is.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::atomic::write_atomic;
use super::record::{DocumentId, DocumentTable};
use super::store::StoreError;

/// Where the derived columns are written inside each document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportKeys {
    /// Key of the `features` context that receives the derived values.
    #[serde(default = "default_feature_context")]
    pub feature_context: String,
    #[serde(default = "default_is_labeled_key")]
    pub is_labeled: String,
    #[serde(default = "default_score_key")]
    pub score: String,
    #[serde(default = "default_label_key")]
    pub label: String,
}

impl Default for ExportKeys {
    fn default() -> Self {
        Self {
            feature_context: default_feature_context(),
            is_labeled: default_is_labeled_key(),
            score: default_score_key(),
            label: default_label_key(),
        }
    }
}

fn default_feature_context() -> String {
    "1".to_string()
}

fn default_is_labeled_key() -> String {
    "31".to_string()
}

fn default_score_key() -> String {
    "32".to_string()
}

fn default_label_key() -> String {
    "33".to_string()
}

/// Read the document array from `path`.
pub fn load_documents(path: &Path) -> Result<Vec<Value>, StoreError> {
    let bytes = std::fs::read(path).map_err(|source| StoreError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&bytes).map_err(|source| StoreError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Write the document array to `path`, replacing any previous file.
pub fn save_documents(path: &Path, documents: &[Value]) -> Result<(), StoreError> {
    let bytes = serde_json::to_vec(documents).map_err(|source| StoreError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    write_atomic(path, &bytes)
}

/// Read a document id stored either as a JSON integer or as a numeric string.
pub fn document_id(document: &Value) -> Option<DocumentId> {
    match document.get("id")? {
        Value::Number(number) => number.as_i64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

/// Copy `isLabeled`, `score` and `label` of every table row into the matching document.
///
/// Documents are joined to rows by id; documents without a row are left untouched. Returns
/// the number of documents updated.
pub fn write_back(
    documents: &mut [Value],
    table: &DocumentTable,
    keys: &ExportKeys,
) -> Result<usize, String> {
    let rows: HashMap<DocumentId, usize> = table
        .rows()
        .iter()
        .enumerate()
        .map(|(idx, row)| (row.id, idx))
        .collect();
    let mut updated = 0usize;
    for document in documents.iter_mut() {
        let Some(id) = document_id(document) else {
            continue;
        };
        let Some(&row_idx) = rows.get(&id) else {
            continue;
        };
        let row = &table.rows()[row_idx];
        let derived = [
            (keys.is_labeled.as_str(), Value::from(i64::from(row.is_labeled))),
            (keys.score.as_str(), Value::from(row.score)),
            (keys.label.as_str(), Value::from(row.label)),
        ];
        let object = document
            .as_object_mut()
            .ok_or_else(|| format!("Document {id} is not a JSON object"))?;
        {
            let features = child_object(object, "features", id)?;
            let context = child_object(features, &keys.feature_context, id)?;
            for (key, value) in &derived {
                context.insert((*key).to_string(), value.clone());
            }
        }
        let values = child_object(object, "values", id)?;
        for (key, value) in derived {
            values.insert(key.to_string(), value);
        }
        updated += 1;
    }
    Ok(updated)
}

fn child_object<'a>(
    parent: &'a mut Map<String, Value>,
    key: &str,
    id: DocumentId,
) -> Result<&'a mut Map<String, Value>, String> {
    parent
        .entry(key.to_string())
        .or_insert_with(|| Value::Object(Map::new()))
        .as_object_mut()
        .ok_or_else(|| format!("Document {id}: `{key}` is not a JSON object"))
}
