//! Build the initial document table and held-out split from the document-feature JSON.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::feature_json::document_id;
use super::record::{DocumentRecord, DocumentTable};

/// Where the source fields live inside each JSON document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportKeys {
    /// Key of the raw document text inside `values`.
    #[serde(default = "default_text_key")]
    pub text: String,
    /// `features` context holding the peer label.
    #[serde(default = "default_peer_context")]
    pub peer_label_context: String,
    /// Key of the peer label inside the context.
    #[serde(default = "default_peer_feature")]
    pub peer_label_feature: String,
}

impl Default for ImportKeys {
    fn default() -> Self {
        Self {
            text: default_text_key(),
            peer_label_context: default_peer_context(),
            peer_label_feature: default_peer_feature(),
        }
    }
}

fn default_text_key() -> String {
    "7".to_string()
}

fn default_peer_context() -> String {
    "1".to_string()
}

fn default_peer_feature() -> String {
    "4".to_string()
}

/// Import parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportOptions {
    /// Index of the first row frozen into the held-out split; every later row joins it too.
    #[serde(default = "default_eval_split_start")]
    pub eval_split_start: usize,
    /// Peer labels strictly above this value derive class `1`, others class `0`.
    #[serde(default = "default_positive_threshold")]
    pub positive_threshold: f64,
    #[serde(default)]
    pub keys: ImportKeys,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            keys: ImportKeys::default(),
            eval_split_start: default_eval_split_start(),
            positive_threshold: default_positive_threshold(),
        }
    }
}

fn default_eval_split_start() -> usize {
    801
}

fn default_positive_threshold() -> f64 {
    0.5
}

/// Output of an import: the trainable table and the frozen evaluation split.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedDataset {
    /// Every imported document, unlabeled, in source order.
    pub table: DocumentTable,
    /// Labeled copy of the rows from `eval_split_start` onward.
    pub eval_split: DocumentTable,
}

/// Derive the binary class of a document from its peer label.
pub fn label_from_peer(peer_label: f64, threshold: f64) -> i64 {
    if peer_label > threshold { 1 } else { 0 }
}

/// Convert source documents into the document table and the held-out split.
pub fn build_dataset(
    documents: &[Value],
    options: &ImportOptions,
) -> Result<ImportedDataset, String> {
    let keys = &options.keys;
    let mut rows = Vec::with_capacity(documents.len());
    for (idx, document) in documents.iter().enumerate() {
        let id = document_id(document)
            .ok_or_else(|| format!("Document at position {idx} has no integer id"))?;
        let text = document
            .get("values")
            .and_then(|values| values.get(&keys.text))
            .map(text_value)
            .ok_or_else(|| format!("Document {id} has no text at values.{}", keys.text))?;
        let peer_label = document
            .get("features")
            .and_then(|features| features.get(&keys.peer_label_context))
            .and_then(|context| context.get(&keys.peer_label_feature))
            .and_then(Value::as_f64)
            .ok_or_else(|| {
                format!(
                    "Document {id} has no numeric peer label at features.{}.{}",
                    keys.peer_label_context, keys.peer_label_feature
                )
            })?;
        rows.push(DocumentRecord::unlabeled(id, text, peer_label));
    }

    let eval_split = rows
        .iter()
        .skip(options.eval_split_start)
        .cloned()
        .map(|mut row| {
            row.set_label(label_from_peer(row.peer_label, options.positive_threshold));
            row
        })
        .collect::<DocumentTable>();
    let table = DocumentTable::new(rows);
    table.validate().map_err(|violation| format!("{violation:?}"))?;
    Ok(ImportedDataset { table, eval_split })
}

fn text_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
