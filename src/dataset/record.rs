//! Document rows and the in-memory document table.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Label value carried by rows that have not been labeled by a human.
pub const UNLABELED: i64 = -1;

/// Column names of the persisted table, in file order.
pub const COLUMNS: [&str; 6] = ["id", "text", "label", "peer_label", "score", "isLabeled"];

/// Stable document identifier shared with the visualization front end.
pub type DocumentId = i64;

/// One document of the dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: DocumentId,
    pub text: String,
    /// Class label, or [`UNLABELED`] while `is_labeled` is false.
    pub label: i64,
    /// Reference signal imported with the document, only used to derive simulated labels.
    pub peer_label: f64,
    /// Uncertainty score in `[0, 1]`.
    pub score: f64,
    #[serde(rename = "isLabeled", with = "flag")]
    pub is_labeled: bool,
}

impl DocumentRecord {
    /// Build an unlabeled row with a zero score.
    pub fn unlabeled(id: DocumentId, text: impl Into<String>, peer_label: f64) -> Self {
        Self {
            id,
            text: text.into(),
            label: UNLABELED,
            peer_label,
            score: 0.0,
            is_labeled: false,
        }
    }

    pub fn set_label(&mut self, label: i64) {
        self.label = label;
        self.is_labeled = true;
    }

    pub fn clear_label(&mut self) {
        self.label = UNLABELED;
        self.is_labeled = false;
    }

    /// `true` when the label and the labeled flag agree with each other.
    pub fn is_consistent(&self) -> bool {
        self.is_labeled == (self.label != UNLABELED)
    }
}

/// Ordered collection of document rows.
///
/// Row order is significant: it is the order rows are persisted in and the order of the
/// coordinates produced by the embedding step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentTable {
    rows: Vec<DocumentRecord>,
}

/// Structural problems detected in a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableViolation {
    DuplicateId(DocumentId),
    /// Label and labeled flag disagree for this row.
    InconsistentLabel(DocumentId),
}

impl DocumentTable {
    pub fn new(rows: Vec<DocumentRecord>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[DocumentRecord] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<DocumentRecord> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, id: DocumentId) -> Option<&DocumentRecord> {
        self.rows.iter().find(|row| row.id == id)
    }

    pub fn get_mut(&mut self, id: DocumentId) -> Option<&mut DocumentRecord> {
        self.rows.iter_mut().find(|row| row.id == id)
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut DocumentRecord> {
        self.rows.iter_mut()
    }

    pub fn ids(&self) -> Vec<DocumentId> {
        self.rows.iter().map(|row| row.id).collect()
    }

    pub fn texts(&self) -> Vec<&str> {
        self.rows.iter().map(|row| row.text.as_str()).collect()
    }

    pub fn labels(&self) -> Vec<i64> {
        self.rows.iter().map(|row| row.label).collect()
    }

    pub fn labeled_count(&self) -> usize {
        self.rows.iter().filter(|row| row.is_labeled).count()
    }

    /// Copy of the labeled rows whose id is not in `excluded`, in table order.
    pub fn labeled_subset(&self, excluded: &HashSet<DocumentId>) -> DocumentTable {
        let rows = self
            .rows
            .iter()
            .filter(|row| row.is_labeled && !excluded.contains(&row.id))
            .cloned()
            .collect();
        DocumentTable { rows }
    }

    /// Clear every label, keeping texts, peer labels and scores.
    pub fn reset_labels(&mut self) {
        for row in &mut self.rows {
            row.clear_label();
        }
    }

    /// Check id uniqueness and the label/flag invariant.
    pub fn validate(&self) -> Result<(), TableViolation> {
        let mut seen = HashSet::with_capacity(self.rows.len());
        for row in &self.rows {
            if !seen.insert(row.id) {
                return Err(TableViolation::DuplicateId(row.id));
            }
            if !row.is_consistent() {
                return Err(TableViolation::InconsistentLabel(row.id));
            }
        }
        Ok(())
    }
}

impl FromIterator<DocumentRecord> for DocumentTable {
    fn from_iter<T: IntoIterator<Item = DocumentRecord>>(iter: T) -> Self {
        Self {
            rows: iter.into_iter().collect(),
        }
    }
}

/// `isLabeled` is stored as `0`/`1`; `true`/`false` and `1.0` are accepted on read.
mod flag {
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(u8::from(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        let raw = String::deserialize(deserializer)?;
        match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "1.0" | "true" => Ok(true),
            "0" | "0.0" | "false" | "" => Ok(false),
            other => Err(D::Error::custom(format!("invalid isLabeled value: {other}"))),
        }
    }
}
