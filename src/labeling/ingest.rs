use crate::dataset::{DocumentId, DocumentTable, TableStore};
use crate::error::LearnerError;

/// Record a human label for one document and persist the whole table.
///
/// Returns the updated table; nothing is written when the id is unknown or the label is not
/// `0` or `1`.
pub fn apply_label<S: TableStore + ?Sized>(
    store: &S,
    id: DocumentId,
    label: i64,
) -> Result<DocumentTable, LearnerError> {
    if !matches!(label, 0 | 1) {
        return Err(LearnerError::InvalidLabel { label });
    }
    let mut table = store.load()?;
    let row = table.get_mut(id).ok_or(LearnerError::NotFound { id })?;
    let previous = row.is_labeled.then_some(row.label);
    row.set_label(label);
    store.save(&table)?;
    tracing::info!(
        id,
        label,
        ?previous,
        labeled = table.labeled_count(),
        "Applied label"
    );
    Ok(table)
}
