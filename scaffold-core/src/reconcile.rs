//! Partial-update reconciliation.
//!
//! Reconciling a resolved [`FieldSet`] against a record walks the record's fields in
//! declaration order and, for each field, looks up a proposed value by external name and
//! then by internal name. Every matched value is type-checked before anything is mutated.
//! Values that deep-equal the current value are dropped; the rest are applied to a copy of
//! the record. Keys that name no field (including the `id` and timestamp envelope) are
//! ignored.

use bson::{Document as BsonDocument, ser::serialize_to_bson};

use crate::{
    document::Document,
    error::{ScaffoldError, ScaffoldResult},
    record::{FieldDescriptor, FieldSet, Record, unknown_field},
};

/// The result of a reconciliation that found at least one change.
#[derive(Debug, Clone)]
pub struct Reconciled<R: Record> {
    /// A copy of the record with every changed field applied.
    pub record: R,
    /// The changed fields, in declaration order.
    pub changed: Vec<&'static FieldDescriptor>,
}

impl<R: Record> Reconciled<R> {
    /// External names of the changed fields.
    pub fn external_names(&self) -> Vec<String> {
        self.changed
            .iter()
            .map(|field| field.external.to_string())
            .collect()
    }
}

/// Computes the changes `resolved` makes to `current`.
///
/// Returns `Ok(None)` when no field changes.
///
/// # Errors
///
/// Returns [`ScaffoldError::InvalidFieldType`] naming the first field (in declaration
/// order) whose proposed value does not have the declared kind. `current` is never touched.
pub fn reconcile<R: Record>(current: &R, resolved: &FieldSet) -> ScaffoldResult<Option<Reconciled<R>>> {
    let mut matched = Vec::new();

    for field in R::FIELDS {
        let Some(value) = resolved
            .get(field.external)
            .or_else(|| resolved.get(field.name))
        else {
            continue;
        };

        if !field.accepts(value) {
            return Err(ScaffoldError::InvalidFieldType(field.external.to_string()));
        }

        matched.push((field, value));
    }

    let mut changed = Vec::new();
    for (field, value) in matched {
        let existing = current
            .field_value(field.name)
            .ok_or_else(|| unknown_field(field.name))??;

        if existing != *value {
            changed.push((field, value));
        }
    }

    if changed.is_empty() {
        return Ok(None);
    }

    let mut record = current.clone();
    for (field, value) in &changed {
        record.set_field(field.name, (*value).clone())?;
    }

    Ok(Some(Reconciled {
        record,
        changed: changed
            .into_iter()
            .map(|(field, _)| field)
            .collect(),
    }))
}

/// Builds the merge patch persisted for an update: each changed field encoded on its own
/// (so a cleared optional field is written as `null`) plus `last_updated`.
///
/// # Errors
///
/// Returns [`ScaffoldError::InvalidFieldType`] for a changed value the store cannot
/// represent, such as an unsigned integer above `i64::MAX`.
pub fn stored_patch<R: Record>(
    document: &Document<R>,
    changed: &[&'static FieldDescriptor],
) -> ScaffoldResult<BsonDocument> {
    let mut patch = BsonDocument::new();

    for field in changed {
        let value = document
            .data
            .field_value(field.name)
            .ok_or_else(|| unknown_field(field.name))??;
        let stored = serialize_to_bson(&value)
            .map_err(|_| ScaffoldError::InvalidFieldType(field.external.to_string()))?;

        patch.insert(field.external, stored);
    }

    patch.insert("last_updated", serialize_to_bson(&document.last_updated)?);

    Ok(patch)
}
