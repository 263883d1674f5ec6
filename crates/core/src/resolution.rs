//! Template/override resolution, edit diffs and override merging.
//!
//! All three operations are total over valid vectors and never fail.
//! Value comparison in [`diff`] is exact: slider values arrive already
//! quantized by the input step, so any inequality is a user edit.

use crate::settings::{AdjustmentVector, PartialAdjustmentVector, ALL_FIELDS};

/// Resolve an image's effective vector: the override value for every field
/// present in `override_vector`, the template value otherwise.
pub fn effective(
    template: &AdjustmentVector,
    override_vector: &PartialAdjustmentVector,
) -> AdjustmentVector {
    let mut resolved = *template;
    for (field, value) in override_vector.iter() {
        resolved.set(field, value);
    }
    resolved
}

/// Fields where `edited` differs from `baseline`, carrying the edited value.
///
/// A field the user moved back to its baseline value is not included; a
/// field moved to the default value (but away from the baseline) is.
pub fn diff(edited: &AdjustmentVector, baseline: &AdjustmentVector) -> PartialAdjustmentVector {
    let mut changed = PartialAdjustmentVector::empty();
    for field in ALL_FIELDS {
        let value = edited.get(field);
        if value != baseline.get(field) {
            changed.set(field, value);
        }
    }
    changed
}

/// Shallow right-biased merge: fields in `new_diff` overwrite `existing`,
/// fields only in `existing` survive, fields in neither stay absent.
///
/// Last writer per field wins, so two merges racing on the same stored
/// override are not associative.
pub fn merge_override(
    existing: &PartialAdjustmentVector,
    new_diff: &PartialAdjustmentVector,
) -> PartialAdjustmentVector {
    let mut merged = *existing;
    for (field, value) in new_diff.iter() {
        merged.set(field, value);
    }
    merged
}
