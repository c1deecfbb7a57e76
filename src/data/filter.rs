use super::model::{CanonicalName, Record, SelectMode};

// ---------------------------------------------------------------------------
// Chl sanity and quality-code filtering
// ---------------------------------------------------------------------------

/// Quality codes accepted on Chl measurements.
pub const ACCEPTED_QUALITY: [i32; 2] = [1, 2];

/// Invalidate Chl measurements that are missing, zero or negative.
pub fn mark_non_positive_chl(record: &mut Record) {
    if let Some(chl) = record.column_mut(CanonicalName::Chl) {
        for m in &mut chl.values {
            if m.value.as_f64().map_or(true, |v| v <= 0.0) {
                m.valid = false;
            }
        }
    }
}

/// Invalidate Chl measurements whose quality code is present but not accepted.
pub fn mark_bad_quality(record: &mut Record) {
    for column in record
        .columns
        .iter_mut()
        .filter(|c| c.name == CanonicalName::Chl)
    {
        for m in &mut column.values {
            if m.quality.is_some_and(|q| !ACCEPTED_QUALITY.contains(&q)) {
                m.valid = false;
            }
        }
    }
}

/// Mask of rows whose Chl measurement is still valid.
pub fn valid_chl_mask(record: &Record) -> Option<Vec<bool>> {
    record
        .column(CanonicalName::Chl)
        .map(|chl| chl.values.iter().map(|m| m.valid).collect())
}

/// Remove every row with an invalid Chl measurement, in lockstep.
pub fn drop_invalid_chl_rows(record: &mut Record) {
    if let Some(keep) = valid_chl_mask(record) {
        record.retain_rows(&keep);
        record.recalc_repeat_coefficients();
    }
}

// ---------------------------------------------------------------------------
// File-level filters applied before cleaning
// ---------------------------------------------------------------------------

/// Whether a file's quality mark clears the minimum.
///
/// A threshold of zero or below disables the check, so unmarked files pass.
pub fn meets_quality_threshold(record: &Record, min_quality: f64) -> bool {
    if min_quality <= 0.0 {
        return true;
    }
    record.settings.quality.is_some_and(|q| q >= min_quality)
}

/// Every required column that is present holds at least one value.
pub fn is_useful(record: &Record) -> bool {
    record
        .columns
        .iter()
        .filter(|c| c.name.is_required())
        .all(|c| c.values.iter().any(|m| !m.value.is_missing()))
}

/// Apply `SELECT:FIRST`: keep only the first row.
///
/// Returns whether the record was truncated.
pub fn apply_select_mode(record: &mut Record) -> bool {
    if record.settings.select != SelectMode::First || record.row_count().unwrap_or(0) == 0 {
        return false;
    }
    record.keep_single_row(0);
    record.made_single = true;
    true
}
