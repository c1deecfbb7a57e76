use super::model::{CanonicalName, Column, Record};

// ---------------------------------------------------------------------------
// Carry-forward of missing values
// ---------------------------------------------------------------------------

/// Fill each missing cell from the nearest earlier present cell.
///
/// Leading missing cells have nothing to copy and are invalidated instead.
pub fn carry_forward_column(column: &mut Column) {
    let mut latest: Option<usize> = None;
    for i in 0..column.values.len() {
        if !column.values[i].value.is_missing() {
            latest = Some(i);
            continue;
        }
        match latest {
            Some(src) => {
                let source = column.values[src].clone();
                let m = &mut column.values[i];
                m.value = source.value;
                m.quality = source.quality;
                m.valid = source.valid;
                m.copied = true;
                m.is_repeated = true;
            }
            None => column.values[i].valid = false,
        }
    }

    let copied = column.values.iter().filter(|m| m.copied).count();
    if column.len() > 1 && copied == column.len() - 1 {
        column.repeating = true;
    }
}

pub fn carry_forward(record: &mut Record) {
    for column in &mut record.columns {
        carry_forward_column(column);
    }
}

// ---------------------------------------------------------------------------
// Duplicate-run removal
// ---------------------------------------------------------------------------

/// Collapse runs of equal Chl values when the record is dominated by them.
///
/// Only the first row of each run survives, and only when the Chl repeat
/// coefficient reaches `threshold`.
pub fn drop_repeated_runs(record: &mut Record, threshold: f64) {
    let Some(chl) = record.column_mut(CanonicalName::Chl) else {
        return;
    };
    chl.mark_repeats();
    chl.recalc_repeat_coefficient();
    let coefficient = match chl.repeat_coefficient {
        Some(c) if !chl.is_empty() && c >= threshold => c,
        _ => return,
    };

    let keep: Vec<bool> = chl
        .values
        .iter()
        .enumerate()
        .map(|(i, m)| i == 0 || !m.is_repeated)
        .collect();
    log::info!(
        "Chl repeat coefficient {coefficient:.4} reaches {threshold}; removing {} repeated measurements.",
        keep.iter().filter(|k| !**k).count()
    );
    record.retain_rows(&keep);
    for column in &mut record.columns {
        column.mark_repeats();
        column.recalc_repeat_coefficient();
    }
}
