use super::model::{CanonicalName, Record};

// ---------------------------------------------------------------------------
// z-score outlier rejection on Chl
// ---------------------------------------------------------------------------

/// Population z-score of every present value.
///
/// Missing inputs stay `None`. When the spread is zero (or nothing is present)
/// every score is undefined.
pub fn z_scores(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let present: Vec<f64> = values.iter().flatten().copied().collect();
    if present.is_empty() {
        return vec![None; values.len()];
    }
    let n = present.len() as f64;
    let mean = present.iter().sum::<f64>() / n;
    let variance = present.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let std_dev = variance.sqrt();
    if std_dev == 0.0 || !std_dev.is_finite() {
        return vec![None; values.len()];
    }
    values
        .iter()
        .map(|v| v.map(|v| (v - mean) / std_dev))
        .collect()
}

/// Rows to keep: undefined scores always pass, the rest need `|z| < threshold`.
pub fn outlier_mask(values: &[Option<f64>], threshold: f64) -> Vec<bool> {
    if values.len() <= 1 {
        return vec![true; values.len()];
    }
    z_scores(values)
        .into_iter()
        .map(|z| z.map_or(true, |z| z.abs() < threshold))
        .collect()
}

/// Remove rows whose Chl value is an outlier. `None` disables the filter.
pub fn drop_outliers(record: &mut Record, threshold: Option<f64>) {
    let Some(chl) = record.column(CanonicalName::Chl) else {
        return;
    };
    let values: Vec<Option<f64>> = chl.values.iter().map(|m| m.value.as_f64()).collect();
    let keep = outlier_mask(&values, threshold.unwrap_or(f64::INFINITY));
    let removed = keep.iter().filter(|k| !**k).count();
    if removed > 0 {
        log::info!("Removing {removed} outlier measurements from '{}'.", record.file_name);
    }
    record.retain_rows(&keep);
    record.recalc_repeat_coefficients();
}
