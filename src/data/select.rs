use super::model::{CanonicalName, CellValue, Column, Record, Rejection};

// ---------------------------------------------------------------------------
// Single-row reduction for stationary records
// ---------------------------------------------------------------------------

/// Depth columns tried in order; the shallowest row of the first one with any value wins.
const DEPTH_PREFERENCE: [CanonicalName; 3] = [
    CanonicalName::SampleDepth,
    CanonicalName::FloorDepth,
    CanonicalName::BotDepth,
];

fn is_invariant(record: &Record, name: CanonicalName) -> bool {
    record
        .column(name)
        .is_some_and(|c| c.repeat_coefficient == Some(1.0))
}

/// Time and position identical on every row.
pub fn is_stationary(record: &Record) -> bool {
    [CanonicalName::DateTime, CanonicalName::Lon, CanonicalName::Lat]
        .into_iter()
        .all(|name| is_invariant(record, name))
}

/// Index of the smallest present numeric value, earliest on ties.
pub fn argmin_present(column: &Column) -> Option<usize> {
    column
        .values
        .iter()
        .enumerate()
        .filter_map(|(i, m)| m.value.as_f64().map(|v| (i, v)))
        .fold(None, |best: Option<(usize, f64)>, (i, v)| match best {
            Some((_, b)) if b <= v => best,
            _ => Some((i, v)),
        })
        .map(|(i, _)| i)
}

/// Median of the given values; mean of the middle pair for even counts.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        Some(sorted[mid])
    } else {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    }
}

/// Reduce a stationary multi-row record to one representative row.
///
/// Records that already hold a single row, or whose time or position vary,
/// are left untouched.
pub fn reduce_to_representative(record: &mut Record) -> Result<(), Rejection> {
    record.recalc_repeat_coefficients();
    let rows = record.row_count().ok_or(Rejection::NoColumns)?;
    if rows <= 1 || !is_stationary(record) {
        return Ok(());
    }
    log::info!(
        "'{}' contains locationally and temporally invariant measurements. Selecting only one measurement.",
        record.file_name
    );

    let by_depth = DEPTH_PREFERENCE
        .iter()
        .find_map(|&name| record.column(name).and_then(argmin_present));
    match by_depth {
        Some(index) => record.keep_single_row(index),
        None => {
            let chl = record
                .column_mut(CanonicalName::Chl)
                .ok_or(Rejection::NoChlForMedian)?;
            let present: Vec<f64> = chl.values.iter().filter_map(|m| m.value.as_f64()).collect();
            chl.values[0].value = median(&present).map_or(CellValue::Missing, CellValue::Number);
            record.keep_single_row(0);
        }
    }
    record.recalc_repeat_coefficients();
    record.made_single = true;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{FileSettings, Measurement};

    fn numbers(name: CanonicalName, vals: &[Option<f64>]) -> Column {
        let values = vals
            .iter()
            .map(|v| Measurement::new(v.map_or(CellValue::Missing, CellValue::Number)))
            .collect();
        Column::new(name, name.as_str(), values)
    }

    fn stationary(chl: &[Option<f64>]) -> Record {
        let n = chl.len();
        let mut rec = Record::new("station", FileSettings::default());
        rec.columns.push(numbers(CanonicalName::Lon, &vec![Some(12.0); n]));
        rec.columns.push(numbers(CanonicalName::Lat, &vec![Some(55.0); n]));
        let time = (0..n)
            .map(|_| Measurement::new(CellValue::Text("2020-05-01T10:00:00".into())))
            .collect();
        rec.columns.push(Column::new(CanonicalName::DateTime, "YYYY-MM-DDTHH:MM:SS.SSS", time));
        rec.columns.push(numbers(CanonicalName::Chl, chl));
        rec
    }

    fn chl_value(rec: &Record) -> CellValue {
        rec.column(CanonicalName::Chl).unwrap().values[0].value.clone()
    }

    #[test]
    fn median_of_odd_and_even() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), Some(2.5));
        assert_eq!(median(&[]), None);
    }

    #[test]
    fn shallowest_sample_wins() {
        let mut rec = stationary(&[Some(1.0), Some(2.0), Some(3.0)]);
        rec.columns.push(numbers(CanonicalName::SampleDepth, &[Some(20.0), Some(5.0), Some(5.0)]));
        rec.columns.push(numbers(CanonicalName::BotDepth, &[Some(1.0), Some(2.0), Some(3.0)]));
        reduce_to_representative(&mut rec).unwrap();
        assert!(rec.made_single);
        assert!(rec.columns.iter().all(|c| c.len() == 1));
        assert_eq!(chl_value(&rec), CellValue::Number(2.0));
    }

    #[test]
    fn empty_depth_column_falls_through() {
        let mut rec = stationary(&[Some(1.0), Some(2.0), Some(3.0)]);
        rec.columns.push(numbers(CanonicalName::SampleDepth, &[None, None, None]));
        rec.columns.push(numbers(CanonicalName::FloorDepth, &[Some(30.0), Some(30.0), Some(10.0)]));
        reduce_to_representative(&mut rec).unwrap();
        assert_eq!(chl_value(&rec), CellValue::Number(3.0));
    }

    #[test]
    fn median_used_without_depths() {
        let mut rec = stationary(&[Some(1.0), Some(3.0), Some(2.0)]);
        reduce_to_representative(&mut rec).unwrap();
        assert!(rec.made_single);
        assert_eq!(chl_value(&rec), CellValue::Number(2.0));
    }

    #[test]
    fn moving_records_are_untouched() {
        let mut rec = stationary(&[Some(1.0), Some(2.0)]);
        rec.columns[0].values[1].value = CellValue::Number(12.5);
        reduce_to_representative(&mut rec).unwrap();
        assert!(!rec.made_single);
        assert_eq!(rec.row_count(), Some(2));
    }

    #[test]
    fn missing_chl_in_fallback_is_rejected() {
        let mut rec = stationary(&[Some(1.0), Some(2.0)]);
        rec.columns.retain(|c| c.name != CanonicalName::Chl);
        assert_eq!(reduce_to_representative(&mut rec), Err(Rejection::NoChlForMedian));
    }

    #[test]
    fn reduction_is_idempotent() {
        let mut rec = stationary(&[Some(4.0), Some(8.0)]);
        reduce_to_representative(&mut rec).unwrap();
        let first = chl_value(&rec);
        reduce_to_representative(&mut rec).unwrap();
        assert_eq!(chl_value(&rec), first);
        assert_eq!(rec.row_count(), Some(1));
        assert_eq!(first, CellValue::Number(6.0));
    }
}
