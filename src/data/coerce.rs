use once_cell::sync::Lazy;
use regex::Regex;

use super::model::{CellValue, Column, Record, ValueKind};

// ---------------------------------------------------------------------------
// Typed parsing of raw cell text
// ---------------------------------------------------------------------------

/// Year, month, day, hour, minute, second with any single-character separators.
/// Date and time may be joined by `T`, whitespace, or nothing at all.
static TIMESTAMP_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?P<year>[0-9]{4}).(?P<month>[0-9]{1,2}).(?P<day>[0-9]{1,2})(?:[Tt]|\s+)?(?P<hour>[0-9]{1,2}).(?P<minute>[0-9]{1,2}).(?P<second>[0-9]{1,2})",
    )
    .expect("timestamp pattern compiles")
});

pub fn coerce_text(raw: &str) -> CellValue {
    if raw.is_empty() {
        CellValue::Missing
    } else {
        CellValue::Text(raw.to_string())
    }
}

/// Parse a real number, accepting a decimal comma. Failures become `Missing`.
pub fn coerce_number(raw: &str, column: &str) -> CellValue {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return CellValue::Missing;
    }
    match trimmed.replace(',', ".").parse::<f64>() {
        Ok(v) if v.is_finite() => CellValue::Number(v),
        _ => {
            log::warn!("Failed to parse value '{raw}' into a number for column '{column}'.");
            CellValue::Missing
        }
    }
}

/// Re-serialise a timestamp as `YYYY-MM-DDTHH:MM:SS`.
///
/// Out-of-range components are reported but still emitted. Text that does not
/// match the pattern is kept verbatim.
pub fn coerce_timestamp(raw: &str) -> CellValue {
    if raw.is_empty() {
        return CellValue::Missing;
    }
    let Some(caps) = TIMESTAMP_RE.captures(raw) else {
        return CellValue::Text(raw.to_string());
    };
    let part = |name: &str| caps[name].parse::<u32>().unwrap_or(0);
    let (year, month, day) = (part("year"), part("month"), part("day"));
    let (hour, minute, second) = (part("hour"), part("minute"), part("second"));

    if month > 12 || day > 31 || hour >= 24 || minute >= 60 || second >= 60 {
        log::warn!("Parsed datetime is not correct: '{raw}'.");
    }
    CellValue::Text(format!(
        "{year:04}-{month:02}-{day:02}T{hour:02}:{minute:02}:{second:02}"
    ))
}

/// Replace the raw text held in every cell with its typed value.
pub fn coerce_column(column: &mut Column) {
    let kind = column.name.kind();
    let label = column.name.as_str();
    for m in &mut column.values {
        let raw = match std::mem::take(&mut m.value) {
            CellValue::Text(s) => s,
            other => {
                m.value = other;
                continue;
            }
        };
        m.value = match kind {
            ValueKind::Text => coerce_text(&raw),
            ValueKind::Number => coerce_number(&raw, label),
            ValueKind::Timestamp => coerce_timestamp(&raw),
        };
    }
}

pub fn coerce_record(record: &mut Record) {
    for column in &mut record.columns {
        coerce_column(column);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{CanonicalName, Measurement};

    #[test]
    fn numbers_accept_decimal_comma() {
        assert_eq!(coerce_number("1,25", "Chl"), CellValue::Number(1.25));
        assert_eq!(coerce_number(" -3.5 ", "Lon"), CellValue::Number(-3.5));
    }

    #[test]
    fn unparsable_numbers_become_missing() {
        assert_eq!(coerce_number("", "Chl"), CellValue::Missing);
        assert_eq!(coerce_number("n/a", "Chl"), CellValue::Missing);
        assert_eq!(coerce_number("NaN", "Chl"), CellValue::Missing);
    }

    #[test]
    fn timestamps_are_canonicalised() {
        assert_eq!(
            coerce_timestamp("2019-7-4T3:05:09.000"),
            CellValue::Text("2019-07-04T03:05:09".into())
        );
        assert_eq!(
            coerce_timestamp("2019/07/04 13:05:09"),
            CellValue::Text("2019-07-04T13:05:09".into())
        );
    }

    #[test]
    fn out_of_range_timestamps_still_emitted() {
        assert_eq!(
            coerce_timestamp("2019-13-40T25:61:61"),
            CellValue::Text("2019-13-40T25:61:61".into())
        );
    }

    #[test]
    fn unmatched_timestamps_stay_opaque() {
        assert_eq!(coerce_timestamp("yesterday"), CellValue::Text("yesterday".into()));
        assert_eq!(coerce_timestamp(""), CellValue::Missing);
    }

    #[test]
    fn coerce_column_keeps_row_count() {
        let raw = ["1.0", "", "x", "2,5"];
        let values = raw
            .iter()
            .map(|s| Measurement::new(CellValue::Text(s.to_string())))
            .collect();
        let mut col = Column::new(CanonicalName::Chl, "CHLOROPHYLL A [UG/L]", values);
        coerce_column(&mut col);
        let got: Vec<CellValue> = col.values.into_iter().map(|m| m.value).collect();
        assert_eq!(
            got,
            vec![
                CellValue::Number(1.0),
                CellValue::Missing,
                CellValue::Missing,
                CellValue::Number(2.5)
            ]
        );
    }
}
