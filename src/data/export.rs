use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use super::model::{CanonicalName, Record};

// ---------------------------------------------------------------------------
// Flat output rows
// ---------------------------------------------------------------------------

pub const OUTPUT_HEADER: [&str; 15] = [
    "file_id",
    "seq_in",
    "total_in",
    "seq_all",
    "date_time",
    "exact_datetime",
    "lon",
    "lat",
    "chl",
    "chl_repeat_coef",
    "bot_depth",
    "floor_depth",
    "sample_depth",
    "quality",
    "file_type",
];

/// Fixed decimal places per output field.
const COORD_PRECISION: usize = 6;
const CHL_PRECISION: usize = 4;
const COEF_PRECISION: usize = 4;
const DEPTH_PRECISION: usize = 2;
const QUALITY_PRECISION: usize = 1;

/// One line of the output file. `None` fields are written empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputRow {
    pub file_id: usize,
    pub seq_in: usize,
    pub total_in: usize,
    pub seq_all: usize,
    pub date_time: Option<String>,
    pub exact_datetime: Option<&'static str>,
    pub lon: Option<String>,
    pub lat: Option<String>,
    pub chl: Option<String>,
    pub chl_repeat_coef: Option<String>,
    pub bot_depth: Option<String>,
    pub floor_depth: Option<String>,
    pub sample_depth: Option<String>,
    pub quality: Option<String>,
    pub file_type: Option<String>,
}

fn number_at(record: &Record, name: CanonicalName, row: usize, precision: usize) -> Option<String> {
    record
        .column(name)
        .and_then(|c| c.values.get(row))
        .and_then(|m| m.value.as_f64())
        .map(|v| format!("{v:.precision$}"))
}

fn text_at(record: &Record, name: CanonicalName, row: usize) -> Option<String> {
    record
        .column(name)
        .and_then(|c| c.values.get(row))
        .and_then(|m| m.value.as_text())
        .map(str::to_string)
}

/// Flatten cleaned records into output rows. File ids are 1-based in input order.
pub fn output_rows(records: &[Record]) -> Vec<OutputRow> {
    let mut rows = Vec::new();
    let mut seq_all = 0;
    for (file_id, record) in records.iter().enumerate() {
        let total = record.row_count().unwrap_or(0);
        let exact = record
            .column(CanonicalName::DateTime)
            .map(|c| if c.repeating { "N" } else { "Y" });
        let coef = record
            .column(CanonicalName::Chl)
            .and_then(|c| c.repeat_coefficient)
            .map(|c| format!("{c:.COEF_PRECISION$}"));
        let quality = record
            .settings
            .quality
            .map(|q| format!("{q:.QUALITY_PRECISION$}"));

        for row in 0..total {
            seq_all += 1;
            rows.push(OutputRow {
                file_id: file_id + 1,
                seq_in: row + 1,
                total_in: total,
                seq_all,
                date_time: text_at(record, CanonicalName::DateTime, row),
                exact_datetime: exact,
                lon: number_at(record, CanonicalName::Lon, row, COORD_PRECISION),
                lat: number_at(record, CanonicalName::Lat, row, COORD_PRECISION),
                chl: number_at(record, CanonicalName::Chl, row, CHL_PRECISION),
                chl_repeat_coef: coef.clone(),
                bot_depth: number_at(record, CanonicalName::BotDepth, row, DEPTH_PRECISION),
                floor_depth: number_at(record, CanonicalName::FloorDepth, row, DEPTH_PRECISION),
                sample_depth: number_at(record, CanonicalName::SampleDepth, row, DEPTH_PRECISION),
                quality: quality.clone(),
                file_type: record.settings.file_mark.clone(),
            });
        }
    }
    rows
}

/// Write the header and every row. Returns the number of rows written.
pub fn write_rows<W: Write>(writer: W, records: &[Record]) -> Result<usize> {
    let mut out = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    out.write_record(OUTPUT_HEADER).context("writing CSV header")?;
    let rows = output_rows(records);
    for row in &rows {
        out.serialize(row)
            .with_context(|| format!("writing output row {}", row.seq_all))?;
    }
    out.flush().context("flushing CSV output")?;
    Ok(rows.len())
}

pub fn write_csv(path: &Path, records: &[Record]) -> Result<usize> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("creating output file {}", path.display()))?;
    write_rows(file, records)
}
