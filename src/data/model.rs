use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// CanonicalName – the fixed set of logical quantities
// ---------------------------------------------------------------------------

/// Logical quantity a source column is normalised onto.
///
/// Declaration order is the stable index used in diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CanonicalName {
    Cruise,
    Station,
    Type,
    Lon,
    Lat,
    DateTime,
    Chl,
    BotDepth,
    SampleDepth,
    FloorDepth,
}

/// How the raw text of a column is coerced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Text,
    Number,
    Timestamp,
}

impl CanonicalName {
    pub const ALL: [CanonicalName; 10] = [
        CanonicalName::Cruise,
        CanonicalName::Station,
        CanonicalName::Type,
        CanonicalName::Lon,
        CanonicalName::Lat,
        CanonicalName::DateTime,
        CanonicalName::Chl,
        CanonicalName::BotDepth,
        CanonicalName::SampleDepth,
        CanonicalName::FloorDepth,
    ];

    /// Columns a record must carry to be usable.
    pub const REQUIRED: [CanonicalName; 4] = [
        CanonicalName::Lon,
        CanonicalName::Lat,
        CanonicalName::DateTime,
        CanonicalName::Chl,
    ];

    /// Descriptive columns lifted out of the table into record metadata.
    pub const METADATA: [CanonicalName; 3] = [
        CanonicalName::Cruise,
        CanonicalName::Station,
        CanonicalName::Type,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CanonicalName::Cruise => "Cruise",
            CanonicalName::Station => "Station",
            CanonicalName::Type => "Type",
            CanonicalName::Lon => "Lon",
            CanonicalName::Lat => "Lat",
            CanonicalName::DateTime => "DateTime",
            CanonicalName::Chl => "Chl",
            CanonicalName::BotDepth => "BotDepth",
            CanonicalName::SampleDepth => "SampleDepth",
            CanonicalName::FloorDepth => "FloorDepth",
        }
    }

    pub fn kind(self) -> ValueKind {
        match self {
            CanonicalName::Cruise | CanonicalName::Station | CanonicalName::Type => ValueKind::Text,
            CanonicalName::DateTime => ValueKind::Timestamp,
            _ => ValueKind::Number,
        }
    }

    pub fn is_required(self) -> bool {
        Self::REQUIRED.contains(&self)
    }
}

impl fmt::Display for CanonicalName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// CellValue – a single typed cell
// ---------------------------------------------------------------------------

/// A coerced cell value. Timestamps are kept as canonical ISO-8601 text.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    Text(String),
    Number(f64),
    #[default]
    Missing,
}

impl CellValue {
    pub fn is_missing(&self) -> bool {
        matches!(self, CellValue::Missing)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) => write!(f, "{s}"),
            CellValue::Number(v) => write!(f, "{v:10.3}"),
            CellValue::Missing => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// Measurement – one cell plus its cleaning flags
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    pub value: CellValue,
    /// Quality code from an attached `QV:SEADATANET` column.
    pub quality: Option<i32>,
    pub valid: bool,
    /// Value was carried forward from an earlier row.
    pub copied: bool,
    /// Value equals the previous row's value in the same column.
    pub is_repeated: bool,
}

impl Measurement {
    pub fn new(value: CellValue) -> Self {
        Measurement {
            value,
            quality: None,
            valid: true,
            copied: false,
            is_repeated: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Column – one canonical quantity across all rows
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Column {
    pub name: CanonicalName,
    /// Header text exactly as it appeared in the source file.
    pub original_name: String,
    pub values: Vec<Measurement>,
    /// Every row after the first was filled by carry-forward.
    pub repeating: bool,
    /// Share of adjacent row pairs with equal values; `None` for zero rows.
    pub repeat_coefficient: Option<f64>,
    pub low_priority: bool,
}

impl Column {
    pub fn new(name: CanonicalName, original_name: impl Into<String>, values: Vec<Measurement>) -> Self {
        Column {
            name,
            original_name: original_name.into(),
            values,
            repeating: false,
            repeat_coefficient: None,
            low_priority: false,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn recalc_repeat_coefficient(&mut self) {
        self.repeat_coefficient = repeat_coefficient(&self.values);
    }

    /// Flag every measurement equal to its predecessor. The first row is left untouched.
    pub fn mark_repeats(&mut self) {
        for i in 1..self.values.len() {
            let repeated = self.values[i].value == self.values[i - 1].value;
            self.values[i].is_repeated = repeated;
        }
    }

    /// Keep the rows whose mask entry is `true`.
    pub fn retain_rows(&mut self, keep: &[bool]) {
        self.values = std::mem::take(&mut self.values)
            .into_iter()
            .zip(keep)
            .filter_map(|(m, &k)| k.then_some(m))
            .collect();
    }
}

/// Fraction of adjacent pairs holding equal values.
pub fn repeat_coefficient(values: &[Measurement]) -> Option<f64> {
    match values.len() {
        0 => None,
        1 => Some(0.0),
        n => {
            let repeats = values
                .windows(2)
                .filter(|pair| pair[0].value == pair[1].value)
                .count();
            Some(repeats as f64 / (n - 1) as f64)
        }
    }
}

// ---------------------------------------------------------------------------
// File settings supplied by the manifest
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectMode {
    #[default]
    All,
    /// Keep only the first row before cleaning.
    First,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileSettings {
    pub quality: Option<f64>,
    pub select: SelectMode,
    pub file_mark: Option<String>,
}

// ---------------------------------------------------------------------------
// Rejection – why a record left the pipeline
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Rejection {
    #[error("required column {0} is missing")]
    MissingColumn(CanonicalName),
    #[error("no measurements left")]
    NoRows,
    #[error("record has no columns")]
    NoColumns,
    #[error("no Chl column to take the median from")]
    NoChlForMedian,
}

// ---------------------------------------------------------------------------
// Record – one input file's worth of samples
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Record {
    pub file_name: String,
    pub columns: Vec<Column>,
    pub valid: bool,
    pub made_single: bool,
    pub metadata: BTreeMap<CanonicalName, CellValue>,
    pub settings: FileSettings,
}

impl Record {
    pub fn new(file_name: impl Into<String>, settings: FileSettings) -> Self {
        Record {
            file_name: file_name.into(),
            columns: Vec::new(),
            valid: true,
            made_single: false,
            metadata: BTreeMap::new(),
            settings,
        }
    }

    /// First primary column with the given name.
    pub fn column(&self, name: CanonicalName) -> Option<&Column> {
        self.columns
            .iter()
            .find(|c| c.name == name && !c.low_priority)
    }

    pub fn column_mut(&mut self, name: CanonicalName) -> Option<&mut Column> {
        self.columns
            .iter_mut()
            .find(|c| c.name == name && !c.low_priority)
    }

    /// Row count shared by all columns, `None` when there are no columns.
    pub fn row_count(&self) -> Option<usize> {
        self.columns.first().map(Column::len)
    }

    /// Validity invariant: every required column present and at least one row.
    pub fn check(&self) -> Result<(), Rejection> {
        for name in CanonicalName::REQUIRED {
            if !self.columns.iter().any(|c| c.name == name) {
                return Err(Rejection::MissingColumn(name));
            }
        }
        match self.row_count() {
            Some(0) => Err(Rejection::NoRows),
            Some(_) => Ok(()),
            None => Err(Rejection::NoColumns),
        }
    }

    /// Drop rows in lockstep across every column.
    pub fn retain_rows(&mut self, keep: &[bool]) {
        for column in &mut self.columns {
            column.retain_rows(keep);
        }
    }

    /// Truncate every column to the single row at `index`.
    pub fn keep_single_row(&mut self, index: usize) {
        let rows = self.row_count().unwrap_or(0);
        let keep: Vec<bool> = (0..rows).map(|i| i == index).collect();
        self.retain_rows(&keep);
    }

    pub fn recalc_repeat_coefficients(&mut self) {
        for column in &mut self.columns {
            column.recalc_repeat_coefficient();
        }
    }

    /// Rows where every required column holds a valid measurement.
    pub fn valid_count(&self) -> usize {
        let required: Vec<&Column> = self
            .columns
            .iter()
            .filter(|c| c.name.is_required())
            .collect();
        (0..self.row_count().unwrap_or(0))
            .filter(|&i| required.iter().all(|c| c.values.get(i).is_some_and(|m| m.valid)))
            .count()
    }
}

// -- Table dump for debug logging --

fn flag(b: bool) -> char {
    if b {
        'T'
    } else {
        'F'
    }
}

fn render_cell(m: &Measurement) -> String {
    let quality = m.quality.map(|q| q.to_string()).unwrap_or_else(|| " ".into());
    format!(
        " q{quality} v{} c{} r{} {} ",
        flag(m.valid),
        flag(m.copied),
        flag(m.is_repeated),
        m.value
    )
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "File name: '{}'", self.file_name)?;
        writeln!(f, "Is valid: {}", self.valid)?;
        writeln!(f, "Was made single: {}", self.made_single)?;
        writeln!(f, "Metadata:")?;
        for (key, value) in &self.metadata {
            writeln!(f, "    '{key}': '{value}'")?;
        }
        writeln!(f, "Settings:")?;
        writeln!(f, "    quality: {:?}", self.settings.quality)?;
        writeln!(f, "    select: {:?}", self.settings.select)?;
        writeln!(f, "    file mark: {:?}", self.settings.file_mark)?;
        writeln!(f, "Table:")?;

        let labels = [
            "Original name:",
            "Is repeating:",
            "Low priority:",
            "Repeat coefficient:",
            "Column name:",
        ];
        let mut blocks: Vec<Vec<String>> = vec![labels.iter().map(|s| s.to_string()).collect()];
        for column in &self.columns {
            let mut block = vec![
                column.original_name.clone(),
                column.repeating.to_string(),
                column.low_priority.to_string(),
                column
                    .repeat_coefficient
                    .map(|c| format!("{c:.4}"))
                    .unwrap_or_default(),
                column.name.to_string(),
            ];
            block.extend(column.values.iter().map(render_cell));
            blocks.push(block);
        }

        let rows = blocks.iter().map(Vec::len).max().unwrap_or(0);
        let widths: Vec<usize> = blocks
            .iter()
            .map(|b| b.iter().map(|s| s.chars().count()).max().unwrap_or(0))
            .collect();
        for row in 0..rows {
            let line: Vec<String> = blocks
                .iter()
                .zip(&widths)
                .enumerate()
                .map(|(i, (block, &w))| {
                    let cell = block.get(row).map(String::as_str).unwrap_or("");
                    if i == 0 {
                        format!("{cell:>w$}")
                    } else {
                        format!("{cell:^w$}")
                    }
                })
                .collect();
            writeln!(f, "{}", line.join("|"))?;
        }
        Ok(())
    }
}
