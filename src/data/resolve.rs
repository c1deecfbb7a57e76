use super::coerce;
use super::loader::RawFile;
use super::model::{CanonicalName, CellValue, Column, Measurement, Record};

// ---------------------------------------------------------------------------
// Header synonym table
// ---------------------------------------------------------------------------

/// Upper-cased source header → canonical quantity.
const SYNONYMS: &[(&str, CanonicalName)] = &[
    ("CRUISE", CanonicalName::Cruise),
    ("STATION", CanonicalName::Station),
    ("TYPE", CanonicalName::Type),
    ("YYYY-MM-DDTHH:MM:SS.SSS", CanonicalName::DateTime),
    ("TIME_ISO8601 [YYYY-MM-DDTHH:MM:SS.SSS]", CanonicalName::DateTime),
    ("BOT. DEPTH [M]", CanonicalName::BotDepth),
    ("LATITUDE [DEGREES_NORTH]", CanonicalName::Lat),
    ("LONGITUDE [DEGREES_EAST]", CanonicalName::Lon),
    ("SEA-FLOOR DEPTH [M]", CanonicalName::FloorDepth),
    ("CPHLFLP1 [MICROGRAMS PER LITRE]", CanonicalName::Chl),
    ("CPHLFLP2 [MICROGRAMS PER LITRE]", CanonicalName::Chl),
    ("CPHLPRKG [MICROGRAMS PER LITRE]", CanonicalName::Chl),
    ("CPHLPL01 [MILLIGRAMS PER CUBIC METRE]", CanonicalName::Chl),
    ("CPHLZZXX [MILLIGRAMS PER CUBIC METRE]", CanonicalName::Chl),
    ("CHLOROPHYLL A [UG/L]", CanonicalName::Chl),
    ("CHLOROPHYLL A [MICROG/L]", CanonicalName::Chl),
    ("CHLOROPHYLL-A [UG/L]", CanonicalName::Chl),
    ("CHLOROPHYLL-A [MG/M^3]", CanonicalName::Chl),
    ("CPWC [MILLIGRAM/M3]", CanonicalName::Chl),
    ("ADEPZZ01 [METERS]", CanonicalName::SampleDepth),
    ("ADEPZZ01 [METRES]", CanonicalName::SampleDepth),
    ("ADEPZZ01 [M]", CanonicalName::SampleDepth),
    ("DEPTH [M]", CanonicalName::SampleDepth),
    ("DEPTH OF SAMPLING [M]", CanonicalName::SampleDepth),
    ("DEPTH BELOW SURFACE OF THE WATER BODY [M]", CanonicalName::SampleDepth),
    ("DEPBELOWSURFACE [M]", CanonicalName::SampleDepth),
];

/// Header of the column carrying quality codes for the column before it.
pub const QUALITY_HEADER: &str = "QV:SEADATANET";

/// Preferred source headers per quantity, best first.
pub fn priority_list(name: CanonicalName) -> &'static [&'static str] {
    match name {
        CanonicalName::DateTime => &[
            "YYYY-MM-DDTHH:MM:SS.SSS",
            "TIME_ISO8601 [YYYY-MM-DDTHH:MM:SS.SSS]",
        ],
        CanonicalName::Lon => &["LONGITUDE [DEGREES_EAST]"],
        CanonicalName::Lat => &["LATITUDE [DEGREES_NORTH]"],
        CanonicalName::Chl => &[
            "CPHLPL01 [MILLIGRAMS PER CUBIC METRE]",
            "CHLOROPHYLL-A [MG/M^3]",
            "CPHLFLP2 [MICROGRAMS PER LITRE]",
            "CHLOROPHYLL-A [UG/L]",
            "CPWC [MILLIGRAM/M3]",
            "CHLOROPHYLL A [MICROG/L]",
            "CHLOROPHYLL A [UG/L]",
            "CPHLFLP1 [MICROGRAMS PER LITRE]",
            "CPHLPRKG [MICROGRAMS PER LITRE]",
            "CPHLZZXX [MILLIGRAMS PER CUBIC METRE]",
        ],
        CanonicalName::BotDepth => &["BOT. DEPTH [M]"],
        CanonicalName::FloorDepth => &["SEA-FLOOR DEPTH [M]"],
        CanonicalName::SampleDepth => &[
            "DEPBELOWSURFACE [M]",
            "ADEPZZ01 [METRES]",
            "ADEPZZ01 [M]",
            "DEPTH OF SAMPLING [M]",
            "DEPTH [M]",
            "DEPTH BELOW SURFACE OF THE WATER BODY [M]",
            "ADEPZZ01 [METERS]",
        ],
        CanonicalName::Cruise | CanonicalName::Station | CanonicalName::Type => &[],
    }
}

pub fn canonical_for_header(header: &str) -> Option<CanonicalName> {
    let upper = header.trim().to_uppercase();
    SYNONYMS
        .iter()
        .find(|(synonym, _)| *synonym == upper)
        .map(|&(_, name)| name)
}

fn is_quality_header(header: &str) -> bool {
    header.trim().eq_ignore_ascii_case(QUALITY_HEADER)
}

/// Position of a header in its quantity's priority list; lower is better.
pub fn priority_rank(name: CanonicalName, original_name: &str) -> Option<usize> {
    let upper = original_name.trim().to_uppercase();
    priority_list(name).iter().position(|p| *p == upper)
}

// ---------------------------------------------------------------------------
// Raw file → Record
// ---------------------------------------------------------------------------

/// Build a record from raw headers and cells, then coerce every column.
///
/// Unknown headers are dropped. A quality header attaches its codes to the
/// column right before it, as long as that column was recognised.
pub fn resolve(raw: &RawFile) -> Record {
    let mut record = Record::new(raw.file_name(), raw.settings.clone());
    let mut previous: Option<usize> = None;

    for (header, cells) in raw.headers.iter().zip(&raw.columns) {
        if is_quality_header(header) {
            if let Some(idx) = previous {
                attach_quality(&mut record.columns[idx], cells);
            }
            continue;
        }
        match canonical_for_header(header) {
            Some(name) => {
                let values = cells
                    .iter()
                    .map(|cell| Measurement::new(CellValue::Text(cell.clone())))
                    .collect();
                log::debug!("Column '{header}' resolved to {name} (#{}).", name.index());
                record.columns.push(Column::new(name, header.clone(), values));
                previous = Some(record.columns.len() - 1);
            }
            None => {
                log::debug!("Ignoring unrecognised column '{header}'.");
                previous = None;
            }
        }
    }

    coerce::coerce_record(&mut record);
    record
}

fn attach_quality(column: &mut Column, codes: &[String]) {
    for (m, code) in column.values.iter_mut().zip(codes) {
        m.quality = code.trim().parse::<i32>().ok();
    }
}

// ---------------------------------------------------------------------------
// Duplicate column elimination
// ---------------------------------------------------------------------------

/// Keep one column per quantity when several headers resolved onto it.
///
/// The best-ranked header wins, ties go to the earlier column. When none of
/// the candidates is ranked, every candidate is dropped.
pub fn eliminate_duplicate_columns(record: &mut Record) {
    for name in CanonicalName::ALL {
        if priority_list(name).is_empty() {
            continue;
        }
        let candidates: Vec<usize> = record
            .columns
            .iter()
            .enumerate()
            .filter(|(_, c)| c.name == name)
            .map(|(i, _)| i)
            .collect();
        if candidates.len() < 2 {
            continue;
        }

        let primary = candidates
            .iter()
            .filter_map(|&i| priority_rank(name, &record.columns[i].original_name).map(|r| (r, i)))
            .min()
            .map(|(_, i)| i);

        if primary.is_none() {
            log::warn!(
                "None of the {} candidate {name} columns is ranked; dropping all of them.",
                candidates.len()
            );
        }
        for i in candidates {
            if Some(i) != primary {
                record.columns[i].low_priority = true;
            }
        }
    }
    record.columns.retain(|c| !c.low_priority);
}
