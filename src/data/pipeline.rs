use crate::config::CleaningConfig;

use super::model::{CanonicalName, Record, Rejection};
use super::{filter, outlier, repeat, resolve, select};

// ---------------------------------------------------------------------------
// Stage table
// ---------------------------------------------------------------------------

/// A cleaning step. It mutates the record and may reject it outright.
pub type Stage = fn(&mut Record, &CleaningConfig) -> Result<(), Rejection>;

/// Cleaning stages in execution order. The validity invariant is re-checked
/// after every one of them.
pub const STAGES: &[(&str, Stage)] = &[
    ("computing repeat statistics", |r, _| {
        for column in &mut r.columns {
            column.mark_repeats();
            column.recalc_repeat_coefficient();
        }
        Ok(())
    }),
    ("removing duplicate columns", |r, _| {
        resolve::eliminate_duplicate_columns(r);
        Ok(())
    }),
    ("lifting descriptive columns into metadata", |r, _| {
        lift_metadata(r);
        Ok(())
    }),
    ("marking zero, negative or missing Chl values as invalid", |r, _| {
        filter::mark_non_positive_chl(r);
        Ok(())
    }),
    ("marking Chl values with unacceptable quality as invalid", |r, _| {
        filter::mark_bad_quality(r);
        Ok(())
    }),
    ("removing measurements with invalid Chl data", |r, _| {
        filter::drop_invalid_chl_rows(r);
        Ok(())
    }),
    ("removing outlier values", |r, c| {
        outlier::drop_outliers(r, c.z_score_threshold);
        Ok(())
    }),
    ("repeating missing measurements", |r, _| {
        repeat::carry_forward(r);
        Ok(())
    }),
    ("selecting a representative measurement", |r, _| {
        select::reduce_to_representative(r)
    }),
    ("removing sequentially repeated Chl values", |r, c| {
        repeat::drop_repeated_runs(r, c.repeat_coefficient_threshold);
        Ok(())
    }),
];

/// Move the first value of each descriptive column into metadata and drop
/// those columns from the table.
pub fn lift_metadata(record: &mut Record) {
    for name in CanonicalName::METADATA {
        if let Some(first) = record.column(name).and_then(|c| c.values.first()) {
            let value = first.value.clone();
            record.metadata.insert(name, value);
        }
    }
    record
        .columns
        .retain(|c| !CanonicalName::METADATA.contains(&c.name));
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum Outcome {
    Clean(Record),
    Rejected {
        record: Record,
        stage: &'static str,
        reason: Rejection,
    },
}

impl Outcome {
    pub fn into_clean(self) -> Option<Record> {
        match self {
            Outcome::Clean(record) => Some(record),
            Outcome::Rejected { .. } => None,
        }
    }
}

fn run_stages(record: &mut Record, config: &CleaningConfig) -> Result<(), (&'static str, Rejection)> {
    record.check().map_err(|e| ("initial validation", e))?;
    for &(name, stage) in STAGES {
        stage(record, config)
            .and_then(|()| record.check())
            .map_err(|e| (name, e))?;
        log::info!("{} valid measurements: done {name}.", record.valid_count());
        if config.print_table_after_each_step {
            log::debug!("Record:\n{record}");
        }
    }
    Ok(())
}

/// Clean one record. Stops at the first stage that leaves it invalid.
pub fn clean(mut record: Record, config: &CleaningConfig) -> Outcome {
    log::info!(
        "Started processing '{}': {} valid measurements.",
        record.file_name,
        record.valid_count()
    );
    if config.print_table_at_start {
        log::debug!("Record:\n{record}");
    }

    match run_stages(&mut record, config) {
        Ok(()) => {
            if config.print_table_at_end && !config.print_table_after_each_step {
                log::debug!("Record:\n{record}");
            }
            Outcome::Clean(record)
        }
        Err((stage, reason)) => {
            record.valid = false;
            log::warn!(
                "'{}' became invalid while {stage} ({reason}) and will not be included in the result.",
                record.file_name
            );
            Outcome::Rejected {
                record,
                stage,
                reason,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::RawFile;
    use crate::data::model::{CellValue, FileSettings};
    use std::path::PathBuf;

    fn raw(headers: &[&str], rows: &[&[&str]]) -> Record {
        let columns = (0..headers.len())
            .map(|i| rows.iter().map(|r| r[i].to_string()).collect())
            .collect();
        resolve::resolve(&RawFile {
            path: PathBuf::from("cruise/station.txt"),
            settings: FileSettings::default(),
            headers: headers.iter().map(|s| s.to_string()).collect(),
            columns,
        })
    }

    const POSITION: [&str; 3] = [
        "LONGITUDE [DEGREES_EAST]",
        "LATITUDE [DEGREES_NORTH]",
        "YYYY-MM-DDTHH:MM:SS.SSS",
    ];

    #[test]
    fn stationary_profile_reduces_to_median() {
        let rec = raw(
            &[POSITION[0], POSITION[1], POSITION[2], "CHLOROPHYLL A [UG/L]"],
            &[
                &["14.2", "54.1", "2018-06-01T12:00:00.000", "1.0"],
                &["14.2", "54.1", "2018-06-01T12:00:00.000", "2.0"],
                &["14.2", "54.1", "2018-06-01T12:00:00.000", "3.0"],
            ],
        );
        let out = clean(rec, &CleaningConfig::default()).into_clean().unwrap();
        assert!(out.made_single);
        assert_eq!(out.row_count(), Some(1));
        assert_eq!(
            out.column(CanonicalName::Chl).unwrap().values[0].value,
            CellValue::Number(2.0)
        );
    }

    fn sensor_run(config: &CleaningConfig) -> Record {
        let rec = raw(
            &[
                POSITION[0],
                POSITION[1],
                POSITION[2],
                "CHLOROPHYLL A [UG/L]",
                "QV:SEADATANET",
            ],
            &[
                &["10.0", "54.0", "2018-06-01T12:00:00", "5", "1"],
                &["10.1", "54.0", "2018-06-01T12:01:00", "5", "1"],
                &["10.2", "54.0", "2018-06-01T12:02:00", "5", "1"],
                &["10.3", "54.0", "2018-06-01T12:03:00", "5", "1"],
                &["10.4", "54.0", "2018-06-01T12:04:00", "-1", "3"],
            ],
        );
        clean(rec, config).into_clean().unwrap()
    }

    #[test]
    fn bad_row_removed_and_runs_kept_by_default() {
        let out = sensor_run(&CleaningConfig::default());
        assert_eq!(out.row_count(), Some(4));
        let chl = out.column(CanonicalName::Chl).unwrap();
        assert_eq!(chl.repeat_coefficient, Some(1.0));
        assert!(chl.values.iter().all(|m| m.value == CellValue::Number(5.0)));
    }

    #[test]
    fn runs_collapse_when_threshold_enabled() {
        let config = CleaningConfig {
            repeat_coefficient_threshold: 0.9,
            ..CleaningConfig::default()
        };
        let out = sensor_run(&config);
        assert_eq!(out.row_count(), Some(1));
        assert!(out.columns.iter().all(|c| c.len() == 1));
    }

    #[test]
    fn missing_latitude_rejected_up_front() {
        let rec = raw(
            &[POSITION[0], POSITION[2], "CHLOROPHYLL A [UG/L]"],
            &[&["14.2", "2018-06-01T12:00:00", "1.0"]],
        );
        match clean(rec, &CleaningConfig::default()) {
            Outcome::Rejected { record, stage, reason } => {
                assert_eq!(stage, "initial validation");
                assert_eq!(reason, Rejection::MissingColumn(CanonicalName::Lat));
                assert!(!record.valid);
            }
            Outcome::Clean(_) => panic!("record without latitude survived"),
        }
    }

    #[test]
    fn all_invalid_chl_rejects_record() {
        let rec = raw(
            &[POSITION[0], POSITION[1], POSITION[2], "CPWC [MILLIGRAM/M3]"],
            &[
                &["1", "2", "2018-06-01T12:00:00", "0"],
                &["1", "2", "2018-06-01T12:00:00", ""],
            ],
        );
        match clean(rec, &CleaningConfig::default()) {
            Outcome::Rejected { stage, reason, .. } => {
                assert_eq!(stage, "removing measurements with invalid Chl data");
                assert_eq!(reason, Rejection::NoRows);
            }
            Outcome::Clean(_) => panic!("empty record survived"),
        }
    }

    #[test]
    fn metadata_lifted_out_of_table() {
        let rec = raw(
            &["Cruise", "Station", POSITION[0], POSITION[1], POSITION[2], "CPWC [MILLIGRAM/M3]"],
            &[
                &["64PE", "St 7", "1", "2", "2018-06-01T12:00:00", "0.5"],
                &["64PE", "St 7", "1", "2", "2018-06-01T13:00:00", "0.7"],
            ],
        );
        let out = clean(rec, &CleaningConfig::default()).into_clean().unwrap();
        assert_eq!(out.metadata[&CanonicalName::Cruise], CellValue::Text("64PE".into()));
        assert_eq!(out.metadata[&CanonicalName::Station], CellValue::Text("St 7".into()));
        assert!(!out.metadata.contains_key(&CanonicalName::Type));
        assert!(out.columns.iter().all(|c| !CanonicalName::METADATA.contains(&c.name)));
        assert_eq!(out.row_count(), Some(2));
    }

    #[test]
    fn broadcast_time_marks_column_repeating() {
        let rec = raw(
            &[POSITION[0], POSITION[1], POSITION[2], "CPWC [MILLIGRAM/M3]", "DEPTH [M]"],
            &[
                &["1", "2", "2018-06-01T12:00:00", "0.5", "1"],
                &["", "", "", "0.7", "5"],
                &["", "", "", "0.9", "10"],
            ],
        );
        let out = clean(rec, &CleaningConfig::default()).into_clean().unwrap();
        // Position and time are broadcast, so the shallowest sample stands in.
        assert!(out.made_single);
        assert!(out.column(CanonicalName::DateTime).unwrap().repeating);
        assert_eq!(
            out.column(CanonicalName::Chl).unwrap().values[0].value,
            CellValue::Number(0.5)
        );
    }

    #[test]
    fn every_row_of_survivor_is_positive_and_acceptable() {
        let rec = raw(
            &[POSITION[0], POSITION[1], POSITION[2], "CPWC [MILLIGRAM/M3]", "QV:SEADATANET"],
            &[
                &["1", "2", "2018-06-01T12:00:00", "0.5", "1"],
                &["1.1", "2", "2018-06-01T12:05:00", "0.6", "4"],
                &["1.2", "2", "2018-06-01T12:10:00", "0.7", ""],
                &["1.3", "2", "2018-06-01T12:15:00", "0.8", "2"],
            ],
        );
        let out = clean(rec, &CleaningConfig::default()).into_clean().unwrap();
        let chl = out.column(CanonicalName::Chl).unwrap();
        assert_eq!(chl.len(), 3);
        for m in &chl.values {
            assert!(m.value.as_f64().unwrap() > 0.0);
            assert!(m.quality.map_or(true, |q| q == 1 || q == 2));
        }
    }

    #[test]
    fn negative_and_large_quality_codes_reject_rows() {
        let rec = raw(
            &[POSITION[0], POSITION[1], POSITION[2], "CPWC [MILLIGRAM/M3]", "QV:SEADATANET"],
            &[
                &["1", "2", "2018-06-01T12:00:00", "0.5", "1"],
                &["1.1", "2", "2018-06-01T12:05:00", "0.6", "-1"],
                &["1.2", "2", "2018-06-01T12:10:00", "0.7", "300"],
            ],
        );
        let out = clean(rec, &CleaningConfig::default()).into_clean().unwrap();
        let chl = out.column(CanonicalName::Chl).unwrap();
        assert_eq!(chl.len(), 1);
        assert_eq!(chl.values[0].quality, Some(1));
    }
}
