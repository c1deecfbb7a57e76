use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Result;

use crate::config::CleaningConfig;
use crate::data::loader::{self, RawFile};
use crate::data::model::Record;
use crate::data::pipeline::{self, Outcome};
use crate::data::{export, filter, manifest, resolve};

// ---------------------------------------------------------------------------
// Batch run over a file list
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub manifest: PathBuf,
    pub output: PathBuf,
    /// Raw-parse cache; read when present, written otherwise.
    pub cache: Option<PathBuf>,
    pub config: CleaningConfig,
}

/// Per-step file counts of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub files_read: usize,
    pub below_quality: usize,
    pub useless: usize,
    pub first_row_only: usize,
    pub rejected: usize,
    /// Rejections keyed by the stage that invalidated the record.
    pub rejected_by_stage: BTreeMap<&'static str, usize>,
    pub cleaned: usize,
    pub rows_written: usize,
}

/// Raw files from the cache when it exists, otherwise from the file list.
pub fn read_raw_files(manifest_path: &Path, cache: Option<&Path>) -> Result<Vec<RawFile>> {
    if let Some(cache) = cache.filter(|c| c.exists()) {
        log::info!("Loading parsed files from cache {}.", cache.display());
        return loader::load_cache(cache);
    }

    let entries = manifest::read_manifest(manifest_path)?;
    log::info!("Found {} files containing data.", entries.len());
    let files = loader::load_all(&entries);

    if let Some(cache) = cache {
        loader::save_cache(cache, &files)?;
        log::info!("Saved parsed files to cache {}.", cache.display());
    }
    Ok(files)
}

/// Resolve raw files and apply the file-level filters that precede cleaning.
pub fn prepare(files: &[RawFile], config: &CleaningConfig, summary: &mut BatchSummary) -> Vec<Record> {
    summary.files_read = files.len();
    let mut records: Vec<Record> = files.iter().map(resolve::resolve).collect();

    records.retain(|r| filter::meets_quality_threshold(r, config.quality_min_threshold));
    summary.below_quality = summary.files_read - records.len();
    log::info!(
        "{} files were excluded because their quality was below {}, {} files remain.",
        summary.below_quality,
        config.quality_min_threshold,
        records.len()
    );

    let before = records.len();
    records.retain(filter::is_useful);
    summary.useless = before - records.len();
    log::info!(
        "Filtered out {} files because they did not contain any useful data. {} files remain.",
        summary.useless,
        records.len()
    );

    summary.first_row_only = records
        .iter_mut()
        .map(filter::apply_select_mode)
        .filter(|&truncated| truncated)
        .count();
    if summary.first_row_only > 0 {
        log::info!("Made {} files only use their first measurement.", summary.first_row_only);
    }
    records
}

/// Clean every record, keeping the ones that stay valid.
pub fn clean_all(records: Vec<Record>, config: &CleaningConfig, summary: &mut BatchSummary) -> Vec<Record> {
    let total = records.len();
    let mut cleaned = Vec::with_capacity(total);
    for (i, record) in records.into_iter().enumerate() {
        log::info!("Processing file {}/{total}.", i + 1);
        let outcome = pipeline::clean(record, config);
        if let Outcome::Rejected {
            record,
            stage,
            reason,
        } = &outcome
        {
            log::debug!("Dropped '{}' at {stage}: {reason}.", record.file_name);
            summary.rejected += 1;
            *summary.rejected_by_stage.entry(*stage).or_default() += 1;
        }
        cleaned.extend(outcome.into_clean());
    }
    summary.cleaned = cleaned.len();
    for (stage, count) in &summary.rejected_by_stage {
        log::info!("{count} files rejected while {stage}.");
    }
    cleaned
}

pub fn run(options: &BatchOptions) -> Result<BatchSummary> {
    let started = Instant::now();
    let mut summary = BatchSummary::default();

    let files = read_raw_files(&options.manifest, options.cache.as_deref())?;
    let records = prepare(&files, &options.config, &mut summary);
    let cleaned = clean_all(records, &options.config, &mut summary);
    summary.rows_written = export::write_csv(&options.output, &cleaned)?;

    log::info!(
        "Wrote {} rows from {} files to {} ({} rejected).",
        summary.rows_written,
        summary.cleaned,
        options.output.display(),
        summary.rejected
    );
    log::info!("Finished in {:.3}s.", started.elapsed().as_secs_f64());
    Ok(summary)
}
