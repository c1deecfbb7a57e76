use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use super::manifest::ManifestEntry;
use super::model::FileSettings;

// ---------------------------------------------------------------------------
// RawFile – headers and untyped cells of one input file
// ---------------------------------------------------------------------------

/// Unprocessed contents of one ODV file, stored column-wise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawFile {
    pub path: PathBuf,
    pub settings: FileSettings,
    pub headers: Vec<String>,
    /// One entry per header; every column has the same length.
    pub columns: Vec<Vec<String>>,
}

impl RawFile {
    /// Last path component, used in diagnostics.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    pub fn row_count(&self) -> usize {
        self.columns.first().map(Vec::len).unwrap_or(0)
    }
}

// ---------------------------------------------------------------------------
// ODV spreadsheet reader
// ---------------------------------------------------------------------------

/// Read an ODV spreadsheet export.
///
/// Layout:
/// * optional UTF-8 BOM
/// * `//` comment lines, anywhere
/// * a tab-separated header line
/// * tab-separated data lines
pub fn load_odv_file(path: &Path, settings: FileSettings) -> Result<RawFile> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading ODV file {}", path.display()))?;
    let (headers, columns) =
        parse_odv(&text).with_context(|| format!("parsing ODV file {}", path.display()))?;
    Ok(RawFile {
        path: path.to_path_buf(),
        settings,
        headers,
        columns,
    })
}

/// Split ODV text into headers and per-header cell columns.
///
/// Short rows are padded with empty cells; cells beyond the header are dropped.
pub fn parse_odv(text: &str) -> Result<(Vec<String>, Vec<Vec<String>>)> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut lines = text
        .lines()
        .filter(|line| !line.starts_with("//") && !line.trim().is_empty());

    let Some(header_line) = lines.next() else {
        bail!("no header line");
    };
    let headers: Vec<String> = header_line.split('\t').map(str::to_string).collect();
    let mut columns: Vec<Vec<String>> = vec![Vec::new(); headers.len()];

    for line in lines {
        let mut cells = line.split('\t');
        for column in columns.iter_mut() {
            column.push(cells.next().unwrap_or("").to_string());
        }
    }

    Ok((headers, columns))
}

/// Read every manifest entry, skipping files that fail to load.
pub fn load_all(entries: &[ManifestEntry]) -> Vec<RawFile> {
    let total = entries.len();
    let mut files = Vec::with_capacity(total);
    for (i, entry) in entries.iter().enumerate() {
        log::info!(
            "Reading data from {}/{total} file: '{}'",
            i + 1,
            entry.path.display()
        );
        match load_odv_file(&entry.path, entry.settings.clone()) {
            Ok(raw) => {
                log::info!("File parsed: {} rows.", raw.row_count());
                files.push(raw);
            }
            Err(e) => log::error!("Failed to load file: {e:#}"),
        }
    }
    files
}

// ---------------------------------------------------------------------------
// Raw-parse cache
// ---------------------------------------------------------------------------

pub fn load_cache(path: &Path) -> Result<Vec<RawFile>> {
    let text = std::fs::read_to_string(path).context("reading raw-parse cache")?;
    serde_json::from_str(&text).context("parsing raw-parse cache")
}

pub fn save_cache(path: &Path, files: &[RawFile]) -> Result<()> {
    let text = serde_json::to_string(files).context("serialising raw-parse cache")?;
    std::fs::write(path, text)
        .with_context(|| format!("writing raw-parse cache {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = "\u{feff}//ODV Spreadsheet V4.0\n\
//<DataField>Ocean</DataField>\n\
Cruise\tStation\tLONGITUDE [DEGREES_EAST]\tCHLOROPHYLL A [UG/L]\tQV:SEADATANET\n\
C1\tS1\t13.5\t0,8\t1\n\
\n\
\t\t\t1.2\n";

    #[test]
    fn parse_skips_bom_and_comments() {
        let (headers, columns) = parse_odv(SAMPLE).unwrap();
        assert_eq!(headers[0], "Cruise");
        assert_eq!(headers.len(), 5);
        assert_eq!(columns[3], vec!["0,8", "1.2"]);
    }

    #[test]
    fn short_rows_are_padded() {
        let (_, columns) = parse_odv(SAMPLE).unwrap();
        assert!(columns.iter().all(|c| c.len() == 2));
        assert_eq!(columns[4], vec!["1", ""]);
    }

    #[test]
    fn empty_file_is_an_error() {
        assert!(parse_odv("//only a comment\n").is_err());
    }

    #[test]
    fn load_from_disk_keeps_settings() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let settings = FileSettings {
            quality: Some(2.0),
            ..FileSettings::default()
        };
        let raw = load_odv_file(file.path(), settings.clone()).unwrap();
        assert_eq!(raw.settings, settings);
        assert_eq!(raw.row_count(), 2);
    }

    #[test]
    fn missing_files_are_skipped() {
        let entries = vec![ManifestEntry {
            path: PathBuf::from("/definitely/not/here.txt"),
            settings: FileSettings::default(),
        }];
        assert!(load_all(&entries).is_empty());
    }

    #[test]
    fn cache_round_trips_raw_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("raw.json");
        let (headers, columns) = parse_odv(SAMPLE).unwrap();
        let files = vec![RawFile {
            path: PathBuf::from("a/b.txt"),
            settings: FileSettings::default(),
            headers,
            columns,
        }];
        save_cache(&path, &files).unwrap();
        assert_eq!(load_cache(&path).unwrap(), files);
    }
}
