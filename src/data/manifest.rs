use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::model::{FileSettings, SelectMode};

// ---------------------------------------------------------------------------
// File list
// ---------------------------------------------------------------------------

/// One input file and the marks that were active when it was listed.
#[derive(Debug, Clone, PartialEq)]
pub struct ManifestEntry {
    pub path: PathBuf,
    pub settings: FileSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    None,
    Whitelist,
    Blacklist,
    Root,
}

pub fn read_manifest(path: &Path) -> Result<Vec<ManifestEntry>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading file list {}", path.display()))?;
    Ok(parse_manifest(&text))
}

/// Parse a file list.
///
/// ```text
/// # comment
/// [ROOT]
/// /data/odv
/// [QUALITY:3]
/// [FILEMARK:ctd]
/// [WHITELIST]
/// cruise_a.txt
/// [BLACKLIST]
/// broken.txt
/// ```
///
/// Bracketed `NAME:VALUE` lines set a mark for every following file; an empty
/// value clears it. Bare bracketed words switch the mode.
pub fn parse_manifest(text: &str) -> Vec<ManifestEntry> {
    let mut mode = Mode::None;
    let mut root = PathBuf::new();
    let mut marks = FileSettings::default();
    let mut entries = Vec::new();

    for line in text.lines().map(str::trim) {
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some(rest) = line.strip_prefix('[') {
            let Some(end) = rest.find(']') else {
                continue;
            };
            let directive = rest[..end].to_uppercase();
            let mut parts = directive.split(':');
            let name = parts.next().unwrap_or_default();
            match parts.next() {
                // Anything after a second colon is ignored.
                Some(value) => apply_mark(&mut marks, name, value),
                None => match name {
                    "NONE" => mode = Mode::None,
                    "WHITELIST" => mode = Mode::Whitelist,
                    "BLACKLIST" => mode = Mode::Blacklist,
                    "ROOT" => mode = Mode::Root,
                    other => log::warn!("Unknown file list directive '[{other}]'."),
                },
            }
            continue;
        }
        match mode {
            Mode::None | Mode::Blacklist => {}
            Mode::Root => root = PathBuf::from(line),
            Mode::Whitelist => entries.push(ManifestEntry {
                path: root.join(line),
                settings: marks.clone(),
            }),
        }
    }

    entries
}

fn apply_mark(marks: &mut FileSettings, name: &str, value: &str) {
    let value = (!value.is_empty()).then_some(value);
    match name {
        "QUALITY" => {
            marks.quality = value.and_then(|v| match v.parse::<f64>() {
                Ok(q) => Some(q),
                Err(_) => {
                    log::warn!("Ignoring non-numeric quality mark '{v}'.");
                    None
                }
            });
        }
        "SELECT" => {
            marks.select = match value {
                Some("FIRST") => SelectMode::First,
                _ => SelectMode::All,
            };
        }
        "FILEMARK" => marks.file_mark = value.map(str::to_string),
        other => log::warn!("Unknown file list mark '{other}'."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIST: &str = "\
# in-situ chlorophyll sources
[ROOT]
/data/odv
[QUALITY:3]
[FILEMARK:ctd]
[WHITELIST]
first.txt
[SELECT:first]
second.txt
[BLACKLIST]
skipped.txt
[QUALITY:]
[SELECT:]
[WHITELIST]
third.txt
";

    #[test]
    fn whitelisted_files_carry_marks() {
        let entries = parse_manifest(LIST);
        let paths: Vec<_> = entries.iter().map(|e| e.path.clone()).collect();
        assert_eq!(
            paths,
            vec![
                PathBuf::from("/data/odv/first.txt"),
                PathBuf::from("/data/odv/second.txt"),
                PathBuf::from("/data/odv/third.txt"),
            ]
        );
        assert_eq!(entries[0].settings.quality, Some(3.0));
        assert_eq!(entries[0].settings.file_mark.as_deref(), Some("CTD"));
        assert_eq!(entries[0].settings.select, SelectMode::All);
        assert_eq!(entries[1].settings.select, SelectMode::First);
        assert_eq!(entries[2].settings.quality, None);
        assert_eq!(entries[2].settings.select, SelectMode::All);
        assert_eq!(entries[2].settings.file_mark.as_deref(), Some("CTD"));
    }

    #[test]
    fn files_before_any_mode_are_ignored() {
        let entries = parse_manifest("orphan.txt\n[WHITELIST]\nkept.txt\n");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].path, PathBuf::from("kept.txt"));
    }

    #[test]
    fn unclosed_directive_is_ignored() {
        let entries = parse_manifest("[WHITELIST]\n[BLACKLIST\nkept.txt\n");
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn non_numeric_quality_is_dropped() {
        let entries = parse_manifest("[QUALITY:high]\n[WHITELIST]\na.txt\n");
        assert_eq!(entries[0].settings.quality, None);
    }

    #[test]
    fn mark_value_stops_at_second_colon() {
        let entries = parse_manifest("[FILEMARK:a:b]\n[WHITELIST]\na.txt\n");
        assert_eq!(entries[0].settings.file_mark.as_deref(), Some("A"));
    }
}
