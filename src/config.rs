use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Cleaning thresholds and debug switches
// ---------------------------------------------------------------------------

/// Repeat coefficients never exceed 1, so this disables run collapsing.
pub const DEFAULT_REPEAT_COEFFICIENT_THRESHOLD: f64 = 1.1;
/// Zero disables the per-file quality cut.
pub const DEFAULT_QUALITY_MIN_THRESHOLD: f64 = 0.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleaningConfig {
    /// Remove rows whose |z-score| of Chl reaches this value. `None` disables.
    pub z_score_threshold: Option<f64>,
    /// Collapse repeated Chl runs in files whose repeat coefficient reaches this value.
    pub repeat_coefficient_threshold: f64,
    /// Minimum file quality mark for a file to be processed.
    pub quality_min_threshold: f64,
    pub print_table_at_start: bool,
    pub print_table_after_each_step: bool,
    pub print_table_at_end: bool,
}

impl Default for CleaningConfig {
    fn default() -> Self {
        Self {
            z_score_threshold: None,
            repeat_coefficient_threshold: DEFAULT_REPEAT_COEFFICIENT_THRESHOLD,
            quality_min_threshold: DEFAULT_QUALITY_MIN_THRESHOLD,
            print_table_at_start: false,
            print_table_after_each_step: false,
            print_table_at_end: false,
        }
    }
}

impl CleaningConfig {
    /// Load from a JSON file; absent keys keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }
}
