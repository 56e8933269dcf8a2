//! Style override configuration (`-op`, YAML).
//!
//! Recognized keys: `labels_mc` (sample -> display label), `colors_mc`
//! (sample -> RGB triple), `samples_groups` (group -> member samples).
//! Overrides merge left to right; later files win per key.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use hp_core::Result;

/// Style overrides applied on top of the analysis-parameters config.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    /// sample -> display label.
    pub labels_mc: BTreeMap<String, String>,
    /// sample -> RGB triple.
    pub colors_mc: BTreeMap<String, [u8; 3]>,
    /// group name -> member sample identifiers. Merged before summation.
    pub samples_groups: BTreeMap<String, Vec<String>>,
}

impl StyleConfig {
    /// Parse one override file.
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let yaml = std::fs::read_to_string(path)?;
        let cfg: StyleConfig = serde_yaml_ng::from_str(&yaml)?;
        Ok(cfg)
    }

    /// Overlay `other` on top of `self` (per-key, `other` wins).
    pub fn merge(&mut self, other: StyleConfig) {
        self.labels_mc.extend(other.labels_mc);
        self.colors_mc.extend(other.colors_mc);
        self.samples_groups.extend(other.samples_groups);
    }

    /// Display label for a sample (falls back to its identifier).
    pub fn label_for(&self, sample: &str) -> String {
        self.labels_mc.get(sample).cloned().unwrap_or_else(|| sample.to_string())
    }
}
