//! Dumped analysis-parameters config (`--cfg`, JSON).

use std::path::Path;

use serde::Deserialize;

use hp_core::Result;

use crate::style::StyleConfig;

/// Experiment header fields shown on every plot.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExperimentMeta {
    /// Experiment name (bold), empty to suppress the header.
    pub name: String,
    /// Status text (italic), e.g. "Preliminary".
    pub status: String,
    /// Center-of-mass energy in TeV (0 to suppress).
    pub sqrt_s_tev: f64,
    /// Integrated luminosity in fb^-1 (0 to suppress).
    pub lumi_fb_inv: f64,
}

impl Default for ExperimentMeta {
    fn default() -> Self {
        Self { name: String::new(), status: String::new(), sqrt_s_tev: 13.6, lumi_fb_inv: 0.0 }
    }
}

/// Analysis-parameters config as dumped alongside the histogram collection.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlotParams {
    /// Prefix identifying data samples (everything else is MC).
    pub data_key: String,
    /// Experiment header fields.
    pub experiment: ExperimentMeta,
    /// Baseline style (labels/colors/groups); `-op` files overlay this.
    pub style: StyleConfig,
}

impl Default for PlotParams {
    fn default() -> Self {
        Self {
            data_key: "DATA".to_string(),
            experiment: ExperimentMeta::default(),
            style: StyleConfig::default(),
        }
    }
}

impl PlotParams {
    /// Load the config from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    /// True when `sample` is a data sample.
    pub fn is_data_sample(&self, sample: &str) -> bool {
        sample.contains(&self.data_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let p: PlotParams = serde_json::from_str("{}").unwrap();
        assert_eq!(p.data_key, "DATA");
        assert!(p.is_data_sample("DATA_SingleEle"));
        assert!(!p.is_data_sample("ttbar"));
    }

    #[test]
    fn parse_full() {
        let json = r#"{
            "data_key": "Obs",
            "experiment": { "name": "CMS", "status": "Preliminary", "sqrt_s_tev": 13.0, "lumi_fb_inv": 41.5 },
            "style": { "labels_mc": { "ttbar": "t#bar{t}" } }
        }"#;
        let p: PlotParams = serde_json::from_str(json).unwrap();
        assert_eq!(p.data_key, "Obs");
        assert_eq!(p.experiment.name, "CMS");
        assert_eq!(p.style.label_for("ttbar"), "t#bar{t}");
    }
}
