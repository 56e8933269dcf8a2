//! Histogram-collection file: one JSON document holding every histogram
//! the analysis dumped, keyed by variable, sample, category and variation.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use hp_core::{Error, Histogram, Result};

/// Per-bin payload of one (variable, sample, category, variation) entry.
#[derive(Debug, Clone, Deserialize)]
pub struct BinData {
    /// Bin contents.
    pub values: Vec<f64>,
    /// Sum of weights squared per bin. Zero-filled when absent.
    #[serde(default)]
    pub variances: Option<Vec<f64>>,
}

/// All stored histograms of one sample for one variable.
#[derive(Debug, Clone, Deserialize)]
pub struct SampleEntry {
    /// category -> variation -> bins. Variation names are `nominal`
    /// or end in `Up`/`Down`.
    pub categories: BTreeMap<String, BTreeMap<String, BinData>>,
}

/// One plotted variable: shared binning plus per-sample histograms.
#[derive(Debug, Clone, Deserialize)]
pub struct VariableEntry {
    /// Axis label shown under the plot (defaults to the variable name).
    #[serde(default)]
    pub axis_label: Option<String>,
    /// Bin edges shared by every histogram of this variable.
    pub bin_edges: Vec<f64>,
    /// sample -> stored histograms.
    pub samples: BTreeMap<String, SampleEntry>,
}

/// The full histogram collection as dumped by the analysis.
#[derive(Debug, Clone, Deserialize)]
pub struct HistCollection {
    /// variable -> entry.
    pub variables: BTreeMap<String, VariableEntry>,
}

impl HistCollection {
    /// Load a collection from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let coll: HistCollection = serde_json::from_str(&json)?;
        coll.validate()?;
        Ok(coll)
    }

    fn validate(&self) -> Result<()> {
        for (var, entry) in &self.variables {
            if entry.bin_edges.len() < 2 {
                return Err(Error::Validation(format!(
                    "variable '{}': needs at least 2 bin edges",
                    var
                )));
            }
            let n = entry.bin_edges.len() - 1;
            for (sample, se) in &entry.samples {
                for (cat, variations) in &se.categories {
                    for (variation, bins) in variations {
                        if bins.values.len() != n {
                            return Err(Error::Validation(format!(
                                "variable '{}' sample '{}' category '{}' variation '{}': \
                                 {} bin values for {} bins",
                                var,
                                sample,
                                cat,
                                variation,
                                bins.values.len(),
                                n
                            )));
                        }
                        if let Some(v) = &bins.variances {
                            if v.len() != n {
                                return Err(Error::Validation(format!(
                                    "variable '{}' sample '{}' category '{}' variation '{}': \
                                     {} variances for {} bins",
                                    var,
                                    sample,
                                    cat,
                                    variation,
                                    v.len(),
                                    n
                                )));
                            }
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Union of category names over all variables and samples, sorted.
    pub fn categories(&self) -> Vec<String> {
        let mut cats: Vec<String> = self
            .variables
            .values()
            .flat_map(|e| e.samples.values())
            .flat_map(|s| s.categories.keys().cloned())
            .collect();
        cats.sort();
        cats.dedup();
        cats
    }

    /// Materialize one stored histogram.
    pub fn histogram(
        &self,
        variable: &str,
        sample: &str,
        category: &str,
        variation: &str,
    ) -> Result<Histogram> {
        let entry = self
            .variables
            .get(variable)
            .ok_or_else(|| Error::Validation(format!("variable '{}' not in input", variable)))?;
        let se = entry.samples.get(sample).ok_or_else(|| {
            Error::Validation(format!("sample '{}' not stored for variable '{}'", sample, variable))
        })?;
        let variations = se.categories.get(category).ok_or_else(|| {
            Error::Validation(format!(
                "category '{}' not stored for variable '{}' sample '{}'",
                category, variable, sample
            ))
        })?;
        let bins = variations.get(variation).ok_or_else(|| {
            Error::Validation(format!(
                "variation '{}' not stored for variable '{}' sample '{}' category '{}'",
                variation, variable, sample, category
            ))
        })?;
        let variances = bins
            .variances
            .clone()
            .unwrap_or_else(|| vec![0.0; entry.bin_edges.len() - 1]);
        Histogram::new(entry.bin_edges.clone(), bins.values.clone(), variances)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_json() -> &'static str {
        r#"{
            "variables": {
                "mjj": {
                    "axis_label": "m(jj) [GeV]",
                    "bin_edges": [0.0, 50.0, 100.0],
                    "samples": {
                        "DATA_MuonEG": {
                            "categories": {
                                "baseline": { "nominal": { "values": [10.0, 20.0] } }
                            }
                        },
                        "ttbar": {
                            "categories": {
                                "baseline": {
                                    "nominal": { "values": [9.0, 19.0], "variances": [0.4, 0.9] },
                                    "jesUp": { "values": [10.0, 20.0] },
                                    "jesDown": { "values": [8.0, 18.0] }
                                }
                            }
                        }
                    }
                }
            }
        }"#
    }

    #[test]
    fn parse_and_lookup() {
        let coll: HistCollection = serde_json::from_str(sample_json()).unwrap();
        coll.validate().unwrap();
        assert_eq!(coll.categories(), vec!["baseline".to_string()]);

        let h = coll.histogram("mjj", "ttbar", "baseline", "nominal").unwrap();
        assert_eq!(h.values, vec![9.0, 19.0]);
        assert_eq!(h.variances, vec![0.4, 0.9]);

        // Missing variances default to zero.
        let d = coll.histogram("mjj", "DATA_MuonEG", "baseline", "nominal").unwrap();
        assert_eq!(d.variances, vec![0.0, 0.0]);
    }

    #[test]
    fn missing_keys_are_validation_errors() {
        let coll: HistCollection = serde_json::from_str(sample_json()).unwrap();
        assert!(coll.histogram("nope", "ttbar", "baseline", "nominal").is_err());
        assert!(coll.histogram("mjj", "nope", "baseline", "nominal").is_err());
        assert!(coll.histogram("mjj", "ttbar", "nope", "nominal").is_err());
        assert!(coll.histogram("mjj", "ttbar", "baseline", "nope").is_err());
    }

    #[test]
    fn bin_count_mismatch_rejected() {
        let bad = r#"{
            "variables": {
                "x": {
                    "bin_edges": [0.0, 1.0, 2.0],
                    "samples": {
                        "mc": { "categories": { "c": { "nominal": { "values": [1.0] } } } }
                    }
                }
            }
        }"#;
        let coll: HistCollection = serde_json::from_str(bad).unwrap();
        assert!(coll.validate().is_err());
    }
}
