//! Data/MC histogram bundle for one (category, variable) pair.

use std::collections::{BTreeMap, BTreeSet};

use hp_core::{Error, Histogram, Result};
use hp_input::{HistCollection, PlotParams, StyleConfig, NOMINAL};

/// One MC entity in the stack: a sample or a merged sample group.
#[derive(Debug, Clone)]
pub struct McSample {
    /// Sample (or group) identifier.
    pub name: String,
    /// Display label.
    pub label: String,
    /// RGB color from config, palette fallback when absent.
    pub color: Option<[u8; 3]>,
    /// Nominal histogram.
    pub nominal: Histogram,
    /// Systematic variations, keyed by variation name (`<syst>Up` / `<syst>Down`).
    pub variations: BTreeMap<String, Histogram>,
}

/// Data and MC histograms for one (category, variable) selection plus
/// display metadata. All constituents share identical binning.
#[derive(Debug, Clone)]
pub struct Shape {
    /// Variable name (input collection key).
    pub variable: String,
    /// Category (analysis selection region).
    pub category: String,
    /// X-axis label.
    pub axis_label: String,
    /// Summed data histogram; `None` when the selection has no data samples.
    pub data: Option<Histogram>,
    /// MC stack entries, ordered by descending nominal yield.
    pub mc: Vec<McSample>,
    /// Sum of all nominal MC histograms.
    pub mc_sum: Histogram,
}

impl Shape {
    /// Build a shape from the collection for one (category, variable) pair,
    /// applying sample-group merging from the style config.
    ///
    /// Fails when the variable or category is absent, or when binning
    /// disagrees during a group merge.
    pub fn build(
        coll: &HistCollection,
        variable: &str,
        category: &str,
        params: &PlotParams,
        style: &StyleConfig,
    ) -> Result<Shape> {
        let entry = coll
            .variables
            .get(variable)
            .ok_or_else(|| Error::Validation(format!("variable '{}' not in input", variable)))?;

        let mut data: Option<Histogram> = None;
        let mut mc_raw: BTreeMap<String, McSample> = BTreeMap::new();

        for (sample, se) in &entry.samples {
            let Some(variations) = se.categories.get(category) else {
                continue;
            };
            if params.is_data_sample(sample) {
                let h = coll.histogram(variable, sample, category, NOMINAL)?;
                data = Some(match data {
                    Some(acc) => acc.checked_add(&h)?,
                    None => h,
                });
            } else {
                let nominal = coll.histogram(variable, sample, category, NOMINAL)?;
                let mut vars = BTreeMap::new();
                for name in variations.keys().filter(|v| v.as_str() != NOMINAL) {
                    vars.insert(
                        name.clone(),
                        coll.histogram(variable, sample, category, name)?,
                    );
                }
                mc_raw.insert(
                    sample.clone(),
                    McSample {
                        name: sample.clone(),
                        label: style.label_for(sample),
                        color: style.colors_mc.get(sample).copied(),
                        nominal,
                        variations: vars,
                    },
                );
            }
        }

        if data.is_none() && mc_raw.is_empty() {
            return Err(Error::Validation(format!(
                "category '{}' not in input for variable '{}'",
                category, variable
            )));
        }

        let mut mc = merge_groups(mc_raw, style)?;

        // Stack order: decreasing nominal yield, name as tie-breaker.
        mc.sort_by(|a, b| {
            b.nominal
                .integral()
                .partial_cmp(&a.nominal.integral())
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.name.cmp(&b.name))
        });

        let mc_sum = sum_nominals(&mc, &data, variable)?;

        if let Some(d) = &data {
            if !d.binning_matches(&mc_sum) {
                return Err(Error::Validation(format!(
                    "data/MC binning mismatch for variable '{}' category '{}'",
                    variable, category
                )));
            }
        }

        Ok(Shape {
            variable: variable.to_string(),
            category: category.to_string(),
            axis_label: entry.axis_label.clone().unwrap_or_else(|| variable.to_string()),
            data,
            mc,
            mc_sum,
        })
    }

    /// No data samples in this selection.
    pub fn is_mc_only(&self) -> bool {
        self.data.is_none()
    }

    /// No MC samples in this selection.
    pub fn is_data_only(&self) -> bool {
        self.mc.is_empty()
    }

    /// Union of stored variation names over the MC stack (`nominal` excluded).
    pub fn variation_names(&self) -> BTreeSet<String> {
        self.mc.iter().flat_map(|s| s.variations.keys().cloned()).collect()
    }
}

/// Apply `samples_groups`: members are summed (nominal and each variation)
/// into a single stack entry carrying the group's name.
fn merge_groups(
    mut mc_raw: BTreeMap<String, McSample>,
    style: &StyleConfig,
) -> Result<Vec<McSample>> {
    let mut out: Vec<McSample> = Vec::new();

    for (group, members) in &style.samples_groups {
        let present: Vec<McSample> = members
            .iter()
            .filter_map(|m| mc_raw.remove(m))
            .collect();
        if present.is_empty() {
            continue;
        }

        let var_names: BTreeSet<String> = present[0].variations.keys().cloned().collect();
        for s in &present[1..] {
            let other: BTreeSet<String> = s.variations.keys().cloned().collect();
            if other != var_names {
                return Err(Error::Validation(format!(
                    "samples group '{}': members '{}' and '{}' store different variations",
                    group, present[0].name, s.name
                )));
            }
        }

        let mut nominal = present[0].nominal.clone();
        let mut variations = present[0].variations.clone();
        for s in &present[1..] {
            nominal = nominal.checked_add(&s.nominal).map_err(|_| {
                Error::Validation(format!(
                    "samples group '{}': binning mismatch while merging '{}'",
                    group, s.name
                ))
            })?;
            for (name, h) in &s.variations {
                let merged = variations[name].checked_add(h).map_err(|_| {
                    Error::Validation(format!(
                        "samples group '{}': binning mismatch in variation '{}' of '{}'",
                        group, name, s.name
                    ))
                })?;
                variations.insert(name.clone(), merged);
            }
        }

        out.push(McSample {
            name: group.clone(),
            label: style.label_for(group),
            color: style.colors_mc.get(group).copied(),
            nominal,
            variations,
        });
    }

    out.extend(mc_raw.into_values());
    Ok(out)
}

fn sum_nominals(mc: &[McSample], data: &Option<Histogram>, variable: &str) -> Result<Histogram> {
    let mut iter = mc.iter();
    let Some(first) = iter.next() else {
        // Data-only shape: carry the data binning so downstream code has edges.
        let d = data.as_ref().ok_or_else(|| {
            Error::Validation(format!("variable '{}': no data and no MC samples", variable))
        })?;
        return Histogram::new(
            d.bin_edges.clone(),
            vec![0.0; d.n_bins()],
            vec![0.0; d.n_bins()],
        );
    };
    let mut sum = first.nominal.clone();
    for s in iter {
        sum = sum.checked_add(&s.nominal)?;
    }
    Ok(sum)
}
