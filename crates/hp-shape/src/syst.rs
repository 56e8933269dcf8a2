//! Systematic-uncertainty combination.
//!
//! A [`SystUnc`] holds the per-bin squared up/down deviations of one
//! uncertainty source against the nominal MC sum. Sources combine by
//! quadrature: the squared deviations add bin-wise, sign-separated.

use std::collections::{BTreeMap, BTreeSet};

use hp_core::{Error, Result};

use crate::shape::Shape;

/// Designated name of the MC statistical uncertainty source.
pub const MCSTAT: &str = "mcstat";

/// One systematic uncertainty of the MC sum, stored as squared deviations.
#[derive(Debug, Clone)]
pub struct SystUnc {
    /// Uncertainty source name.
    pub name: String,
    /// Bin edges of the owning shape.
    pub bin_edges: Vec<f64>,
    /// Nominal MC sum per bin.
    pub nominal: Vec<f64>,
    /// Squared upward deviation per bin.
    pub err2_up: Vec<f64>,
    /// Squared downward deviation per bin.
    pub err2_down: Vec<f64>,
}

impl SystUnc {
    /// Build one source from the shape's stored `<name>Up` / `<name>Down`
    /// variations, summing per-sample deviations in quadrature.
    ///
    /// A variation pair can push the nominal both ways (two-sided) or the
    /// same way (one-sided). Two-sided bins contribute their up/down squared
    /// deviations to the matching side; one-sided bins contribute the larger
    /// squared deviation to the side both variations point to, nothing to
    /// the other.
    pub fn from_shape(shape: &Shape, name: &str) -> Result<SystUnc> {
        let n = shape.mc_sum.n_bins();
        let mut err2_up = vec![0.0; n];
        let mut err2_down = vec![0.0; n];

        let up_name = format!("{}Up", name);
        let down_name = format!("{}Down", name);

        for sample in &shape.mc {
            let up = sample.variations.get(&up_name);
            let down = sample.variations.get(&down_name);
            let (up, down) = match (up, down) {
                (Some(u), Some(d)) => (u, d),
                (None, None) => continue,
                _ => {
                    return Err(Error::Validation(format!(
                        "sample '{}': unpaired variation for systematic '{}'",
                        sample.name, name
                    )))
                }
            };
            if !up.binning_matches(&shape.mc_sum) || !down.binning_matches(&shape.mc_sum) {
                return Err(Error::Validation(format!(
                    "sample '{}' systematic '{}': variation binning differs from nominal",
                    sample.name, name
                )));
            }

            for b in 0..n {
                let nom = sample.nominal.values[b];
                let e_up = up.values[b] - nom;
                let e_down = down.values[b] - nom;

                let up_is_up = e_up > 0.0;
                let down_is_down = e_down < 0.0;
                let one_sided = up_is_up ^ down_is_down;

                let (sq_up, sq_down) = if up_is_up {
                    (e_up * e_up, e_down * e_down)
                } else {
                    (e_down * e_down, e_up * e_up)
                };

                if one_sided {
                    let sq_max = sq_up.max(sq_down);
                    if up_is_up {
                        err2_up[b] += sq_max;
                    } else {
                        err2_down[b] += sq_max;
                    }
                } else {
                    err2_up[b] += sq_up;
                    err2_down[b] += sq_down;
                }
            }
        }

        Ok(SystUnc {
            name: name.to_string(),
            bin_edges: shape.mc_sum.bin_edges.clone(),
            nominal: shape.mc_sum.values.clone(),
            err2_up,
            err2_down,
        })
    }

    /// MC statistical uncertainty: the nominal per-bin variances, summed
    /// over samples, entering both sides.
    pub fn mcstat(shape: &Shape) -> SystUnc {
        let n = shape.mc_sum.n_bins();
        let mut err2 = vec![0.0; n];
        for sample in &shape.mc {
            for b in 0..n {
                err2[b] += sample.nominal.variances[b];
            }
        }
        SystUnc {
            name: MCSTAT.to_string(),
            bin_edges: shape.mc_sum.bin_edges.clone(),
            nominal: shape.mc_sum.values.clone(),
            err2_up: err2.clone(),
            err2_down: err2,
        }
    }

    /// Zero-width uncertainty carrying the shape's binning (identity of the
    /// quadrature sum).
    pub fn zero(name: &str, shape: &Shape) -> SystUnc {
        let n = shape.mc_sum.n_bins();
        SystUnc {
            name: name.to_string(),
            bin_edges: shape.mc_sum.bin_edges.clone(),
            nominal: shape.mc_sum.values.clone(),
            err2_up: vec![0.0; n],
            err2_down: vec![0.0; n],
        }
    }

    /// Quadrature sum of two sources over identical binning.
    ///
    /// Commutative and associative; fails when binning or nominal differ.
    pub fn quadrature_sum(&self, other: &SystUnc) -> Result<SystUnc> {
        if self.bin_edges != other.bin_edges {
            return Err(Error::Validation(format!(
                "cannot sum systematics '{}' and '{}' with different binning",
                self.name, other.name
            )));
        }
        if self.nominal != other.nominal {
            return Err(Error::Validation(format!(
                "cannot sum systematics '{}' and '{}' with different nominal MC",
                self.name, other.name
            )));
        }
        let err2_up =
            self.err2_up.iter().zip(&other.err2_up).map(|(a, b)| a + b).collect();
        let err2_down =
            self.err2_down.iter().zip(&other.err2_down).map(|(a, b)| a + b).collect();
        Ok(SystUnc {
            name: format!("{}_{}", self.name, other.name),
            bin_edges: self.bin_edges.clone(),
            nominal: self.nominal.clone(),
            err2_up,
            err2_down,
        })
    }

    /// Upward band edge: `nominal + sqrt(err2_up)`.
    pub fn up(&self) -> Vec<f64> {
        self.nominal.iter().zip(&self.err2_up).map(|(n, e)| n + e.sqrt()).collect()
    }

    /// Downward band edge: `nominal - sqrt(err2_down)`.
    pub fn down(&self) -> Vec<f64> {
        self.nominal.iter().zip(&self.err2_down).map(|(n, e)| n - e.sqrt()).collect()
    }

    /// Up edge relative to nominal; 1 where the nominal vanishes.
    pub fn ratio_up(&self) -> Vec<f64> {
        self.nominal
            .iter()
            .zip(self.up())
            .map(|(n, u)| if *n != 0.0 { u / n } else { 1.0 })
            .collect()
    }

    /// Down edge relative to nominal; 1 where the nominal vanishes.
    pub fn ratio_down(&self) -> Vec<f64> {
        self.nominal
            .iter()
            .zip(self.down())
            .map(|(n, d)| if *n != 0.0 { d / n } else { 1.0 })
            .collect()
    }
}

/// All uncertainty sources of one shape, reducible to total/partial bands.
#[derive(Debug, Clone)]
pub struct SystManager {
    shape_binned_zero: SystUnc,
    sources: BTreeMap<String, SystUnc>,
}

impl SystManager {
    /// Collect sources from the shape's stored variations.
    ///
    /// Non-nominal variation names must end in `Up`/`Down` and pair up;
    /// `only_syst` (when non-empty) restricts the collected names. The
    /// `mcstat` source is always derived from the nominal variances when
    /// `has_mcstat` is set.
    pub fn from_shape(shape: &Shape, only_syst: &[String], has_mcstat: bool) -> Result<Self> {
        let mut ups = BTreeSet::new();
        let mut downs = BTreeSet::new();
        for var in shape.variation_names() {
            if let Some(stripped) = var.strip_suffix("Up") {
                ups.insert(stripped.to_string());
            } else if let Some(stripped) = var.strip_suffix("Down") {
                downs.insert(stripped.to_string());
            } else {
                return Err(Error::Validation(format!(
                    "variation '{}' does not end in 'Up' or 'Down'",
                    var
                )));
            }
        }
        if ups != downs {
            let missing: Vec<&String> = ups.symmetric_difference(&downs).collect();
            return Err(Error::Validation(format!(
                "up/down variations mismatch for systematics: {:?}",
                missing
            )));
        }

        let mut names: Vec<String> = ups.into_iter().collect();
        if !only_syst.is_empty() {
            names.retain(|n| only_syst.iter().any(|s| s == n));
        }

        let mut sources = BTreeMap::new();
        for name in names {
            sources.insert(name.clone(), SystUnc::from_shape(shape, &name)?);
        }
        if has_mcstat {
            sources.insert(MCSTAT.to_string(), SystUnc::mcstat(shape));
        }

        Ok(Self { shape_binned_zero: SystUnc::zero("total", shape), sources })
    }

    /// Collected source names, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.sources.keys().map(String::as_str).collect()
    }

    /// Look up one source.
    pub fn get(&self, name: &str) -> Option<&SystUnc> {
        self.sources.get(name)
    }

    /// The MC statistical source, when collected.
    pub fn mcstat(&self) -> Option<&SystUnc> {
        self.sources.get(MCSTAT)
    }

    /// Total band: quadrature sum over every collected source.
    pub fn total(&self) -> Result<SystUnc> {
        let mut total = self.shape_binned_zero.clone();
        for s in self.sources.values() {
            total = total.quadrature_sum(s)?;
        }
        total.name = "total".to_string();
        Ok(total)
    }

    /// Partial band restricted to the named sources.
    pub fn partial(&self, names: &[String]) -> Result<SystUnc> {
        let mut band = self.shape_binned_zero.clone();
        for name in names {
            let s = self.sources.get(name).ok_or_else(|| {
                Error::Validation(format!("unknown systematic '{}' in partial band", name))
            })?;
            band = band.quadrature_sum(s)?;
        }
        band.name = format!("partial_{}", names.join("_"));
        Ok(band)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use hp_input::{HistCollection, PlotParams, StyleConfig};

    fn shape_from(json: &str, variable: &str, category: &str) -> Shape {
        let coll: HistCollection = serde_json::from_str(json).unwrap();
        Shape::build(&coll, variable, category, &PlotParams::default(), &StyleConfig::default())
            .unwrap()
    }

    fn two_bin_shape() -> Shape {
        shape_from(
            r#"{
                "variables": { "x": {
                    "bin_edges": [0.0, 1.0, 2.0],
                    "samples": {
                        "DATA_A": { "categories": { "c": { "nominal": { "values": [10.0, 20.0] } } } },
                        "mc": { "categories": { "c": {
                            "nominal": { "values": [9.0, 19.0], "variances": [0.25, 0.16] },
                            "sysUp": { "values": [10.0, 20.0] },
                            "sysDown": { "values": [8.0, 18.0] }
                        } } }
                    }
                } }
            }"#,
            "x",
            "c",
        )
    }

    #[test]
    fn two_sided_deviation() {
        let shape = two_bin_shape();
        let s = SystUnc::from_shape(&shape, "sys").unwrap();
        assert_relative_eq!(s.err2_up[0], 1.0);
        assert_relative_eq!(s.err2_down[0], 1.0);
        assert_relative_eq!(s.up()[0], 10.0);
        assert_relative_eq!(s.down()[0], 8.0);
    }

    #[test]
    fn one_sided_deviation_folds_to_one_side() {
        // Both variations push upward: +2 and +1. The larger squared
        // deviation goes up, nothing goes down.
        let shape = shape_from(
            r#"{
                "variables": { "x": {
                    "bin_edges": [0.0, 1.0],
                    "samples": {
                        "mc": { "categories": { "c": {
                            "nominal": { "values": [10.0] },
                            "sUp": { "values": [12.0] },
                            "sDown": { "values": [11.0] }
                        } } }
                    }
                } }
            }"#,
            "x",
            "c",
        );
        let s = SystUnc::from_shape(&shape, "s").unwrap();
        assert_relative_eq!(s.err2_up[0], 4.0);
        assert_relative_eq!(s.err2_down[0], 0.0);
    }

    #[test]
    fn mcstat_from_nominal_variances() {
        let shape = two_bin_shape();
        let s = SystUnc::mcstat(&shape);
        assert_relative_eq!(s.err2_up[0], 0.25);
        assert_relative_eq!(s.err2_down[1], 0.16);
    }

    #[test]
    fn quadrature_sum_commutes() {
        let shape = two_bin_shape();
        let a = SystUnc::from_shape(&shape, "sys").unwrap();
        let b = SystUnc::mcstat(&shape);
        let ab = a.quadrature_sum(&b).unwrap();
        let ba = b.quadrature_sum(&a).unwrap();
        for bin in 0..2 {
            assert_relative_eq!(ab.err2_up[bin], ba.err2_up[bin], max_relative = 1e-12);
            assert_relative_eq!(ab.err2_down[bin], ba.err2_down[bin], max_relative = 1e-12);
        }
    }

    #[test]
    fn quadrature_sum_associates() {
        let shape = two_bin_shape();
        let a = SystUnc::from_shape(&shape, "sys").unwrap();
        let b = SystUnc::mcstat(&shape);
        let c = SystUnc::zero("c", &shape);
        let left = a.quadrature_sum(&b).unwrap().quadrature_sum(&c).unwrap();
        let right = a.quadrature_sum(&b.quadrature_sum(&c).unwrap()).unwrap();
        for bin in 0..2 {
            assert_relative_eq!(left.err2_up[bin], right.err2_up[bin], max_relative = 1e-12);
            assert_relative_eq!(left.err2_down[bin], right.err2_down[bin], max_relative = 1e-12);
        }
    }

    #[test]
    fn binning_mismatch_rejected() {
        let shape = two_bin_shape();
        let a = SystUnc::from_shape(&shape, "sys").unwrap();
        let one_bin = shape_from(
            r#"{
                "variables": { "x": {
                    "bin_edges": [0.0, 1.0],
                    "samples": {
                        "mc": { "categories": { "c": { "nominal": { "values": [1.0] } } } }
                    }
                } }
            }"#,
            "x",
            "c",
        );
        let b = SystUnc::zero("b", &one_bin);
        assert!(a.quadrature_sum(&b).is_err());
    }

    #[test]
    fn single_source_total_is_the_source() {
        // MC=[9,19], up shifts +1/+1, down -1/-1: band
        // half-width [1,1] either side.
        let shape = two_bin_shape();
        let mgr = SystManager::from_shape(&shape, &[], false).unwrap();
        let total = mgr.total().unwrap();
        assert_relative_eq!(total.up()[0] - total.nominal[0], 1.0);
        assert_relative_eq!(total.up()[1] - total.nominal[1], 1.0);
        assert_relative_eq!(total.nominal[0] - total.down()[0], 1.0);
        assert_relative_eq!(total.nominal[1] - total.down()[1], 1.0);
    }

    #[test]
    fn manager_collects_and_filters() {
        let shape = two_bin_shape();
        let mgr = SystManager::from_shape(&shape, &[], true).unwrap();
        assert_eq!(mgr.names(), vec![MCSTAT, "sys"]);
        assert!(mgr.mcstat().is_some());

        let only = vec!["doesnotexist".to_string()];
        let mgr = SystManager::from_shape(&shape, &only, false).unwrap();
        assert!(mgr.names().is_empty());
        // Empty total band collapses onto the nominal.
        let total = mgr.total().unwrap();
        assert_eq!(total.up(), total.nominal);
    }

    #[test]
    fn unpaired_variation_rejected() {
        let shape = shape_from(
            r#"{
                "variables": { "x": {
                    "bin_edges": [0.0, 1.0],
                    "samples": {
                        "mc": { "categories": { "c": {
                            "nominal": { "values": [10.0] },
                            "sUp": { "values": [12.0] }
                        } } }
                    }
                } }
            }"#,
            "x",
            "c",
        );
        assert!(SystManager::from_shape(&shape, &[], false).is_err());
    }

    #[test]
    fn partial_band_unknown_source_rejected() {
        let shape = two_bin_shape();
        let mgr = SystManager::from_shape(&shape, &[], false).unwrap();
        assert!(mgr.partial(&["sys".to_string()]).is_ok());
        assert!(mgr.partial(&["nope".to_string()]).is_err());
    }

    #[test]
    fn ratio_edges_guard_zero_nominal() {
        let shape = shape_from(
            r#"{
                "variables": { "x": {
                    "bin_edges": [0.0, 1.0, 2.0],
                    "samples": {
                        "mc": { "categories": { "c": {
                            "nominal": { "values": [0.0, 10.0] },
                            "sUp": { "values": [1.0, 11.0] },
                            "sDown": { "values": [-1.0, 9.0] }
                        } } }
                    }
                } }
            }"#,
            "x",
            "c",
        );
        let s = SystUnc::from_shape(&shape, "s").unwrap();
        assert_relative_eq!(s.ratio_up()[0], 1.0);
        assert_relative_eq!(s.ratio_up()[1], 1.1);
        assert_relative_eq!(s.ratio_down()[1], 0.9);
    }
}
