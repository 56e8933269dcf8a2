//! Numbers-first plot artifacts (plot-friendly JSON: arrays, not nested
//! objects). The renderer consumes these; they can also be dumped for
//! downstream tooling.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;
use statrs::distribution::{ChiSquared, ContinuousCDF};

use hp_core::Result;

use crate::shape::Shape;
use crate::syst::SystUnc;

/// Lower/upper band edges per bin.
#[derive(Debug, Clone, Serialize)]
pub struct BandEnvelope {
    /// Lower edge per bin.
    pub lo: Vec<f64>,
    /// Upper edge per bin.
    pub hi: Vec<f64>,
}

/// One MC entity of the stack, in stack order.
#[derive(Debug, Clone, Serialize)]
pub struct SampleSeries {
    /// Sample (or group) identifier.
    pub name: String,
    /// Display label.
    pub label: String,
    /// Hex color when configured; renderer palette otherwise.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Nominal yield per bin.
    pub y: Vec<f64>,
}

/// Artifact metadata.
#[derive(Debug, Clone, Serialize)]
pub struct ArtifactMeta {
    /// Producing tool.
    pub tool: String,
    /// Tool version.
    pub tool_version: String,
    /// Creation timestamp (unix ms).
    pub created_unix_ms: u128,
}

/// Everything needed to draw one Data/MC comparison plot.
#[derive(Debug, Clone, Serialize)]
pub struct DataMcArtifact {
    /// Artifact schema identifier.
    pub schema_version: String,
    /// Metadata.
    pub meta: ArtifactMeta,
    /// Variable name.
    pub variable: String,
    /// Category name.
    pub category: String,
    /// X-axis label.
    pub axis_label: String,
    /// Bin edges.
    pub bin_edges: Vec<f64>,
    /// Data yield per bin; `None` for MC-only shapes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_y: Option<Vec<f64>>,
    /// Downward data error per bin.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_yerr_lo: Option<Vec<f64>>,
    /// Upward data error per bin.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_yerr_hi: Option<Vec<f64>>,
    /// Data error model that was applied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_error_model: Option<String>,
    /// MC stack, bottom to top.
    pub samples: Vec<SampleSeries>,
    /// Nominal MC sum per bin.
    pub total_mc_y: Vec<f64>,
    /// Uncertainty band around the MC sum.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub band: Option<BandEnvelope>,
    /// Data/MC ratio per bin (NaN where the MC sum vanishes).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ratio_y: Option<Vec<f64>>,
    /// Downward ratio error per bin.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ratio_yerr_lo: Option<Vec<f64>>,
    /// Upward ratio error per bin.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ratio_yerr_hi: Option<Vec<f64>>,
    /// Band around 1 in the ratio panel.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ratio_band: Option<BandEnvelope>,
    /// Logarithmic y-axis requested.
    pub log: bool,
    /// Density normalization applied.
    pub density: bool,
}

/// Nominal/up/down comparison for one systematic source
/// (`--split_systematics`).
#[derive(Debug, Clone, Serialize)]
pub struct SystVariationArtifact {
    /// Artifact schema identifier.
    pub schema_version: String,
    /// Metadata.
    pub meta: ArtifactMeta,
    /// Variable name.
    pub variable: String,
    /// Category name.
    pub category: String,
    /// Systematic source name.
    pub syst_name: String,
    /// X-axis label.
    pub axis_label: String,
    /// Bin edges.
    pub bin_edges: Vec<f64>,
    /// Nominal MC sum per bin.
    pub nominal: Vec<f64>,
    /// Upward band edge per bin.
    pub up: Vec<f64>,
    /// Downward band edge per bin.
    pub down: Vec<f64>,
}

fn now_unix_ms() -> Result<u128> {
    let d = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| hp_core::Error::Computation(format!("system time error: {}", e)))?;
    Ok(d.as_millis())
}

fn meta() -> Result<ArtifactMeta> {
    Ok(ArtifactMeta {
        tool: "hepplot".to_string(),
        tool_version: hp_core::VERSION.to_string(),
        created_unix_ms: now_unix_ms()?,
    })
}

fn is_near_integer_nonneg(x: f64) -> Option<u64> {
    if !(x.is_finite() && x >= 0.0) {
        return None;
    }
    let r = x.round();
    if (x - r).abs() <= 1e-9 {
        Some(r as u64)
    } else {
        None
    }
}

/// Central 68.27% Poisson interval (Garwood) around an observed count.
fn garwood_68_interval(n: u64) -> (f64, f64) {
    let alpha = 0.31731_f64;
    let lo = if n == 0 {
        0.0
    } else {
        match ChiSquared::new(2.0 * (n as f64)) {
            Ok(dist) => (n as f64) - 0.5 * dist.inverse_cdf(alpha / 2.0),
            Err(_) => (n as f64).sqrt(),
        }
    };
    let hi = match ChiSquared::new(2.0 * ((n + 1) as f64)) {
        Ok(dist) => 0.5 * dist.inverse_cdf(1.0 - alpha / 2.0) - (n as f64),
        Err(_) => (n as f64).sqrt(),
    };
    (lo, hi)
}

/// Per-bin data errors: Garwood Poisson intervals when every bin content is
/// a non-negative integer, `sqrt(y)` fallback otherwise.
fn data_errors(y: &[f64]) -> (Vec<f64>, Vec<f64>, String) {
    let mut lo = Vec::with_capacity(y.len());
    let mut hi = Vec::with_capacity(y.len());

    let mut all_poisson = true;
    for &v in y {
        if let Some(n) = is_near_integer_nonneg(v) {
            let (dl, dh) = garwood_68_interval(n);
            lo.push(dl);
            hi.push(dh);
        } else {
            all_poisson = false;
            let e = if v.is_finite() && v > 0.0 { v.sqrt() } else { f64::NAN };
            lo.push(e);
            hi.push(e);
        }
    }
    let model = if all_poisson { "garwood_poisson_68" } else { "sqrt_y_fallback" };
    (lo, hi, model.to_string())
}

fn ratio_from_data_over_mc(
    data: &[f64],
    data_lo: &[f64],
    data_hi: &[f64],
    mc: &[f64],
) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
    let n = data.len();
    let mut y = Vec::with_capacity(n);
    let mut lo = Vec::with_capacity(n);
    let mut hi = Vec::with_capacity(n);
    for i in 0..n {
        let denom = mc[i];
        if denom.is_finite() && denom != 0.0 {
            y.push(data[i] / denom);
            lo.push(data_lo[i] / denom);
            hi.push(data_hi[i] / denom);
        } else {
            y.push(f64::NAN);
            lo.push(f64::NAN);
            hi.push(f64::NAN);
        }
    }
    (y, lo, hi)
}

/// Per-bin density scale factors: 1 / (integral * bin width).
fn density_scale(values: &[f64], widths: &[f64]) -> Vec<f64> {
    let integral: f64 = values.iter().sum();
    widths
        .iter()
        .map(|w| {
            let d = integral * w;
            if d != 0.0 {
                1.0 / d
            } else {
                0.0
            }
        })
        .collect()
}

fn scaled(values: &[f64], scale: &[f64]) -> Vec<f64> {
    values.iter().zip(scale).map(|(v, s)| v * s).collect()
}

/// Build the Data/MC artifact for one shape.
///
/// `band` is the reduced uncertainty (total, mcstat-only or partial); ratio
/// fields are filled only when the shape has both data and MC.
pub fn datamc_artifact(
    shape: &Shape,
    band: Option<&SystUnc>,
    log: bool,
    density: bool,
) -> Result<DataMcArtifact> {
    let widths = shape.mc_sum.bin_widths();
    let unit = vec![1.0; widths.len()];

    let mc_scale =
        if density { density_scale(&shape.mc_sum.values, &widths) } else { unit.clone() };
    let total_mc_y = scaled(&shape.mc_sum.values, &mc_scale);

    let samples: Vec<SampleSeries> = shape
        .mc
        .iter()
        .map(|s| SampleSeries {
            name: s.name.clone(),
            label: s.label.clone(),
            color: s.color.map(|[r, g, b]| format!("#{:02x}{:02x}{:02x}", r, g, b)),
            y: scaled(&s.nominal.values, &mc_scale),
        })
        .collect();

    let band_env = band.map(|b| BandEnvelope {
        lo: scaled(&b.down(), &mc_scale),
        hi: scaled(&b.up(), &mc_scale),
    });
    let ratio_band = band.map(|b| BandEnvelope { lo: b.ratio_down(), hi: b.ratio_up() });

    let mut data_y = None;
    let mut data_yerr_lo = None;
    let mut data_yerr_hi = None;
    let mut data_error_model = None;
    let mut ratio_y = None;
    let mut ratio_yerr_lo = None;
    let mut ratio_yerr_hi = None;

    if let Some(d) = &shape.data {
        let (err_lo, err_hi, model) = data_errors(&d.values);
        if !shape.is_data_only() {
            let (ry, rlo, rhi) =
                ratio_from_data_over_mc(&d.values, &err_lo, &err_hi, &shape.mc_sum.values);
            ratio_y = Some(ry);
            ratio_yerr_lo = Some(rlo);
            ratio_yerr_hi = Some(rhi);
        }
        let data_scale = if density { density_scale(&d.values, &widths) } else { unit };
        data_y = Some(scaled(&d.values, &data_scale));
        data_yerr_lo = Some(scaled(&err_lo, &data_scale));
        data_yerr_hi = Some(scaled(&err_hi, &data_scale));
        data_error_model = Some(model);
    }

    Ok(DataMcArtifact {
        schema_version: "hepplot_datamc_v0".to_string(),
        meta: meta()?,
        variable: shape.variable.clone(),
        category: shape.category.clone(),
        axis_label: shape.axis_label.clone(),
        bin_edges: shape.mc_sum.bin_edges.clone(),
        data_y,
        data_yerr_lo,
        data_yerr_hi,
        data_error_model,
        samples,
        total_mc_y,
        band: band_env,
        ratio_y,
        ratio_yerr_lo,
        ratio_yerr_hi,
        ratio_band,
        log,
        density,
    })
}

/// Build the nominal/up/down artifact for one systematic source.
pub fn syst_variation_artifact(shape: &Shape, syst: &SystUnc) -> Result<SystVariationArtifact> {
    Ok(SystVariationArtifact {
        schema_version: "hepplot_syst_variation_v0".to_string(),
        meta: meta()?,
        variable: shape.variable.clone(),
        category: shape.category.clone(),
        syst_name: syst.name.clone(),
        axis_label: shape.axis_label.clone(),
        bin_edges: syst.bin_edges.clone(),
        nominal: syst.nominal.clone(),
        up: syst.up(),
        down: syst.down(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::Shape;
    use crate::syst::SystManager;
    use approx::assert_relative_eq;
    use hp_input::{HistCollection, PlotParams, StyleConfig};

    fn sample_shape() -> Shape {
        let json = r#"{
            "variables": { "x": {
                "bin_edges": [0.0, 1.0, 2.0],
                "samples": {
                    "DATA_A": { "categories": { "c": { "nominal": { "values": [10.0, 20.0] } } } },
                    "mc": { "categories": { "c": {
                        "nominal": { "values": [9.0, 19.0] },
                        "sysUp": { "values": [10.0, 20.0] },
                        "sysDown": { "values": [8.0, 18.0] }
                    } } }
                }
            } }
        }"#;
        let coll: HistCollection = serde_json::from_str(json).unwrap();
        Shape::build(&coll, "x", "c", &PlotParams::default(), &StyleConfig::default()).unwrap()
    }

    #[test]
    fn end_to_end_band_width() {
        let shape = sample_shape();
        let mgr = SystManager::from_shape(&shape, &[], false).unwrap();
        let total = mgr.total().unwrap();
        let art = datamc_artifact(&shape, Some(&total), false, false).unwrap();

        let band = art.band.unwrap();
        assert_relative_eq!(band.hi[0] - art.total_mc_y[0], 1.0);
        assert_relative_eq!(band.hi[1] - art.total_mc_y[1], 1.0);
        assert_relative_eq!(art.total_mc_y[0] - band.lo[0], 1.0);
        assert_relative_eq!(art.total_mc_y[1] - band.lo[1], 1.0);
    }

    #[test]
    fn garwood_errors_for_integer_counts() {
        let (lo, hi, model) = data_errors(&[0.0, 10.0]);
        assert_eq!(model, "garwood_poisson_68");
        // n = 0: no downward fluctuation possible.
        assert_relative_eq!(lo[0], 0.0);
        assert!(hi[0] > 1.0 && hi[0] < 2.5);
        // Large n: interval approaches sqrt(n).
        assert!((lo[1] - 10.0_f64.sqrt()).abs() < 0.5);
        assert!((hi[1] - 10.0_f64.sqrt()).abs() < 0.5);
    }

    #[test]
    fn sqrt_fallback_for_weighted_counts() {
        let (lo, hi, model) = data_errors(&[2.5, 4.0]);
        assert_eq!(model, "sqrt_y_fallback");
        assert_relative_eq!(lo[0], 2.5_f64.sqrt());
        assert_relative_eq!(hi[0], 2.5_f64.sqrt());
        // 4.0 is integer-like but the fallback is all-or-nothing per plot;
        // its interval is still Garwood in this mixed case for that bin.
        assert!(lo[1] > 0.0 && hi[1] > 0.0);
    }

    #[test]
    fn ratio_nan_on_zero_mc() {
        let (y, lo, _hi) = ratio_from_data_over_mc(&[5.0, 5.0], &[1.0, 1.0], &[1.0, 1.0], &[0.0, 10.0]);
        assert!(y[0].is_nan());
        assert!(lo[0].is_nan());
        assert_relative_eq!(y[1], 0.5);
    }

    #[test]
    fn density_normalizes_to_unit_area() {
        let shape = sample_shape();
        let art = datamc_artifact(&shape, None, false, true).unwrap();
        let widths: Vec<f64> = shape.mc_sum.bin_widths();
        let mc_area: f64 =
            art.total_mc_y.iter().zip(&widths).map(|(y, w)| y * w).sum();
        let data_area: f64 =
            art.data_y.as_ref().unwrap().iter().zip(&widths).map(|(y, w)| y * w).sum();
        assert_relative_eq!(mc_area, 1.0, max_relative = 1e-12);
        assert_relative_eq!(data_area, 1.0, max_relative = 1e-12);
    }

    #[test]
    fn variation_artifact_edges() {
        let shape = sample_shape();
        let mgr = SystManager::from_shape(&shape, &[], false).unwrap();
        let s = mgr.get("sys").unwrap();
        let art = syst_variation_artifact(&shape, s).unwrap();
        assert_eq!(art.syst_name, "sys");
        assert_relative_eq!(art.up[0], 10.0);
        assert_relative_eq!(art.down[0], 8.0);
        assert_relative_eq!(art.nominal[0], 9.0);
    }
}
