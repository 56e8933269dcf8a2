//! 1D histogram value type shared across the workspace.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A 1D histogram: bin edges, contents and per-bin variances.
///
/// Immutable once constructed; operations that combine histograms return
/// new instances and fail on binning mismatch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Histogram {
    /// Bin edges (length = n_bins + 1, strictly increasing).
    pub bin_edges: Vec<f64>,
    /// Bin contents (length = n_bins).
    pub values: Vec<f64>,
    /// Sum of weights squared per bin (length = n_bins).
    pub variances: Vec<f64>,
}

impl Histogram {
    /// Construct a histogram, validating edge monotonicity and array lengths.
    pub fn new(bin_edges: Vec<f64>, values: Vec<f64>, variances: Vec<f64>) -> Result<Self> {
        if bin_edges.len() < 2 {
            return Err(Error::Validation(format!(
                "histogram needs at least 2 bin edges, got {}",
                bin_edges.len()
            )));
        }
        if bin_edges.windows(2).any(|w| w[1] <= w[0]) {
            return Err(Error::Validation("bin edges must be strictly increasing".into()));
        }
        let n = bin_edges.len() - 1;
        if values.len() != n {
            return Err(Error::Validation(format!(
                "expected {} bin values, got {}",
                n,
                values.len()
            )));
        }
        if variances.len() != n {
            return Err(Error::Validation(format!(
                "expected {} bin variances, got {}",
                n,
                variances.len()
            )));
        }
        Ok(Self { bin_edges, values, variances })
    }

    /// Number of bins (excluding under/overflow, which are never stored).
    pub fn n_bins(&self) -> usize {
        self.bin_edges.len() - 1
    }

    /// True when `other` has the identical edge sequence.
    pub fn binning_matches(&self, other: &Histogram) -> bool {
        self.bin_edges == other.bin_edges
    }

    /// Bin-wise sum of two histograms. Variances add (independent samples).
    pub fn checked_add(&self, other: &Histogram) -> Result<Histogram> {
        if !self.binning_matches(other) {
            return Err(Error::Validation(
                "cannot add histograms with different binning".into(),
            ));
        }
        let values = self.values.iter().zip(&other.values).map(|(a, b)| a + b).collect();
        let variances =
            self.variances.iter().zip(&other.variances).map(|(a, b)| a + b).collect();
        Ok(Histogram { bin_edges: self.bin_edges.clone(), values, variances })
    }

    /// Total content (sum over bins).
    pub fn integral(&self) -> f64 {
        self.values.iter().sum()
    }

    /// Bin centers.
    pub fn bin_centers(&self) -> Vec<f64> {
        self.bin_edges.windows(2).map(|w| 0.5 * (w[0] + w[1])).collect()
    }

    /// Bin widths.
    pub fn bin_widths(&self) -> Vec<f64> {
        self.bin_edges.windows(2).map(|w| w[1] - w[0]).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn hist(values: &[f64]) -> Histogram {
        let edges: Vec<f64> = (0..=values.len()).map(|i| i as f64).collect();
        let variances = vec![0.0; values.len()];
        Histogram::new(edges, values.to_vec(), variances).unwrap()
    }

    #[test]
    fn rejects_short_edges() {
        assert!(Histogram::new(vec![1.0], vec![], vec![]).is_err());
    }

    #[test]
    fn rejects_non_monotonic_edges() {
        assert!(Histogram::new(vec![0.0, 2.0, 1.0], vec![1.0, 1.0], vec![0.0, 0.0]).is_err());
    }

    #[test]
    fn rejects_length_mismatch() {
        assert!(Histogram::new(vec![0.0, 1.0, 2.0], vec![1.0], vec![0.0, 0.0]).is_err());
        assert!(Histogram::new(vec![0.0, 1.0, 2.0], vec![1.0, 2.0], vec![0.0]).is_err());
    }

    #[test]
    fn add_same_binning() {
        let a = hist(&[1.0, 2.0]);
        let b = hist(&[3.0, 4.0]);
        let c = a.checked_add(&b).unwrap();
        assert_eq!(c.values, vec![4.0, 6.0]);
    }

    #[test]
    fn add_binning_mismatch_fails() {
        let a = hist(&[1.0, 2.0]);
        let b = Histogram::new(vec![0.0, 0.5, 1.0], vec![1.0, 1.0], vec![0.0, 0.0]).unwrap();
        assert!(a.checked_add(&b).is_err());
    }

    #[test]
    fn centers_and_widths() {
        let h = Histogram::new(vec![0.0, 1.0, 3.0], vec![1.0, 1.0], vec![0.0, 0.0]).unwrap();
        assert_relative_eq!(h.bin_centers()[0], 0.5);
        assert_relative_eq!(h.bin_centers()[1], 2.0);
        assert_relative_eq!(h.bin_widths()[1], 2.0);
        assert_relative_eq!(h.integral(), 2.0);
    }
}
