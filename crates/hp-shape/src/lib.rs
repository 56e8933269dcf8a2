//! # hp-shape
//!
//! Per-(category, variable) Data/MC bundles, systematic-uncertainty
//! combination, and the numbers-first plot artifacts consumed by the
//! renderer.

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Serializable plot artifacts.
pub mod artifact;

/// `Shape`: Data/MC histogram bundle for one (category, variable) pair.
pub mod shape;

/// `SystUnc` quadrature algebra and the per-shape `SystManager`.
pub mod syst;

pub use artifact::{ArtifactMeta, BandEnvelope, DataMcArtifact, SampleSeries, SystVariationArtifact};
pub use shape::{McSample, Shape};
pub use syst::{SystManager, SystUnc};
