//! # hp-input
//!
//! External interfaces of hepplot: the histogram-collection JSON file,
//! the dumped analysis-parameters config, and YAML style overrides.

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Histogram-collection file schema and accessors.
pub mod collection;

/// Analysis-parameters config (`--cfg`).
pub mod params;

/// Style override YAML (`-op`).
pub mod style;

pub use collection::{BinData, HistCollection, SampleEntry, VariableEntry};
pub use params::{ExperimentMeta, PlotParams};
pub use style::StyleConfig;

/// Name of the nominal (unshifted) variation.
pub const NOMINAL: &str = "nominal";
