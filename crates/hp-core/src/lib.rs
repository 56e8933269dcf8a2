//! # hp-core
//!
//! Core building blocks shared by all hepplot crates: the [`Histogram`]
//! value type and the common error/result types.

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Error types for hepplot.
pub mod error;

/// 1D histogram value type.
pub mod histogram;

pub use error::{Error, Result};
pub use histogram::Histogram;

/// Crate version (propagated to artifacts and the CLI).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
