//! # hp-render
//!
//! Dependency-light SVG renderer for hepplot artifacts. SVG is produced
//! directly; PNG rasterization sits behind the `png` feature.

pub mod canvas;
pub mod color;
pub mod config;
pub mod header;
pub mod layout;
pub mod plots;
pub mod primitives;
pub mod text;
pub mod theme;

#[cfg(feature = "png")]
pub mod raster;

use thiserror::Error;

pub use config::RenderConfig;

/// Renderer error type.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Malformed render configuration.
    #[error("config error: {0}")]
    Config(String),
    /// Inconsistent artifact (e.g. array length mismatch).
    #[error("artifact error: {0}")]
    Artifact(String),
    /// I/O failure while writing output.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// PNG rasterization failure.
    #[cfg(feature = "png")]
    #[error("PNG encoding error: {0}")]
    Png(String),
}

/// Result alias for the renderer.
pub type Result<T> = std::result::Result<T, RenderError>;

/// Render a Data/MC artifact to an SVG string.
pub fn render_datamc(
    artifact: &hp_shape::DataMcArtifact,
    config: &RenderConfig,
) -> Result<String> {
    plots::datamc::render(artifact, config)
}

/// Render a systematic-variation artifact to an SVG string.
pub fn render_variation(
    artifact: &hp_shape::SystVariationArtifact,
    config: &RenderConfig,
) -> Result<String> {
    plots::variation::render(artifact, config)
}

/// Write SVG text to a file.
pub fn save_svg(svg: &str, path: &std::path::Path) -> Result<()> {
    std::fs::write(path, svg)?;
    Ok(())
}
