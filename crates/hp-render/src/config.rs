use serde::Deserialize;

use crate::color::Color;
use crate::theme::BuiltinTheme;

/// Top-level render configuration (YAML or programmatic).
#[derive(Debug, Clone)]
pub struct RenderConfig {
    pub figure: FigureConfig,
    pub font: FontConfig,
    pub axes: AxesConfig,
    pub grid: GridConfig,
    pub experiment: ExperimentConfig,
    pub colors: ColorsConfig,
    pub palette: String,
    pub output: OutputConfig,
    pub distributions: DistributionsConfig,
}

impl Default for RenderConfig {
    fn default() -> Self {
        BuiltinTheme::Hep2026.base_config()
    }
}

impl RenderConfig {
    pub fn palette_colors(&self) -> Vec<Color> {
        crate::color::palette_colors(&self.palette)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FigureConfig {
    pub width: f64,
    pub height: f64,
}

impl Default for FigureConfig {
    fn default() -> Self {
        Self {
            width: 518.4,  // 7.2" * 72
            height: 388.8, // 5.4" * 72
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FontConfig {
    pub family: String,
    pub size: f64,
    pub label_size: f64,
    pub tick_size: f64,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            family: "Helvetica, Arial, sans-serif".into(),
            size: 10.0,
            label_size: 11.0,
            tick_size: 8.5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AxesConfig {
    pub tick_direction: String,
    pub show_top_ticks: bool,
    pub show_right_ticks: bool,
    pub tick_length: f64,
    pub minor_tick_length: f64,
}

impl Default for AxesConfig {
    fn default() -> Self {
        Self {
            tick_direction: "in".into(),
            show_top_ticks: true,
            show_right_ticks: true,
            tick_length: 5.0,
            minor_tick_length: 3.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub show: bool,
    pub color: Color,
    pub alpha: f64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self { show: false, color: Color::hex("#CBD5E1"), alpha: 0.55 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    pub name: String,
    pub status: String,
    pub sqrt_s_tev: f64,
    pub lumi_fb_inv: f64,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            name: "HEPPLOT".into(),
            status: "Internal".into(),
            sqrt_s_tev: 13.6,
            lumi_fb_inv: 140.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ColorsConfig {
    pub data: Color,
    pub total_mc: Color,
    pub band: Color,
    pub variation_up: Color,
    pub variation_down: Color,
}

impl Default for ColorsConfig {
    fn default() -> Self {
        Self {
            data: Color::hex("#111827"),
            total_mc: Color::hex("#1D4ED8"),
            band: Color::hex("#4B5563"),
            variation_up: Color::hex("#DC2626"),
            variation_down: Color::hex("#1D4ED8"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: String,
    pub dpi: u32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { format: "svg".into(), dpi: 220 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DistributionsConfig {
    pub show_mc_band: bool,
    pub hatch_spacing: f64,
    pub ratio_y_range: [f64; 2],
}

impl Default for DistributionsConfig {
    fn default() -> Self {
        Self { show_mc_band: true, hatch_spacing: 4.0, ratio_y_range: [0.5, 1.5] }
    }
}

/// Per-section user overrides as they appear in a YAML file. A section
/// present in the YAML replaces the preset section wholesale; fields
/// omitted inside it take that section's defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigOverrides {
    theme: Option<String>,
    figure: Option<FigureConfig>,
    font: Option<FontConfig>,
    axes: Option<AxesConfig>,
    grid: Option<GridConfig>,
    experiment: Option<ExperimentConfig>,
    colors: Option<ColorsConfig>,
    palette: Option<String>,
    output: Option<OutputConfig>,
    distributions: Option<DistributionsConfig>,
}

/// Resolve a RenderConfig from optional YAML text.
/// The YAML's `theme` key selects the base preset (default `hep2026`);
/// the remaining sections override it.
pub fn resolve_config(user_yaml: Option<&str>) -> crate::Result<RenderConfig> {
    let Some(yaml) = user_yaml else {
        return Ok(RenderConfig::default());
    };
    let over: ConfigOverrides = serde_yaml_ng::from_str(yaml)
        .map_err(|e| crate::RenderError::Config(e.to_string()))?;
    let mut config = BuiltinTheme::parse(over.theme.as_deref().unwrap_or("")).base_config();
    if let Some(v) = over.figure {
        config.figure = v;
    }
    if let Some(v) = over.font {
        config.font = v;
    }
    if let Some(v) = over.axes {
        config.axes = v;
    }
    if let Some(v) = over.grid {
        config.grid = v;
    }
    if let Some(v) = over.experiment {
        config.experiment = v;
    }
    if let Some(v) = over.colors {
        config.colors = v;
    }
    if let Some(v) = over.palette {
        config.palette = v;
    }
    if let Some(v) = over.output {
        config.output = v;
    }
    if let Some(v) = over.distributions {
        config.distributions = v;
    }
    Ok(config)
}
