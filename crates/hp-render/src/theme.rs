use crate::color::Color;
use crate::config::*;

/// Built-in theme presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinTheme {
    Hep2026,
    Atlas,
    Cms,
}

impl BuiltinTheme {
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "atlas" => Self::Atlas,
            "cms" => Self::Cms,
            _ => Self::Hep2026,
        }
    }

    pub fn base_config(self) -> RenderConfig {
        match self {
            Self::Hep2026 => hep2026(),
            Self::Atlas => atlas(),
            Self::Cms => cms(),
        }
    }
}

fn hep2026() -> RenderConfig {
    RenderConfig {
        figure: FigureConfig::default(),
        font: FontConfig::default(),
        axes: AxesConfig::default(),
        grid: GridConfig::default(),
        experiment: ExperimentConfig::default(),
        colors: ColorsConfig::default(),
        palette: "hep_default".into(),
        output: OutputConfig::default(),
        distributions: DistributionsConfig::default(),
    }
}

fn atlas() -> RenderConfig {
    RenderConfig {
        figure: FigureConfig { width: 576.0, height: 432.0 },
        font: FontConfig { size: 11.0, label_size: 12.0, tick_size: 9.5, ..FontConfig::default() },
        experiment: ExperimentConfig {
            name: "ATLAS".into(),
            status: "Internal".into(),
            sqrt_s_tev: 13.6,
            lumi_fb_inv: 140.0,
        },
        palette: "atlas_wong".into(),
        ..hep2026()
    }
}

fn cms() -> RenderConfig {
    RenderConfig {
        figure: FigureConfig { width: 576.0, height: 576.0 },
        grid: GridConfig { show: false, color: Color::hex("#CBD5E1"), alpha: 0.55 },
        experiment: ExperimentConfig {
            name: "CMS".into(),
            status: "Preliminary".into(),
            sqrt_s_tev: 13.6,
            lumi_fb_inv: 138.0,
        },
        palette: "cms_petroff6".into(),
        ..hep2026()
    }
}
