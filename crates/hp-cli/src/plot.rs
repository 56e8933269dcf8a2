//! Plot-run orchestration: filters, worker pool and output layout.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rayon::prelude::*;
use regex::Regex;

use hp_input::{HistCollection, PlotParams, StyleConfig};
use hp_render::config::resolve_config;
use hp_render::RenderConfig;
use hp_shape::artifact::{datamc_artifact, syst_variation_artifact};
use hp_shape::{Shape, SystManager, SystUnc};

pub struct PlotSettings {
    pub cfg: PathBuf,
    pub inputfile: PathBuf,
    pub outputdir: PathBuf,
    pub overrides: Vec<PathBuf>,
    pub workers: usize,
    pub only_cat: Vec<String>,
    pub only_syst: Vec<String>,
    pub exclude_hist: Vec<String>,
    pub split_systematics: bool,
    pub partial_unc_band: Vec<String>,
    pub overwrite: bool,
    pub log: bool,
    pub density: bool,
}

/// One (category, variable) rendering task.
struct Task<'a> {
    category: &'a str,
    variable: &'a str,
    out_dir: PathBuf,
}

fn ensure_output_dir(dir: &Path, overwrite: bool) -> Result<()> {
    if dir.exists() {
        if !dir.is_dir() {
            anyhow::bail!("output path exists but is not a directory: {}", dir.display());
        }
        if !overwrite && dir.read_dir()?.next().is_some() {
            anyhow::bail!(
                "output directory is not empty: {} (use --overwrite)",
                dir.display()
            );
        }
    } else {
        std::fs::create_dir_all(dir)?;
    }
    Ok(())
}

/// Overlay `-op` files onto the baseline style; later files win per key.
fn resolve_style(params: &PlotParams, overrides: &[PathBuf]) -> Result<StyleConfig> {
    let mut style = params.style.clone();
    for path in overrides {
        let overlay = StyleConfig::from_yaml_file(path)
            .with_context(|| format!("reading style override {}", path.display()))?;
        style.merge(overlay);
    }
    Ok(style)
}

/// Renderer settings: the last `-op` file wins wholesale, the experiment
/// header always comes from the analysis config.
fn resolve_render_config(params: &PlotParams, overrides: &[PathBuf]) -> Result<RenderConfig> {
    let mut rc = match overrides.last() {
        Some(path) => {
            let yaml = std::fs::read_to_string(path)
                .with_context(|| format!("reading render override {}", path.display()))?;
            resolve_config(Some(&yaml))?
        }
        None => RenderConfig::default(),
    };
    rc.experiment.name = params.experiment.name.clone();
    rc.experiment.status = params.experiment.status.clone();
    rc.experiment.sqrt_s_tev = params.experiment.sqrt_s_tev;
    rc.experiment.lumi_fb_inv = params.experiment.lumi_fb_inv;
    Ok(rc)
}

fn compile_excludes(patterns: &[String]) -> Result<Vec<Regex>> {
    patterns
        .iter()
        .map(|p| Regex::new(p).with_context(|| format!("invalid --exclude_hist regex '{}'", p)))
        .collect()
}

fn write_plot(svg: &str, path: &Path, rc: &RenderConfig) -> Result<()> {
    match rc.output.format.as_str() {
        "svg" => hp_render::save_svg(svg, path)?,
        "png" => {
            #[cfg(feature = "png")]
            hp_render::raster::save_png(svg, path, rc.output.dpi)?;
            #[cfg(not(feature = "png"))]
            anyhow::bail!("PNG output requires the 'png' build feature");
        }
        other => anyhow::bail!("unsupported output format '{}'", other),
    }
    Ok(())
}

fn render_task(
    task: &Task,
    coll: &HistCollection,
    params: &PlotParams,
    style: &StyleConfig,
    rc: &RenderConfig,
    settings: &PlotSettings,
) -> Result<Vec<PathBuf>> {
    let shape = Shape::build(coll, task.variable, task.category, params, style)?;
    let ext = rc.output.format.as_str();
    let mut written = Vec::new();

    let mut band: Option<SystUnc> = None;
    let mut manager: Option<SystManager> = None;
    if !shape.is_data_only() {
        let mgr = SystManager::from_shape(&shape, &settings.only_syst, true)?;
        band = Some(if settings.partial_unc_band.is_empty() {
            mgr.total()?
        } else {
            mgr.partial(&settings.partial_unc_band)?
        });
        manager = Some(mgr);
    }

    let artifact = datamc_artifact(&shape, band.as_ref(), settings.log, settings.density)?;
    let svg = hp_render::render_datamc(&artifact, rc)?;
    let path = task.out_dir.join(format!("{}_{}.{ext}", task.variable, task.category));
    write_plot(&svg, &path, rc)?;
    tracing::info!(plot = %path.display(), "rendered");
    written.push(path);

    if settings.split_systematics {
        if let Some(mgr) = &manager {
            for name in mgr.names() {
                if name == hp_shape::syst::MCSTAT {
                    continue;
                }
                let syst = mgr
                    .get(name)
                    .ok_or_else(|| hp_core::Error::Computation(format!("lost source '{name}'")))?;
                let var_artifact = syst_variation_artifact(&shape, syst)?;
                let svg = hp_render::render_variation(&var_artifact, rc)?;
                let path = task
                    .out_dir
                    .join(format!("{}_{}_{name}.{ext}", task.variable, task.category));
                write_plot(&svg, &path, rc)?;
                written.push(path);
            }
        }
    }

    Ok(written)
}

pub fn run(settings: &PlotSettings) -> Result<()> {
    let params = PlotParams::load(&settings.cfg)
        .with_context(|| format!("loading config {}", settings.cfg.display()))?;
    let style = resolve_style(&params, &settings.overrides)?;
    let rc = resolve_render_config(&params, &settings.overrides)?;
    let excludes = compile_excludes(&settings.exclude_hist)?;

    tracing::info!(path = %settings.inputfile.display(), "loading histogram collection");
    let coll = HistCollection::load(&settings.inputfile)
        .with_context(|| format!("loading input {}", settings.inputfile.display()))?;

    let categories: Vec<String> = coll
        .categories()
        .into_iter()
        .filter(|c| {
            settings.only_cat.is_empty() || settings.only_cat.iter().any(|f| c.contains(f.as_str()))
        })
        .collect();

    let mut tasks: Vec<Task> = Vec::new();
    for (variable, entry) in &coll.variables {
        if excludes.iter().any(|re| re.is_match(variable)) {
            continue;
        }
        for category in &categories {
            let stored = entry.samples.values().any(|s| s.categories.contains_key(category));
            if !stored {
                continue;
            }
            let mut out_dir = settings.outputdir.join(category);
            if settings.log {
                out_dir = out_dir.join("log");
            }
            tasks.push(Task { category, variable, out_dir });
        }
    }
    tracing::info!(
        tasks = tasks.len(),
        categories = categories.len(),
        "plotting tasks prepared"
    );

    ensure_output_dir(&settings.outputdir, settings.overwrite)?;
    for task in &tasks {
        std::fs::create_dir_all(&task.out_dir)?;
    }

    if settings.workers > 0 {
        // Best-effort; if a global pool already exists, keep going.
        let _ = rayon::ThreadPoolBuilder::new().num_threads(settings.workers).build_global();
    }

    // Every task runs; one failure never blocks the rest.
    let failures: Vec<String> = tasks
        .par_iter()
        .filter_map(|task| {
            match render_task(task, &coll, &params, &style, &rc, settings) {
                Ok(_) => None,
                Err(e) => {
                    tracing::error!(
                        category = task.category,
                        variable = task.variable,
                        error = %e,
                        "plotting task failed"
                    );
                    Some(format!("{}/{}: {e}", task.category, task.variable))
                }
            }
        })
        .collect();

    if !failures.is_empty() {
        anyhow::bail!("{} of {} plotting tasks failed", failures.len(), tasks.len());
    }
    tracing::info!(rendered = tasks.len(), "all plots rendered");
    Ok(())
}
