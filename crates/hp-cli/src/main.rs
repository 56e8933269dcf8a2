//! hepplot CLI

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

mod plot;

#[derive(Parser)]
#[command(name = "hepplot")]
#[command(about = "hepplot - Data/MC comparison plots from histogram collections")]
#[command(version)]
struct Cli {
    /// Analysis parameters config (JSON)
    #[arg(long = "cfg")]
    cfg: PathBuf,

    /// Input histogram collection (JSON)
    #[arg(short, long = "inputfile")]
    inputfile: PathBuf,

    /// Output directory for the rendered plots
    #[arg(short, long = "outputdir")]
    outputdir: PathBuf,

    /// Style/render override file (YAML). Repeatable; later files win.
    #[arg(long = "op", alias = "overwrite_parameters")]
    overwrite_parameters: Vec<PathBuf>,

    /// Worker threads (0 = all cores)
    #[arg(short = 'j', long = "workers", default_value = "0")]
    workers: usize,

    /// Only render categories whose name contains this string. Repeatable.
    #[arg(long = "only_cat")]
    only_cat: Vec<String>,

    /// Only include these systematic sources. Repeatable.
    #[arg(long = "only_syst")]
    only_syst: Vec<String>,

    /// Skip variables matching this regex. Repeatable.
    #[arg(long = "exclude_hist")]
    exclude_hist: Vec<String>,

    /// Additionally render one nominal/up/down plot per systematic source
    #[arg(long = "split_systematics")]
    split_systematics: bool,

    /// Restrict the uncertainty band to these sources. Repeatable.
    #[arg(long = "partial_unc_band")]
    partial_unc_band: Vec<String>,

    /// Allow writing into a non-empty output directory
    #[arg(long)]
    overwrite: bool,

    /// Logarithmic y axis (outputs land in a log/ subdirectory)
    #[arg(long)]
    log: bool,

    /// Normalize histograms to unit area
    #[arg(long)]
    density: bool,

    /// Log verbosity level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    log_level: tracing::Level,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt().with_max_level(cli.log_level).with_target(false).init();

    let settings = plot::PlotSettings {
        cfg: cli.cfg,
        inputfile: cli.inputfile,
        outputdir: cli.outputdir,
        overrides: cli.overwrite_parameters,
        workers: cli.workers,
        only_cat: cli.only_cat,
        only_syst: cli.only_syst,
        exclude_hist: cli.exclude_hist,
        split_systematics: cli.split_systematics,
        partial_unc_band: cli.partial_unc_band,
        overwrite: cli.overwrite,
        log: cli.log,
        density: cli.density,
    };
    plot::run(&settings)
}
