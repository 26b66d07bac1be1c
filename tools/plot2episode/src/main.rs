//! plot2episode
//!
//! Resolves an unidentified broadcast episode of a series to its
//! season/episode id by comparing its guide plot with the canonical plots
//! known for the series.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use plotmatch::{PlotMatchError, Resolver, ResolverConfig, SeriesName, TsvPlotSource};
use tracing::{Level, error, info};

/// CLI arguments
#[derive(Debug, Parser)]
#[command(name = "plot2episode")]
#[command(about = "Find the season/episode a broadcast plot belongs to")]
#[command(version)]
struct Cli {
    /// Working directory holding per-series corpora and models
    #[arg(short = 'w', long = "workingdir", env = "PLOT2EPISODE_WORKDIR")]
    workdir: PathBuf,

    /// Series name
    #[arg(short = 's', long = "seriesname", env = "PLOT2EPISODE_SERIES")]
    series: String,

    /// Plot to resolve; without it the model is only refreshed
    #[arg(short, long)]
    plot: Option<String>,

    /// Verbosity: 0 errors, 1 warnings, 2 info, 3 debug
    #[arg(
        short = 'l',
        long = "loglevel",
        env = "PLOT2EPISODE_LOGLEVEL",
        default_value_t = 1,
        value_parser = clap::value_parser!(u8).range(0..=3)
    )]
    loglevel: u8,

    /// Config file (default: <workingdir>/plot2episode.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Tab-separated canonical plots to add before resolving
    #[arg(long, value_name = "FILE")]
    plots: Option<PathBuf>,

    /// Discard the saved model and retrain from scratch
    #[arg(long)]
    retrain: bool,
}

fn level(loglevel: u8) -> Level {
    match loglevel {
        0 => Level::ERROR,
        1 => Level::WARN,
        2 => Level::INFO,
        _ => Level::DEBUG,
    }
}

fn run(cli: &Cli) -> Result<String, PlotMatchError> {
    let config = match &cli.config {
        Some(path) => ResolverConfig::load(path)?,
        None => ResolverConfig::discover(&cli.workdir)?,
    };
    let series = SeriesName::new(cli.series.as_str())?;
    let resolver = Resolver::new(&cli.workdir, config)?;

    if cli.retrain {
        resolver.discard_model(&series)?;
    }
    if let Some(path) = &cli.plots {
        let outcome = resolver.ingest(&series, &TsvPlotSource::new(path))?;
        info!(
            added = outcome.added,
            skipped = outcome.rejected.len(),
            "canonical plots ingested"
        );
    }

    let outcome = resolver.resolve(&series, cli.plot.as_deref())?;
    Ok(outcome.to_string())
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level(cli.loglevel))
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();

    let status = tracing::subscriber::with_default(subscriber, || match run(&cli) {
        Ok(line) => {
            println!("{line}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "plot2episode failed");
            eprintln!("plot2episode: {e}");
            ExitCode::from(e.exit_code())
        }
    });

    std::io::Write::flush(&mut std::io::stdout()).context("failed to flush stdout")?;
    Ok(status)
}
