mod batch;
mod config;
mod data;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use batch::BatchOptions;
use config::CleaningConfig;

/// Clean in-situ chlorophyll measurements from ODV exports into one CSV table.
#[derive(Parser, Debug)]
#[command(name = "situ-chl", version)]
struct Cli {
    /// File list naming the ODV files to read and their marks.
    #[arg(default_value = "filelist.txt")]
    filelist: PathBuf,

    /// Output CSV path.
    #[arg(default_value = "situ.csv")]
    output: PathBuf,

    /// JSON file with cleaning thresholds.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Cache of parsed files; read if present, written otherwise.
    #[arg(long)]
    cache: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => CleaningConfig::load(path)?,
        None => CleaningConfig::default(),
    };
    log::info!("Script execution started.");

    let options = BatchOptions {
        manifest: cli.filelist,
        output: cli.output,
        cache: cli.cache,
        config,
    };
    let summary = batch::run(&options)?;
    log::debug!("{summary:?}");
    Ok(())
}
