//! Stamp - content-hashed static asset pipeline.

mod asset;
mod cli;
mod config;
mod logger;
mod manifest;
mod utils;

use anyhow::{Context, Result};
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::StampConfig;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose);

    let config = StampConfig::load(&cli)?;

    // File work is I/O bound; one thread interleaves it at await points.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    runtime.block_on(async {
        match &cli.command {
            Commands::Build { args } => cli::build::run_build(&config, args.quiet).await,
            Commands::Resolve { args } => cli::resolve::run_resolve(args, &config).await,
        }
    })
}
