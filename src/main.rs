//! Slicer - export the rectangles of an SVG layer as cropped PNG slices.

use anyhow::Result;
use clap::{ColorChoice, Parser};
use slicer::cli::{Cli, run_cli};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    slicer::logger::set_verbose(cli.verbose);

    run_cli(&cli, &mut std::io::stdout().lock())?;
    Ok(())
}
