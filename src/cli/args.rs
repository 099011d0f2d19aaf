//! Command-line argument definitions.

use clap::{ColorChoice, Parser};
use std::path::PathBuf;

/// Export the rectangles of an SVG layer as cropped PNG slices
///
/// Every rectangle of the slice layer is hidden, exported by the renderer as
/// `<directory>/<id>.png`, then marked translucent red.
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// SVG document to slice (rewritten in place before exporting)
    #[arg(value_name = "SVG", value_hint = clap::ValueHint::FilePath)]
    pub svg: PathBuf,

    /// Existing directory receiving the PNGs [default: ~]
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    pub directory: Option<PathBuf>,

    /// Label of the layer holding the slice rectangles [default: slices]
    #[arg(short, long)]
    pub layer: Option<String>,

    /// Replace existing PNGs instead of skipping them
    #[arg(short, long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = true)]
    pub overwrite: Option<bool>,

    /// Write the marked document back to the SVG
    #[arg(long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = true)]
    pub save_marked: Option<bool>,

    /// Print the final document to stdout
    #[arg(long)]
    pub stdout: bool,

    /// Plan the exports without editing, writing or rendering anything
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Config file path (default: slicer.toml, searched upward)
    #[arg(short = 'C', long, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Control colored output (auto, always, never)
    #[arg(long, default_value = "auto")]
    pub color: ColorChoice,
}
