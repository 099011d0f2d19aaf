//! Command-line interface module.

mod args;
pub mod slice;

pub use args::Cli;
pub use slice::run_cli;
