//! Configuration management for `slicer.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Configuration section definitions
//! │   ├── slice      # [slice]
//! │   ├── renderer   # [renderer]
//! │   └── log        # [log]
//! ├── types/         # ConfigError, diagnostics, field paths
//! ├── util.rs        # Config file discovery
//! └── mod.rs         # SlicerConfig (this file)
//! ```
//!
//! The file is optional. Values resolve as CLI flag > `slicer.toml` > default.
//! Relative paths in the file are resolved against the directory holding it;
//! relative paths on the command line against the current directory.

pub mod section;
pub mod types;
mod util;

use util::find_config_file;

pub use section::{LogConfig, RendererConfig, SliceConfig};
pub use types::{ConfigDiagnostic, ConfigDiagnostics, ConfigError, FieldPath};

use crate::{
    cli::Cli,
    log,
    pipeline::SliceOptions,
    utils::path::{expand_path, normalize_path},
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Config file name searched upward from the current directory.
pub const CONFIG_FILE: &str = "slicer.toml";

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing slicer.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SlicerConfig {
    /// Config file in use, if any (internal use only)
    #[serde(skip)]
    pub config_path: Option<PathBuf>,

    /// Directory relative config paths resolve against (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    #[serde(default)]
    pub slice: SliceConfig,

    #[serde(default)]
    pub renderer: RendererConfig,

    #[serde(default)]
    pub log: LogConfig,
}

impl SlicerConfig {
    /// Load configuration for a CLI invocation.
    ///
    /// Uses `-C` when given, otherwise searches upward from the current
    /// directory. Without a config file, defaults apply.
    pub fn load(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current working directory")?;
        Self::load_in(cli, &cwd)
    }

    fn load_in(cli: &Cli, cwd: &Path) -> Result<Self> {
        let config_path = match &cli.config {
            Some(path) => Some(cwd.join(path)),
            None => find_config_file(cwd, Path::new(CONFIG_FILE)),
        };

        let mut config = match &config_path {
            Some(path) => Self::from_path(path)?,
            None => Self::default(),
        };

        let root = config_path
            .as_deref()
            .and_then(Path::parent)
            .unwrap_or(cwd)
            .to_path_buf();
        config.config_path = config_path;
        config.finalize(cli, &root, cwd);

        config.validate(!cli.dry_run)?;
        Ok(config)
    }

    /// Parse configuration from TOML string
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(ConfigError::Toml)?;
        Ok(config)
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>)> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })
        .map_err(ConfigError::Toml)?;
        Ok((config, ignored))
    }

    /// Print warning about unknown fields.
    ///
    /// The run may be driven by an editor without a terminal, so unknown
    /// fields never prompt.
    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        log!("warning"; "unknown fields in {}, ignoring:", path.display());
        for field in fields {
            eprintln!("- {}", field);
        }
    }

    // ========================================================================
    // cli configuration updates
    // ========================================================================

    /// Resolve paths and apply CLI overrides.
    fn finalize(&mut self, cli: &Cli, root: &Path, cwd: &Path) {
        self.root = normalize_path(root);
        self.normalize_paths();
        self.apply_cli_options(cli, cwd);
    }

    fn apply_cli_options(&mut self, cli: &Cli, cwd: &Path) {
        if let Some(directory) = &cli.directory {
            self.slice.directory = expand_path(directory, cwd);
        }
        Self::update_option(&mut self.slice.layer, cli.layer.as_ref());
        Self::update_option(&mut self.slice.overwrite, cli.overwrite.as_ref());
        Self::update_option(&mut self.slice.save_marked, cli.save_marked.as_ref());
    }

    /// Update config option if CLI value is provided.
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    // ========================================================================
    // path normalization
    // ========================================================================

    /// Expand `~` and resolve file paths against the root directory.
    fn normalize_paths(&mut self) {
        if !self.slice.directory.as_os_str().is_empty() {
            self.slice.directory = expand_path(&self.slice.directory, &self.root);
        }
        if let Some(file) = self.log.file.take() {
            self.log.file = Some(expand_path(&file, &self.root));
        }
    }

    // ========================================================================
    // validation
    // ========================================================================

    /// Validate configuration.
    ///
    /// Collects all validation errors and returns them at once. The renderer
    /// program is looked up only when `check_installed` is set.
    pub fn validate(&self, check_installed: bool) -> Result<()> {
        let mut diag = ConfigDiagnostics::new();

        self.slice.validate(&mut diag);
        self.renderer.validate(check_installed, &mut diag);

        diag.into_result()
            .map_err(|e| ConfigError::Diagnostics(e).into())
    }

    // ========================================================================
    // accessors
    // ========================================================================

    /// Options of a run over `source`.
    pub fn slice_options(&self, source: &Path, dry_run: bool) -> SliceOptions {
        SliceOptions {
            source: source.to_path_buf(),
            directory: self.slice.directory.clone(),
            layer: self.slice.layer.clone(),
            overwrite: self.slice.overwrite,
            save_marked: self.slice.save_marked,
            dry_run,
        }
    }

    /// Debug log file, `None` when disabled.
    pub fn log_file(&self) -> Option<PathBuf> {
        self.log.path()
    }
}

// ============================================================================
// Test Helpers (available to all modules via `use crate::config::test_*`)
// ============================================================================

/// Parse config from TOML.
/// Panics if there are unknown fields (to catch config typos in tests).
#[cfg(test)]
pub fn test_parse_config(content: &str) -> SlicerConfig {
    let (parsed, ignored) = SlicerConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

// ============================================================================
// tests
// ============================================================================
