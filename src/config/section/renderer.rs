//! `[renderer]` section configuration.
//!
//! External program that crops and rasterizes one object per call.
//!
//! # Example
//!
//! ```toml
//! [renderer]
//! command = ["inkscape"]   # Program and leading arguments
//! syntax = "modern"        # Argument syntax: modern (1.x) | legacy (0.x)
//! dpi = 192.0              # Export resolution (default: renderer's own)
//! ```
//!
//! Sandboxed installs pass the launcher as part of the command:
//!
//! ```toml
//! [renderer]
//! command = ["flatpak", "run", "org.inkscape.Inkscape"]
//! ```

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};
use crate::render::{InkscapeRenderer, RendererSyntax};

/// Renderer settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Program and leading arguments.
    pub command: Vec<String>,

    /// Command-line dialect of the renderer.
    pub syntax: RendererSyntax,

    /// Export resolution in dots per inch.
    pub dpi: Option<f32>,
}

pub struct RendererFields {
    pub command: FieldPath,
    pub dpi: FieldPath,
}

impl RendererConfig {
    pub const FIELDS: RendererFields = RendererFields {
        command: FieldPath::new("renderer.command"),
        dpi: FieldPath::new("renderer.dpi"),
    };

    /// Build the renderer these settings describe.
    pub fn renderer(&self) -> InkscapeRenderer {
        InkscapeRenderer {
            command: self.command.clone(),
            syntax: self.syntax,
            dpi: self.dpi,
        }
    }

    /// Validate renderer configuration.
    ///
    /// # Checks
    /// - `command` is non-empty
    /// - `dpi`, when set, is a positive number
    /// - the program is installed (skipped with `check_installed = false`)
    pub fn validate(&self, check_installed: bool, diag: &mut ConfigDiagnostics) {
        if let Some(dpi) = self.dpi
            && !(dpi.is_finite() && dpi > 0.0)
        {
            diag.error(Self::FIELDS.dpi, format!("dpi must be positive, got {dpi}"));
        }

        let Some(program) = self.command.first().filter(|p| !p.trim().is_empty()) else {
            diag.error_with_hint(
                Self::FIELDS.command,
                "command must not be empty",
                format!("set {} = [\"inkscape\"]", Self::FIELDS.command),
            );
            return;
        };

        if check_installed && which::which(program).is_err() {
            diag.error_with_hint(
                Self::FIELDS.command,
                format!("`{program}` command not found"),
                format!(
                    "install Inkscape or point {} at it",
                    Self::FIELDS.command
                ),
            );
        }
    }
}

impl Default for RendererConfig {
    fn default() -> Self {
        let renderer = InkscapeRenderer::default();
        Self {
            command: renderer.command,
            syntax: renderer.syntax,
            dpi: renderer.dpi,
        }
    }
}
