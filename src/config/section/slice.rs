//! `[slice]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [slice]
//! directory = "~/exports"   # Existing directory receiving <id>.png
//! layer = "slices"          # inkscape:label of the slice layer
//! overwrite = false         # Replace existing PNGs
//! save_marked = false       # Write the marked document back to the SVG
//! ```
//!
//! A relative `directory` is resolved against the directory of `slicer.toml`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::config::{ConfigDiagnostics, FieldPath};
use crate::pipeline::DEFAULT_LAYER;

/// Slicing settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SliceConfig {
    /// Destination directory. Must exist when the run starts.
    pub directory: PathBuf,

    /// Label of the top-level group holding the slice rectangles.
    pub layer: String,

    /// Replace existing PNGs instead of skipping them.
    pub overwrite: bool,

    /// Write the marked document back to the source SVG.
    pub save_marked: bool,
}

pub struct SliceFields {
    pub directory: FieldPath,
    pub layer: FieldPath,
}

impl SliceConfig {
    pub const FIELDS: SliceFields = SliceFields {
        directory: FieldPath::new("slice.directory"),
        layer: FieldPath::new("slice.layer"),
    };

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.layer.trim().is_empty() {
            diag.error(Self::FIELDS.layer, "layer label must not be empty");
        }
        if self.directory.as_os_str().is_empty() {
            diag.error_with_hint(
                Self::FIELDS.directory,
                "directory must not be empty",
                "use \".\" for the directory of slicer.toml",
            );
        }
    }
}

impl Default for SliceConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("~"),
            layer: DEFAULT_LAYER.to_owned(),
            overwrite: false,
            save_marked: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;

    #[test]
    fn test_slice_config() {
        let config = test_parse_config(
            "[slice]\ndirectory = \"out\"\nlayer = \"exports\"\noverwrite = true\nsave_marked = true",
        );
        assert_eq!(config.slice.directory, PathBuf::from("out"));
        assert_eq!(config.slice.layer, "exports");
        assert!(config.slice.overwrite);
        assert!(config.slice.save_marked);
    }

    #[test]
    fn test_slice_config_defaults() {
        let config = test_parse_config("");
        assert_eq!(config.slice.directory, PathBuf::from("~"));
        assert_eq!(config.slice.layer, "slices");
        assert!(!config.slice.overwrite);
        assert!(!config.slice.save_marked);
    }

    #[test]
    fn test_empty_layer_is_error() {
        let config = test_parse_config("[slice]\nlayer = \" \"");
        let mut diag = ConfigDiagnostics::new();
        config.slice.validate(&mut diag);
        assert_eq!(diag.len(), 1);
        assert_eq!(diag.errors()[0].field, SliceConfig::FIELDS.layer);
    }
}
