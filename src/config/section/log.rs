//! `[log]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [log]
//! enable = true                 # Append run events to a debug log file
//! file = "~/.cache/slicer.log"  # Default: <temp dir>/slicer.log
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// File name of the debug log inside the temp directory.
pub const DEFAULT_LOG_NAME: &str = "slicer.log";

/// Debug log settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub enable: bool,
    pub file: Option<PathBuf>,
}

impl LogConfig {
    /// Log file to append to, `None` when disabled.
    pub fn path(&self) -> Option<PathBuf> {
        self.enable.then(|| {
            self.file
                .clone()
                .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_LOG_NAME))
        })
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            enable: true,
            file: None,
        }
    }
}
