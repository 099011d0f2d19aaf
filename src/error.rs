//! Error kinds of a slicing run.
//!
//! | Kind               | Variant                                  | Effect                     |
//! |--------------------|------------------------------------------|----------------------------|
//! | style parse error  | [`SliceError::Style`]                    | halts the run              |
//! | filesystem error   | [`SliceError::Document`], [`SliceError::Destination`] | halts the run |
//! | bad slice id       | [`SliceError::MissingId`], [`SliceError::InvalidId`] | collected per slice |
//! | external tool      | [`SliceError::Render`]                   | collected per slice        |
//!
//! A missing layer is not an error: it yields zero slices.

use std::path::PathBuf;
use thiserror::Error;

use crate::render::RenderError;
use crate::style::StyleParseError;
use crate::svg::DocumentError;

#[derive(Debug, Error)]
pub enum SliceError {
    #[error(transparent)]
    Document(#[from] DocumentError),

    // NOTE: inner errors are rendered in the message, not exposed as source(),
    // so chained display does not print them twice
    #[error("invalid style on slice `{slice}`: {error}")]
    Style {
        slice: String,
        error: StyleParseError,
    },

    #[error("destination `{0}` is not an existing directory")]
    Destination(PathBuf),

    #[error("rectangle {index} of layer `{layer}` has no id")]
    MissingId { layer: String, index: usize },

    #[error("slice id `{0}` cannot be used as a file name")]
    InvalidId(String),

    #[error("export of slice `{slice}` failed: {error}")]
    Render { slice: String, error: RenderError },
}

impl SliceError {
    /// Name of the slice the error belongs to, if any.
    pub fn slice(&self) -> Option<String> {
        match self {
            Self::Style { slice, .. } | Self::Render { slice, .. } => Some(slice.clone()),
            Self::InvalidId(id) => Some(id.clone()),
            Self::MissingId { layer, index } => Some(unnamed_slice(layer, *index)),
            Self::Document(_) | Self::Destination(_) => None,
        }
    }
}

/// Display name for a rectangle without `id`: `slices[2]`.
pub fn unnamed_slice(layer: &str, index: usize) -> String {
    format!("{layer}[{index}]")
}
