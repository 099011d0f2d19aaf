//! Export driver.
//!
//! Every slice is exported to `<directory>/<id>.png`. Planning (destination
//! and overwrite decision) is side-effect free; [`export_slice`] then carries
//! out one plan through a [`Renderer`].

use std::path::{Path, PathBuf};

use crate::error::{SliceError, unnamed_slice};
use crate::observe::{Observer, SliceEvent};
use crate::render::{ExportRequest, Renderer};
use crate::svg::{Document, NodeId, find_slices};

/// What the export pass will do with one slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportAction {
    Export,
    /// Destination exists and overwriting is disabled.
    Skip,
}

/// Planned export of one slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportPlan {
    pub node: NodeId,
    /// Element id, passed to the renderer.
    pub slice: String,
    pub destination: PathBuf,
    pub action: ExportAction,
}

/// Result of carrying out a plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    Exported(PathBuf),
    Skipped(PathBuf),
}

/// `<directory>/<id>.png`
pub fn destination_for(directory: &Path, id: &str) -> PathBuf {
    directory.join(format!("{id}.png"))
}

/// Fail unless `directory` exists and is a directory.
pub fn ensure_directory(directory: &Path) -> Result<(), SliceError> {
    if directory.is_dir() {
        Ok(())
    } else {
        Err(SliceError::Destination(directory.to_path_buf()))
    }
}

/// Plan the export of the `index`-th slice of `layer`.
pub fn plan_export(
    doc: &Document,
    node: NodeId,
    index: usize,
    layer: &str,
    directory: &Path,
    overwrite: bool,
) -> Result<ExportPlan, SliceError> {
    let slice = doc
        .attribute(node, "id")
        .filter(|id| !id.is_empty())
        .ok_or_else(|| SliceError::MissingId {
            layer: layer.to_owned(),
            index,
        })?;
    if slice.contains(['/', '\\']) || slice == "." || slice == ".." {
        return Err(SliceError::InvalidId(slice));
    }

    let destination = destination_for(directory, &slice);
    let action = if overwrite || !destination.exists() {
        ExportAction::Export
    } else {
        ExportAction::Skip
    };

    Ok(ExportPlan {
        node,
        slice,
        destination,
        action,
    })
}

/// Plan every slice of `layer`, in document order.
pub fn plan_exports(
    doc: &Document,
    layer: &str,
    directory: &Path,
    overwrite: bool,
) -> Vec<Result<ExportPlan, SliceError>> {
    find_slices(doc, layer)
        .into_iter()
        .enumerate()
        .map(|(index, node)| plan_export(doc, node, index, layer, directory, overwrite))
        .collect()
}

/// Carry out `plan`: skip, or have `renderer` export from `source`.
///
/// `source` must already contain the hidden slices on disk.
pub fn export_slice(
    plan: &ExportPlan,
    source: &Path,
    renderer: &dyn Renderer,
    observer: &mut dyn Observer,
) -> Result<ExportOutcome, SliceError> {
    if plan.action == ExportAction::Skip {
        observer.notify(&SliceEvent::Skipped {
            slice: plan.slice.clone(),
            path: plan.destination.clone(),
        });
        return Ok(ExportOutcome::Skipped(plan.destination.clone()));
    }

    let request = ExportRequest {
        object_id: &plan.slice,
        source,
        destination: &plan.destination,
    };
    observer.notify(&SliceEvent::Exporting {
        slice: plan.slice.clone(),
        command: renderer.describe(&request),
    });

    renderer
        .render(&request)
        .map_err(|error| SliceError::Render {
            slice: plan.slice.clone(),
            error,
        })?;

    observer.notify(&SliceEvent::Exported {
        slice: plan.slice.clone(),
        path: plan.destination.clone(),
    });
    Ok(ExportOutcome::Exported(plan.destination.clone()))
}

/// Display name of a slice node: its id, or `layer[index]` without one.
pub fn slice_name(doc: &Document, node: NodeId, layer: &str, index: usize) -> String {
    doc.attribute(node, "id")
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| unnamed_slice(layer, index))
}
