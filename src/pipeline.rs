//! Slicing run.
//!
//! # Phases
//!
//! ```text
//! INIT ──clear──► CLEARED ──write──► WRITTEN ──export──► EXPORTED ──mark──► MARKED ──► DONE
//! ```
//!
//! - clear: every slice gets `opacity:0;stroke:none`, so no crop contains a slice
//! - write: the document is saved over the source, the renderer reads it from disk
//! - export: each slice is exported on its own; failures are collected
//! - mark: every slice gets `fill:#ff0000;opacity:.25`
//!
//! Slices are located again in every phase. Style passes are planned for all
//! slices before any is applied, so a malformed `style` stops the run with
//! the document untouched by that pass. Nothing is rolled back.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::SliceError;
use crate::export::{
    ExportAction, ExportOutcome, ExportPlan, ensure_directory, export_slice, plan_exports,
    slice_name,
};
use crate::observe::{Observer, SliceEvent};
use crate::render::{ExportRequest, Renderer};
use crate::style::{self, CLEAR, MARK};
use crate::svg::{Document, NodeId, find_layer, find_slices};

/// Label of the slice layer when none is configured.
pub const DEFAULT_LAYER: &str = "slices";

/// Position in the run; each value means that phase has completed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    #[default]
    Init,
    Cleared,
    Written,
    Exported,
    Marked,
    Done,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Init => "init",
            Self::Cleared => "cleared",
            Self::Written => "written",
            Self::Exported => "exported",
            Self::Marked => "marked",
            Self::Done => "done",
        })
    }
}

/// Inputs of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SliceOptions {
    /// SVG file the document was loaded from; rewritten before exporting.
    pub source: PathBuf,
    /// Existing directory receiving `<id>.png`.
    pub directory: PathBuf,
    /// `inkscape:label` of the slice layer.
    pub layer: String,
    /// Replace existing PNGs instead of skipping them.
    pub overwrite: bool,
    /// Write the marked document back to `source` at the end.
    pub save_marked: bool,
    /// Plan only: no style edits, no writes, no renderer calls.
    pub dry_run: bool,
}

impl SliceOptions {
    pub fn new(source: impl Into<PathBuf>, directory: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            directory: directory.into(),
            layer: DEFAULT_LAYER.to_owned(),
            overwrite: false,
            save_marked: false,
            dry_run: false,
        }
    }
}

/// A slice export that failed; the run went on with the other slices.
#[derive(Debug)]
pub struct SliceFailure {
    pub slice: String,
    pub error: SliceError,
}

/// What a run did.
#[derive(Debug, Default)]
pub struct RunReport {
    /// Last completed phase.
    pub phase: Phase,
    /// Slices found in the layer at export time.
    pub slices: usize,
    /// Written (or, in a dry run, to-be-written) PNGs.
    pub exported: Vec<PathBuf>,
    /// Existing PNGs left alone.
    pub skipped: Vec<PathBuf>,
    pub failures: Vec<SliceFailure>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// One-line summary: `3 exported, 1 skipped, 0 failed`.
    pub fn summary(&self) -> String {
        format!(
            "{} exported, {} skipped, {} failed",
            self.exported.len(),
            self.skipped.len(),
            self.failures.len()
        )
    }
}

/// New `style` value for one slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleEdit {
    pub node: NodeId,
    pub slice: String,
    pub style: String,
}

/// Compute the restyled `style` of every slice of `layer` without editing.
pub fn plan_style_pass(
    doc: &Document,
    layer: &str,
    overrides: &[(&str, &str)],
) -> Result<Vec<StyleEdit>, SliceError> {
    find_slices(doc, layer)
        .into_iter()
        .enumerate()
        .map(|(index, node)| {
            let slice = slice_name(doc, node, layer, index);
            match style::restyle(doc, node, overrides) {
                Ok(style) => Ok(StyleEdit { node, slice, style }),
                Err(error) => Err(SliceError::Style { slice, error }),
            }
        })
        .collect()
}

/// Write planned styles into the document.
pub fn apply_style_pass(doc: &mut Document, edits: &[StyleEdit], observer: &mut dyn Observer) {
    for edit in edits {
        doc.set_attribute(edit.node, "style", &edit.style);
        observer.notify(&SliceEvent::Styled {
            slice: edit.slice.clone(),
            style: edit.style.clone(),
        });
    }
}

/// Plan and apply one style pass.
fn style_pass(
    doc: &mut Document,
    layer: &str,
    overrides: &[(&str, &str)],
    observer: &mut dyn Observer,
) -> Result<(), SliceError> {
    let edits = plan_style_pass(doc, layer, overrides)?;
    apply_style_pass(doc, &edits, observer);
    Ok(())
}

/// Hide, export and mark the slices of `options.layer`.
///
/// Returns an error when the run halts: missing destination directory,
/// malformed style, or document I/O. Per-slice export failures do not halt
/// the run; they are listed in the report.
pub fn run(
    doc: &mut Document,
    options: &SliceOptions,
    renderer: &dyn Renderer,
    observer: &mut dyn Observer,
) -> Result<RunReport, SliceError> {
    let mut report = RunReport::default();
    ensure_directory(&options.directory)?;

    if find_layer(doc, &options.layer).is_none() {
        observer.notify(&SliceEvent::LayerMissing {
            layer: options.layer.clone(),
        });
    }

    if options.dry_run {
        export_pass(doc, options, renderer, observer, &mut report);
        return Ok(report);
    }

    style_pass(doc, &options.layer, CLEAR, observer)?;
    advance(&mut report, Phase::Cleared, observer);

    write_document(doc, &options.source, observer)?;
    advance(&mut report, Phase::Written, observer);

    export_pass(doc, options, renderer, observer, &mut report);
    advance(&mut report, Phase::Exported, observer);

    style_pass(doc, &options.layer, MARK, observer)?;
    advance(&mut report, Phase::Marked, observer);

    if options.save_marked {
        write_document(doc, &options.source, observer)?;
    }
    advance(&mut report, Phase::Done, observer);

    Ok(report)
}

fn advance(report: &mut RunReport, phase: Phase, observer: &mut dyn Observer) {
    report.phase = phase;
    observer.notify(&SliceEvent::Phase(phase));
}

fn write_document(
    doc: &Document,
    path: &Path,
    observer: &mut dyn Observer,
) -> Result<(), SliceError> {
    doc.write_to(path)?;
    observer.notify(&SliceEvent::DocumentWritten {
        path: path.to_path_buf(),
    });
    Ok(())
}

/// Export every slice independently, collecting failures.
///
/// In a dry run the plans are reported without calling the renderer.
fn export_pass(
    doc: &Document,
    options: &SliceOptions,
    renderer: &dyn Renderer,
    observer: &mut dyn Observer,
    report: &mut RunReport,
) {
    let plans = plan_exports(doc, &options.layer, &options.directory, options.overwrite);
    report.slices = plans.len();
    if !options.dry_run {
        observer.notify(&SliceEvent::Planned { total: plans.len() });
    }

    for plan in plans {
        let outcome = match plan {
            Ok(plan) if options.dry_run => Ok(preview_export(
                plan,
                &options.source,
                renderer,
                observer,
            )),
            Ok(plan) => export_slice(&plan, &options.source, renderer, observer),
            Err(error) => Err(error),
        };

        match outcome {
            Ok(ExportOutcome::Exported(path)) => report.exported.push(path),
            Ok(ExportOutcome::Skipped(path)) => report.skipped.push(path),
            Err(error) => {
                let slice = error.slice().unwrap_or_default();
                observer.notify(&SliceEvent::ExportFailed {
                    slice: slice.clone(),
                    message: error.to_string(),
                });
                report.failures.push(SliceFailure { slice, error });
            }
        }
    }
}

/// Report what `export_slice` would do, without rendering.
fn preview_export(
    plan: ExportPlan,
    source: &Path,
    renderer: &dyn Renderer,
    observer: &mut dyn Observer,
) -> ExportOutcome {
    match plan.action {
        ExportAction::Export => {
            let request = ExportRequest {
                object_id: &plan.slice,
                source,
                destination: &plan.destination,
            };
            observer.notify(&SliceEvent::Exporting {
                slice: plan.slice.clone(),
                command: renderer.describe(&request),
            });
            ExportOutcome::Exported(plan.destination)
        }
        ExportAction::Skip => {
            observer.notify(&SliceEvent::Skipped {
                slice: plan.slice,
                path: plan.destination.clone(),
            });
            ExportOutcome::Skipped(plan.destination)
        }
    }
}
