//! Run observers.
//!
//! A run reports what it does through an [`Observer`] passed in by the
//! caller, so every run owns its own log destinations:
//!
//! - [`TerminalObserver`]: `log!`/`debug!` lines and an export progress line
//! - [`FileObserver`]: append-only debug log, one line per event
//! - [`Recorder`]: keeps events in memory
//! - [`Fanout`]: forwards to several observers

use std::{
    fmt,
    fs::{File, OpenOptions},
    io::{self, Write},
    path::{Path, PathBuf},
};

use crate::logger::ProgressLine;
use crate::pipeline::Phase;
use crate::{debug, log};

/// Something a run did or decided.
#[derive(Debug, Clone, PartialEq)]
pub enum SliceEvent {
    /// A phase completed.
    Phase(Phase),
    /// No top-level group carries the requested label.
    LayerMissing { layer: String },
    /// A slice's `style` attribute was rewritten.
    Styled { slice: String, style: String },
    /// The document was serialized to disk.
    DocumentWritten { path: PathBuf },
    /// The export pass is about to start.
    Planned { total: usize },
    /// The renderer is invoked (or would be, in a dry run).
    Exporting { slice: String, command: String },
    Exported { slice: String, path: PathBuf },
    /// Destination exists and overwriting is disabled.
    Skipped { slice: String, path: PathBuf },
    ExportFailed { slice: String, message: String },
}

impl fmt::Display for SliceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Phase(phase) => write!(f, "PHASE {phase}"),
            Self::LayerMissing { layer } => write!(f, "LAYER `{layer}` not found"),
            Self::Styled { slice, style } => write!(f, "STYLE {slice}: {style}"),
            Self::DocumentWritten { path } => write!(f, "WRITE {}", path.display()),
            Self::Planned { total } => write!(f, "PLAN {total} slice(s)"),
            Self::Exporting { command, .. } => write!(f, "COMMAND {command}"),
            Self::Exported { path, .. } => write!(f, "EXPORTED {}", path.display()),
            Self::Skipped { path, .. } => {
                write!(f, "Export exists ({}) not overwriting", path.display())
            }
            Self::ExportFailed { slice, message } => write!(f, "FAILED {slice}: {message}"),
        }
    }
}

/// Receives the events of one run.
pub trait Observer {
    fn notify(&mut self, event: &SliceEvent);
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct Silent;

impl Observer for Silent {
    fn notify(&mut self, _event: &SliceEvent) {}
}

/// Keeps every event in memory.
#[derive(Debug, Default, Clone)]
pub struct Recorder {
    pub events: Vec<SliceEvent>,
}

impl Observer for Recorder {
    fn notify(&mut self, event: &SliceEvent) {
        self.events.push(event.clone());
    }
}

/// Forwards every event to each observer in turn.
#[derive(Default)]
pub struct Fanout {
    observers: Vec<Box<dyn Observer>>,
}

impl Fanout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, observer: impl Observer + 'static) -> Self {
        self.observers.push(Box::new(observer));
        self
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

impl Observer for Fanout {
    fn notify(&mut self, event: &SliceEvent) {
        for observer in &mut self.observers {
            observer.notify(event);
        }
    }
}

// ============================================================================
// Terminal
// ============================================================================

/// Reports to the terminal through the logger.
///
/// Per-slice details are `debug!` only; with `--verbose` off the export pass
/// shows as a single progress line.
#[derive(Default)]
pub struct TerminalObserver {
    progress: Option<ProgressLine>,
}

impl TerminalObserver {
    pub fn new() -> Self {
        Self::default()
    }

    fn tick(&self) {
        if let Some(progress) = &self.progress {
            progress.inc();
        }
    }
}

impl Observer for TerminalObserver {
    fn notify(&mut self, event: &SliceEvent) {
        match event {
            SliceEvent::Phase(phase) => {
                if *phase == Phase::Exported
                    && let Some(progress) = self.progress.take()
                {
                    progress.finish();
                }
                debug!("phase"; "{}", phase);
            }
            SliceEvent::LayerMissing { layer } => {
                log!("slice"; "no layer labelled `{}`, nothing to export", layer);
            }
            SliceEvent::Styled { slice, style } => debug!("style"; "{}: {}", slice, style),
            SliceEvent::DocumentWritten { path } => debug!("write"; "{}", path.display()),
            SliceEvent::Planned { total } => {
                if *total > 0 && !crate::logger::is_verbose() {
                    self.progress = Some(ProgressLine::new("export", *total));
                }
            }
            SliceEvent::Exporting { command, .. } => debug!("command"; "{}", command),
            SliceEvent::Exported { path, .. } => {
                self.tick();
                debug!("export"; "{}", path.display());
            }
            SliceEvent::Skipped { path, .. } => {
                self.tick();
                debug!("skip"; "{} exists, not overwriting", path.display());
            }
            SliceEvent::ExportFailed { slice, message } => {
                self.tick();
                log!("error"; "{}: {}", slice, message);
            }
        }
    }
}

// ============================================================================
// File
// ============================================================================

/// Append-only debug log.
#[derive(Debug)]
pub struct FileObserver {
    path: PathBuf,
    file: File,
}

impl FileObserver {
    /// Open `path` for appending, creating it if needed.
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Observer for FileObserver {
    fn notify(&mut self, event: &SliceEvent) {
        // a broken log must not break the run
        writeln!(self.file, "DEBUG:slicer:{event}").ok();
    }
}
