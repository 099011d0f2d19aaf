//! Slicer - export the rectangles of an SVG layer as cropped PNG slices.
//!
//! A run over one document:
//!
//! 1. locates the group labelled `slices` (configurable) among the top-level
//!    children of `<svg>`, and the `<rect>` children inside it
//! 2. hides every slice (`opacity:0;stroke:none`) and writes the SVG back
//! 3. has an external renderer export each slice's area to `<id>.png`
//! 4. marks every slice translucent red (`fill:#ff0000;opacity:.25`)
//!
//! ```ignore
//! let mut doc = Document::load(&source)?;
//! let options = SliceOptions::new(&source, "/tmp/out");
//! let report = pipeline::run(&mut doc, &options, &InkscapeRenderer::default(), &mut Silent)?;
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod logger;
pub mod observe;
pub mod pipeline;
pub mod render;
pub mod style;
pub mod svg;
pub mod utils;

pub use error::SliceError;
pub use pipeline::{Phase, RunReport, SliceOptions, run};
pub use render::{InkscapeRenderer, Renderer};
pub use svg::Document;
