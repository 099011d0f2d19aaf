//! SVG document handling.
//!
//! # Modules
//!
//! - [`document`]: event-preserving XML tree with namespace resolution and
//!   in-place attribute edits; serializes back to disk
//! - [`locate`]: finds the slice rectangles of a labelled layer
//!
//! ```text
//! drawing.svg ──► Document::load ──► locate::find_slices ──► [NodeId]
//!                      ▲                                        │
//!                      └──────── set_attribute("style") ◄───────┘
//! ```

pub mod document;
pub mod locate;

pub use document::{Document, DocumentError, NodeId};
pub use locate::{find_layer, find_slices};

/// SVG namespace, used for `<g>` and `<rect>` matching.
pub const SVG_NS: &str = "http://www.w3.org/2000/svg";

/// Inkscape namespace, carrying the human-readable `label` of layers.
pub const INKSCAPE_NS: &str = "http://www.inkscape.org/namespaces/inkscape";

/// Namespace implicitly bound to the `xml` prefix.
pub const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";
