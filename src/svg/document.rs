//! Event-preserving XML document.
//!
//! The source is kept as the full `quick-xml` event stream, so writing the
//! document back reproduces every untouched byte (comments, whitespace,
//! processing instructions, entity references). Start tags are indexed as a
//! tree of [`NodeId`]s with their namespace scope, which is all the slicer
//! needs: find a labelled group, walk its children, rewrite one attribute.
//!
//! Internal `<!ENTITY name "value">` declarations of the DOCTYPE are resolved
//! in attribute values, so `xmlns="&ns_svg;"` binds the SVG namespace.

use quick_xml::{
    Reader, Writer,
    escape::{escape, resolve_predefined_entity, unescape_with},
    events::{BytesStart, Event},
};
use regex::Regex;
use std::{
    fs,
    path::{Path, PathBuf},
    sync::OnceLock,
};
use thiserror::Error;

use super::XML_NS;

/// Errors raised while reading, editing or writing a document.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("IO error on `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("XML parse error at position {position}: {message}")]
    Xml { position: u64, message: String },

    #[error("malformed attribute in <{element}>: {message}")]
    Attribute { element: String, message: String },

    #[error("document has no root element")]
    NoRootElement,

    #[error("`{path}` is not UTF-8 (declared encoding: {declared}); re-save it as UTF-8")]
    Encoding { path: PathBuf, declared: String },

    #[error("failed to serialize document: {0}")]
    Serialize(String),
}

/// Handle to an element of a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug)]
struct Node {
    /// Index of the `Start`/`Empty` event in `Document::events`.
    event: usize,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    /// Innermost namespace scope in effect for this element.
    scope: usize,
}

/// Namespace bindings declared on one element; `None` is the default namespace.
#[derive(Debug)]
struct Scope {
    parent: Option<usize>,
    bindings: Vec<(Option<String>, String)>,
}

/// In-memory SVG/XML document.
#[derive(Debug)]
pub struct Document {
    events: Vec<Event<'static>>,
    nodes: Vec<Node>,
    scopes: Vec<Scope>,
    /// Internal general entities declared in the DOCTYPE.
    entities: Vec<(String, String)>,
}

impl Document {
    /// Parse a document from text.
    pub fn parse(text: &str) -> Result<Self, DocumentError> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let mut reader = Reader::from_str(text);

        let mut doc = Self {
            events: Vec::new(),
            nodes: Vec::new(),
            scopes: vec![Scope {
                parent: None,
                bindings: vec![(Some("xml".to_owned()), XML_NS.to_owned())],
            }],
            entities: Vec::new(),
        };
        let mut open: Vec<NodeId> = Vec::new();

        loop {
            let event = reader.read_event().map_err(|e| DocumentError::Xml {
                position: reader.error_position() as u64,
                message: e.to_string(),
            })?;

            match &event {
                Event::Eof => break,
                Event::DocType(doctype) => {
                    doc.entities
                        .extend(internal_entities(&String::from_utf8_lossy(doctype)));
                }
                Event::Start(start) => {
                    let id = doc.push_node(start, open.last().copied())?;
                    open.push(id);
                }
                Event::Empty(start) => {
                    doc.push_node(start, open.last().copied())?;
                }
                Event::End(_) => {
                    open.pop();
                }
                _ => {}
            }
            doc.events.push(event.into_owned());
        }

        if let Some(id) = open.last() {
            return Err(DocumentError::Xml {
                position: reader.buffer_position() as u64,
                message: format!("unclosed element <{}>", doc.name(*id)),
            });
        }
        if doc.nodes.is_empty() {
            return Err(DocumentError::NoRootElement);
        }

        Ok(doc)
    }

    /// Read and parse the document at `path`. Only UTF-8 files are accepted.
    pub fn load(path: &Path) -> Result<Self, DocumentError> {
        let bytes = fs::read(path).map_err(|err| DocumentError::Io(path.to_path_buf(), err))?;
        let text = match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(err) => {
                return Err(DocumentError::Encoding {
                    path: path.to_path_buf(),
                    declared: declared_encoding(err.as_bytes())
                        .unwrap_or_else(|| "none".to_owned()),
                });
            }
        };
        Self::parse(&text)
    }

    /// Serialize the document, untouched events byte-for-byte.
    pub fn to_bytes(&self) -> Result<Vec<u8>, DocumentError> {
        let mut writer = Writer::new(Vec::new());
        for event in &self.events {
            writer
                .write_event(event.borrow())
                .map_err(|e| DocumentError::Serialize(e.to_string()))?;
        }
        Ok(writer.into_inner())
    }

    /// Serialize the document to a `String`.
    pub fn serialize(&self) -> Result<String, DocumentError> {
        let bytes = self.to_bytes()?;
        String::from_utf8(bytes).map_err(|e| DocumentError::Serialize(e.to_string()))
    }

    /// Write the document to `path`, replacing any existing file. No backup is kept.
    pub fn write_to(&self, path: &Path) -> Result<(), DocumentError> {
        let bytes = self.to_bytes()?;
        fs::write(path, bytes).map_err(|err| DocumentError::Io(path.to_path_buf(), err))
    }

    // ========================================================================
    // tree navigation
    // ========================================================================

    /// The document element.
    pub fn root(&self) -> NodeId {
        // `parse` rejects documents without elements; the first element is the root.
        NodeId(0)
    }

    /// Direct child elements of `id`, in document order.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    /// Qualified tag name as written in the source (e.g. `svg:rect`).
    pub fn name(&self, id: NodeId) -> String {
        String::from_utf8_lossy(self.start(id).name().as_ref()).into_owned()
    }

    /// Check whether `id` is the element `{ns}local`.
    pub fn is_element(&self, id: NodeId, ns: &str, local: &str) -> bool {
        let start = self.start(id);
        let qname = start.name();
        let (prefix, name) = split_qname(qname.as_ref());
        name == local.as_bytes() && self.resolve(self.nodes[id.0].scope, prefix) == Some(ns)
    }

    // ========================================================================
    // attributes
    // ========================================================================

    /// Value of the attribute written exactly as `name` (e.g. `id`, `style`).
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<String> {
        self.start(id)
            .attributes()
            .flatten()
            .find(|attr| attr.key.as_ref() == name.as_bytes())
            .and_then(|attr| self.decode_value(&attr.value).ok())
    }

    /// Value of the attribute `{ns}local`; only prefixed attributes carry a namespace.
    pub fn attribute_ns(&self, id: NodeId, ns: &str, local: &str) -> Option<String> {
        let scope = self.nodes[id.0].scope;
        self.start(id)
            .attributes()
            .flatten()
            .find(|attr| match split_qname(attr.key.as_ref()) {
                (Some(prefix), name) => {
                    name == local.as_bytes() && self.resolve(scope, Some(prefix)) == Some(ns)
                }
                (None, _) => false,
            })
            .and_then(|attr| self.decode_value(&attr.value).ok())
    }

    /// Set attribute `name` to `value`, replacing it in place or appending it.
    ///
    /// Other attributes keep their raw (already escaped) text and order.
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) {
        let escaped = escape(value);
        let mut replaced = false;
        let attributes: Vec<(Vec<u8>, Vec<u8>)> = self
            .start(id)
            .attributes()
            .flatten()
            .map(|attr| {
                let key = attr.key.as_ref().to_vec();
                if key == name.as_bytes() {
                    replaced = true;
                    (key, escaped.as_bytes().to_vec())
                } else {
                    // single-quoted in the source; quote for the double quotes we write
                    (key, quote_safe(&attr.value))
                }
            })
            .collect();

        let event = self.nodes[id.0].event;
        let start = match &mut self.events[event] {
            Event::Start(start) | Event::Empty(start) => start,
            _ => unreachable!("node points at a start tag"),
        };
        start.clear_attributes();
        for (key, value) in &attributes {
            start.push_attribute((key.as_slice(), value.as_slice()));
        }
        if !replaced {
            start.push_attribute((name.as_bytes(), escaped.as_bytes()));
        }
    }

    // ========================================================================
    // internals
    // ========================================================================

    fn start(&self, id: NodeId) -> &BytesStart<'static> {
        match &self.events[self.nodes[id.0].event] {
            Event::Start(start) | Event::Empty(start) => start,
            _ => unreachable!("node points at a start tag"),
        }
    }

    /// Register an element, its namespace declarations and its place in the tree.
    ///
    /// Every attribute is decoded once here so later lookups cannot fail.
    fn push_node(
        &mut self,
        start: &BytesStart<'_>,
        parent: Option<NodeId>,
    ) -> Result<NodeId, DocumentError> {
        let element = || String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let mut bindings = Vec::new();

        for attr in start.attributes() {
            let attr = attr.map_err(|e| DocumentError::Attribute {
                element: element(),
                message: e.to_string(),
            })?;
            let value = self.decode_value(&attr.value).map_err(|message| DocumentError::Attribute {
                element: element(),
                message,
            })?;

            let key = attr.key.as_ref();
            if key == b"xmlns" {
                bindings.push((None, value));
            } else if let Some(prefix) = key.strip_prefix(b"xmlns:") {
                bindings.push((Some(String::from_utf8_lossy(prefix).into_owned()), value));
            }
        }

        let parent_scope = parent.map_or(0, |p| self.nodes[p.0].scope);
        let scope = if bindings.is_empty() {
            parent_scope
        } else {
            self.scopes.push(Scope {
                parent: Some(parent_scope),
                bindings,
            });
            self.scopes.len() - 1
        };

        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            event: self.events.len(),
            parent,
            children: Vec::new(),
            scope,
        });
        if let Some(parent) = parent {
            self.nodes[parent.0].children.push(id);
        }
        Ok(id)
    }

    /// Decode a raw attribute value: UTF-8, then predefined and DOCTYPE entities.
    fn decode_value(&self, raw: &[u8]) -> Result<String, String> {
        let text = std::str::from_utf8(raw).map_err(|e| e.to_string())?;
        unescape_with(text, |name| {
            self.entities
                .iter()
                .find(|(entity, _)| entity == name)
                .map(|(_, value)| value.as_str())
                .or_else(|| resolve_predefined_entity(name))
        })
        .map(|v| v.into_owned())
        .map_err(|e| e.to_string())
    }

    /// Namespace URI bound to `prefix` (or the default namespace) in `scope`.
    fn resolve(&self, scope: usize, prefix: Option<&[u8]>) -> Option<&str> {
        let prefix = match prefix {
            Some(p) => Some(std::str::from_utf8(p).ok()?),
            None => None,
        };
        let mut current = Some(scope);
        while let Some(index) = current {
            let scope = &self.scopes[index];
            if let Some((_, uri)) = scope
                .bindings
                .iter()
                .rev()
                .find(|(bound, _)| bound.as_deref() == prefix)
            {
                // `xmlns=""` undeclares the default namespace
                return (!uri.is_empty()).then_some(uri.as_str());
            }
            current = scope.parent;
        }
        None
    }
}

/// Split `prefix:local` into its parts.
fn split_qname(name: &[u8]) -> (Option<&[u8]>, &[u8]) {
    match name.iter().position(|&b| b == b':') {
        Some(i) => (Some(&name[..i]), &name[i + 1..]),
        None => (None, name),
    }
}

/// Raw attribute text with literal `"` replaced by `&quot;`.
fn quote_safe(raw: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(raw.len());
    for &b in raw {
        if b == b'"' {
            out.extend_from_slice(b"&quot;");
        } else {
            out.push(b);
        }
    }
    out
}

/// `<!ENTITY name "value">` declarations of a DOCTYPE internal subset.
///
/// Parameter and external entities are ignored.
fn internal_entities(doctype: &str) -> Vec<(String, String)> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r#"<!ENTITY[ \t\r\n]+([^ \t\r\n%"'>]+)[ \t\r\n]+(?:"([^"]*)"|'([^']*)')[ \t\r\n]*>"#)
            .expect("valid entity regex")
    });
    re.captures_iter(doctype)
        .map(|caps| {
            let value = caps.get(2).or_else(|| caps.get(3)).map_or("", |m| m.as_str());
            (caps[1].to_owned(), value.to_owned())
        })
        .collect()
}

/// `encoding` pseudo-attribute of the XML declaration, if any.
fn declared_encoding(bytes: &[u8]) -> Option<String> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r#"^[ \t\r\n]*<\?xml[^>]*[ \t\r\n]encoding[ \t\r\n]*=[ \t\r\n]*["']([^"']+)["']"#)
            .expect("valid declaration regex")
    });
    let head = String::from_utf8_lossy(&bytes[..bytes.len().min(256)]);
    re.captures(&head).map(|caps| caps[1].to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::svg::{INKSCAPE_NS, SVG_NS};
    use tempfile::TempDir;

    const DRAWING: &str = r##"<?xml version="1.0" encoding="UTF-8" standalone="no"?>
<!-- Created with Inkscape -->
<svg xmlns="http://www.w3.org/2000/svg"
   xmlns:inkscape="http://www.inkscape.org/namespaces/inkscape"
   width="1024" height="768">
  <g inkscape:label="slices" inkscape:groupmode="layer" id="layer2">
    <rect id="logo" x="10" y="10" width="100" height="50" style="fill:#eeeeec;stroke:#000000"/>
  </g>
  <text>Fish &amp; Chips</text>
</svg>
"##;

    #[test]
    fn test_roundtrip_is_byte_identical() {
        let doc = Document::parse(DRAWING).unwrap();
        assert_eq!(doc.serialize().unwrap(), DRAWING);
    }

    #[test]
    fn test_tree_structure() {
        let doc = Document::parse(DRAWING).unwrap();
        let root = doc.root();
        assert!(doc.is_element(root, SVG_NS, "svg"));
        assert_eq!(doc.children(root).len(), 2);

        let layer = doc.children(root)[0];
        assert!(doc.is_element(layer, SVG_NS, "g"));
        assert_eq!(doc.parent(layer), Some(root));

        let rect = doc.children(layer)[0];
        assert!(doc.is_element(rect, SVG_NS, "rect"));
        assert_eq!(doc.attribute(rect, "id").as_deref(), Some("logo"));
    }

    #[test]
    fn test_namespaced_attribute() {
        let doc = Document::parse(DRAWING).unwrap();
        let layer = doc.children(doc.root())[0];
        assert_eq!(
            doc.attribute_ns(layer, INKSCAPE_NS, "label").as_deref(),
            Some("slices")
        );
        // unprefixed `id` has no namespace
        assert_eq!(doc.attribute_ns(layer, INKSCAPE_NS, "id"), None);
        assert_eq!(doc.attribute(layer, "inkscape:label").as_deref(), Some("slices"));
    }

    #[test]
    fn test_prefixed_elements_resolve() {
        let doc = Document::parse(
            r#"<svg:svg xmlns:svg="http://www.w3.org/2000/svg"><svg:rect id="a"/><rect id="b"/></svg:svg>"#,
        )
        .unwrap();
        let root = doc.root();
        assert!(doc.is_element(root, SVG_NS, "svg"));
        let children = doc.children(root);
        assert!(doc.is_element(children[0], SVG_NS, "rect"));
        // no default namespace declared: plain `rect` is not an SVG element
        assert!(!doc.is_element(children[1], SVG_NS, "rect"));
    }

    #[test]
    fn test_set_attribute_replaces_in_place() {
        let mut doc = Document::parse(r#"<svg><rect id="a" style="fill:red" x="1"/></svg>"#).unwrap();
        let rect = doc.children(doc.root())[0];
        doc.set_attribute(rect, "style", "fill:blue");
        assert_eq!(
            doc.serialize().unwrap(),
            r#"<svg><rect id="a" style="fill:blue" x="1"/></svg>"#
        );
    }

    #[test]
    fn test_set_attribute_appends_and_escapes() {
        let mut doc = Document::parse(r#"<svg><rect id="a"></rect></svg>"#).unwrap();
        let rect = doc.children(doc.root())[0];
        doc.set_attribute(rect, "style", "font-family:\"A&B\"");
        assert_eq!(
            doc.attribute(rect, "style").as_deref(),
            Some("font-family:\"A&B\"")
        );
        assert!(doc.serialize().unwrap().contains("&amp;"));
    }

    #[test]
    fn test_entities_in_attributes_decode() {
        let doc = Document::parse(r#"<svg><rect id="a&amp;b"/></svg>"#).unwrap();
        let rect = doc.children(doc.root())[0];
        assert_eq!(doc.attribute(rect, "id").as_deref(), Some("a&b"));
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            Document::parse("<!-- nothing -->"),
            Err(DocumentError::NoRootElement)
        ));
        assert!(matches!(
            Document::parse("<svg><g></svg>"),
            Err(DocumentError::Xml { .. })
        ));
        assert!(matches!(
            Document::parse("<svg><g>"),
            Err(DocumentError::Xml { .. })
        ));
    }

    #[test]
    fn test_write_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("drawing.svg");
        std::fs::write(&path, "stale contents that are longer than the document").unwrap();

        let doc = Document::parse(DRAWING).unwrap();
        doc.write_to(&path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), DRAWING);

        let loaded = Document::load(&path).unwrap();
        assert_eq!(loaded.serialize().unwrap(), DRAWING);
    }

    const ENTITY_DRAWING: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<!DOCTYPE svg PUBLIC "-//W3C//DTD SVG 1.1//EN" "http://www.w3.org/Graphics/SVG/1.1/DTD/svg11.dtd" [
	<!ENTITY ns_svg "http://www.w3.org/2000/svg">
	<!ENTITY ns_ink 'http://www.inkscape.org/namespaces/inkscape'>
	<!ENTITY % local SYSTEM "local.dtd">
]>
<svg xmlns="&ns_svg;" xmlns:inkscape="&ns_ink;">
  <g inkscape:label="slices"><rect id="logo&amp;co" style='font-family:"Sans"'/></g>
</svg>
"#;

    #[test]
    fn test_doctype_entities_resolve_in_attributes() {
        let doc = Document::parse(ENTITY_DRAWING).unwrap();
        let root = doc.root();
        assert!(doc.is_element(root, SVG_NS, "svg"));

        let layer = doc.children(root)[0];
        assert_eq!(
            doc.attribute_ns(layer, INKSCAPE_NS, "label").as_deref(),
            Some("slices")
        );
        assert_eq!(doc.attribute(root, "xmlns").as_deref(), Some(SVG_NS));

        let rect = doc.children(layer)[0];
        assert_eq!(doc.attribute(rect, "id").as_deref(), Some("logo&co"));
        assert_eq!(doc.serialize().unwrap(), ENTITY_DRAWING);
    }

    #[test]
    fn test_undeclared_entity_is_rejected() {
        let err = Document::parse(r#"<svg xmlns="&ns_svg;"/>"#).unwrap_err();
        assert!(matches!(err, DocumentError::Attribute { .. }));
    }

    #[test]
    fn test_set_attribute_keeps_entities_and_single_quotes() {
        let mut doc = Document::parse(ENTITY_DRAWING).unwrap();
        let layer = doc.children(doc.root())[0];
        let rect = doc.children(layer)[0];
        doc.set_attribute(rect, "style", "opacity:0");

        let text = doc.serialize().unwrap();
        assert!(text.contains(r#"<svg xmlns="&ns_svg;" xmlns:inkscape="&ns_ink;">"#));
        assert!(text.contains(r#"<rect id="logo&amp;co" style="opacity:0"/>"#));

        let reparsed = Document::parse(&text).unwrap();
        let rect = reparsed.children(reparsed.children(reparsed.root())[0])[0];
        assert_eq!(reparsed.attribute(rect, "style").as_deref(), Some("opacity:0"));
    }

    #[test]
    fn test_single_quoted_value_is_requoted() {
        let mut doc = Document::parse(r#"<svg><text font='a"b' x="1"/></svg>"#).unwrap();
        let text = doc.children(doc.root())[0];
        doc.set_attribute(text, "x", "2");
        assert_eq!(
            doc.serialize().unwrap(),
            r#"<svg><text font="a&quot;b" x="2"/></svg>"#
        );
        assert_eq!(doc.attribute(text, "font").as_deref(), Some("a\"b"));
    }

    #[test]
    fn test_load_non_utf8_names_encoding() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("latin1.svg");
        let mut bytes = br#"<?xml version="1.0" encoding="ISO-8859-1"?><svg><title>caf"#.to_vec();
        bytes.push(0xE9);
        bytes.extend_from_slice(b"</title></svg>");
        std::fs::write(&path, bytes).unwrap();

        let err = Document::load(&path).unwrap_err();
        assert!(
            matches!(&err, DocumentError::Encoding { declared, .. } if declared == "ISO-8859-1")
        );
        assert!(err.to_string().contains("UTF-8"));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = Document::load(&dir.path().join("missing.svg")).unwrap_err();
        assert!(matches!(err, DocumentError::Io(..)));
    }
}
