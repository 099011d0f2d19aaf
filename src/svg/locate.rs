//! Layer and slice lookup.
//!
//! A layer is a `<g>` directly under the document root whose
//! `inkscape:label` equals the requested name. Its slices are the `<rect>`
//! elements directly inside it. Shapes nested deeper, or in another
//! namespace, are not slices.

use super::{Document, INKSCAPE_NS, NodeId, SVG_NS};

/// First top-level group labelled `layer_name`.
pub fn find_layer(doc: &Document, layer_name: &str) -> Option<NodeId> {
    doc.children(doc.root()).iter().copied().find(|&node| {
        doc.is_element(node, SVG_NS, "g")
            && doc.attribute_ns(node, INKSCAPE_NS, "label").as_deref() == Some(layer_name)
    })
}

/// Slice rectangles of `layer_name`, in document order.
///
/// A missing layer yields an empty list.
pub fn find_slices(doc: &Document, layer_name: &str) -> Vec<NodeId> {
    let Some(layer) = find_layer(doc, layer_name) else {
        return Vec::new();
    };
    doc.children(layer)
        .iter()
        .copied()
        .filter(|&node| doc.is_element(node, SVG_NS, "rect"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(doc: &Document, nodes: &[NodeId]) -> Vec<String> {
        nodes
            .iter()
            .map(|&n| doc.attribute(n, "id").unwrap_or_default())
            .collect()
    }

    const LAYERS: &str = r#"<svg xmlns="http://www.w3.org/2000/svg"
     xmlns:inkscape="http://www.inkscape.org/namespaces/inkscape"
     xmlns:other="http://example.com/other">
  <g inkscape:label="artwork"><rect id="background"/></g>
  <g inkscape:label="slices">
    <rect id="header"/>
    <circle id="not-a-rect"/>
    <g><rect id="nested"/></g>
    <other:rect id="foreign"/>
    <rect id="footer"/>
  </g>
  <g inkscape:label="slices"><rect id="second-layer"/></g>
</svg>"#;

    #[test]
    fn test_finds_direct_rects_in_order() {
        let doc = Document::parse(LAYERS).unwrap();
        let slices = find_slices(&doc, "slices");
        assert_eq!(ids(&doc, &slices), ["header", "footer"]);
    }

    #[test]
    fn test_first_matching_layer_wins() {
        let doc = Document::parse(LAYERS).unwrap();
        let layer = find_layer(&doc, "slices").unwrap();
        assert_eq!(doc.children(layer).len(), 5);
    }

    #[test]
    fn test_missing_layer_is_empty() {
        let doc = Document::parse(LAYERS).unwrap();
        assert!(find_layer(&doc, "exports").is_none());
        assert!(find_slices(&doc, "exports").is_empty());
    }

    #[test]
    fn test_label_must_be_inkscape_namespaced() {
        let doc = Document::parse(
            r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:x="http://example.com/x">
  <g x:label="slices"><rect id="a"/></g>
  <g label="slices"><rect id="b"/></g>
</svg>"#,
        )
        .unwrap();
        assert!(find_slices(&doc, "slices").is_empty());
    }

    #[test]
    fn test_label_prefix_is_resolved_not_matched_literally() {
        let doc = Document::parse(
            r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:ink="http://www.inkscape.org/namespaces/inkscape">
  <g ink:label="slices"><rect id="a"/></g>
</svg>"#,
        )
        .unwrap();
        assert_eq!(ids(&doc, &find_slices(&doc, "slices")), ["a"]);
    }

    #[test]
    fn test_label_is_case_sensitive() {
        let doc = Document::parse(LAYERS).unwrap();
        assert!(find_slices(&doc, "Slices").is_empty());
    }
}
