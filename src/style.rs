//! Inline `style` attribute editing.
//!
//! SVG overloads `style` with a flat map: `opacity:0;fill:#eeeeec;stroke:none`.
//! [`StyleMap`] is the parsed view of that string; it is rebuilt from the
//! attribute for every edit and flattened straight back, so the document
//! stays the only source of truth.
//!
//! Applying an override moves the key to the end of the map, in override
//! order. Re-applying the same overrides therefore yields the same string.

use std::fmt;
use thiserror::Error;

use crate::svg::{Document, NodeId};

/// Style overrides hiding a slice before export.
pub const CLEAR: &[(&str, &str)] = &[("opacity", "0"), ("stroke", "none")];

/// Style overrides marking an exported slice as translucent red.
pub const MARK: &[(&str, &str)] = &[("fill", "#ff0000"), ("opacity", ".25")];

/// Unrecognized `style` syntax.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StyleParseError {
    #[error("declaration `{0}` has no `:` separator")]
    MissingSeparator(String),

    #[error("declaration `{0}` has an empty property name")]
    EmptyKey(String),
}

/// Ordered `property -> value` view of a `style` attribute.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleMap {
    entries: Vec<(String, String)>,
}

impl StyleMap {
    /// Parse `key:value;key:value`. Empty declarations are ignored.
    pub fn parse(style: &str) -> Result<Self, StyleParseError> {
        let mut map = Self::default();
        for decl in style.split(';').map(str::trim).filter(|d| !d.is_empty()) {
            let (key, value) = decl
                .split_once(':')
                .ok_or_else(|| StyleParseError::MissingSeparator(decl.to_owned()))?;
            let key = key.trim();
            if key.is_empty() {
                return Err(StyleParseError::EmptyKey(decl.to_owned()));
            }
            map.insert(key, value.trim());
        }
        Ok(map)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Insert or overwrite `key`, keeping its current position.
    pub fn insert(&mut self, key: &str, value: &str) {
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value.to_owned(),
            None => self.entries.push((key.to_owned(), value.to_owned())),
        }
    }

    /// Apply overrides: each key is removed and re-appended in override order.
    pub fn apply(&mut self, overrides: &[(&str, &str)]) {
        self.entries
            .retain(|(k, _)| !overrides.iter().any(|(key, _)| key == k));
        for (key, value) in overrides {
            self.insert(key, value);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl fmt::Display for StyleMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(";")?;
            }
            write!(f, "{key}:{value}")?;
        }
        Ok(())
    }
}

/// Merge `overrides` into a style string and flatten it back.
pub fn edit_style(style: &str, overrides: &[(&str, &str)]) -> Result<String, StyleParseError> {
    let mut map = StyleMap::parse(style)?;
    map.apply(overrides);
    Ok(map.to_string())
}

/// New `style` value for `node`; an absent attribute counts as empty.
pub fn restyle(
    doc: &Document,
    node: NodeId,
    overrides: &[(&str, &str)],
) -> Result<String, StyleParseError> {
    let current = doc.attribute(node, "style").unwrap_or_default();
    edit_style(&current, overrides)
}

/// Edit `node`'s `style` attribute in place.
pub fn update_style(
    doc: &mut Document,
    node: NodeId,
    overrides: &[(&str, &str)],
) -> Result<(), StyleParseError> {
    let style = restyle(doc, node, overrides)?;
    doc.set_attribute(node, "style", &style);
    Ok(())
}
