//! Thin adapter over the XML parser.
//!
//! The rest of the crate only talks to [`Element`], which exposes the few
//! DOM primitives KML walking needs: tag lookup, attributes and text content.

use roxmltree::{Document, Node};

use crate::error::{KmlCableError, Result};

/// Parses KML text into an XML document.
///
/// Leading byte-order marks and whitespace are ignored. Empty input and XML
/// syntax errors are fatal.
pub fn parse(text: &str) -> Result<Document<'_>> {
    let text = text.trim_start_matches('\u{feff}').trim_start();
    if text.trim_end().is_empty() {
        return Err(KmlCableError::Empty);
    }
    let doc = Document::parse(text)?;
    let root = doc.root_element().tag_name().name();
    if root != "kml" {
        log::debug!("document root is <{}>, not <kml>", root);
    }
    Ok(doc)
}

pub trait Element<'a>: Copy {
    /// Local tag name, namespace prefix stripped.
    fn tag_name(&self) -> &'a str;

    /// All descendant elements (not including `self`) with the given local
    /// name, in document order.
    fn elements_by_tag_name(&self, tag: &str) -> Vec<Self>;

    /// Direct child elements with the given local name.
    fn children_named(&self, tag: &str) -> Vec<Self>;

    fn attribute(&self, name: &str) -> Option<&'a str>;

    /// Concatenated text of all descendant text and CDATA nodes.
    fn text_content(&self) -> String;

    fn child(&self, tag: &str) -> Option<Self> {
        self.children_named(tag).into_iter().next()
    }

    /// Trimmed text of the first direct child named `tag`, if non-empty.
    fn child_text(&self, tag: &str) -> Option<String> {
        let text = self.child(tag)?.text_content();
        let text = text.trim();
        if text.is_empty() {
            None
        } else {
            Some(text.to_string())
        }
    }
}

impl<'a, 'input: 'a> Element<'a> for Node<'a, 'input> {
    fn tag_name(&self) -> &'a str {
        Node::tag_name(self).name()
    }

    fn elements_by_tag_name(&self, tag: &str) -> Vec<Self> {
        self.descendants()
            .skip(1)
            .filter(|n| n.is_element() && n.tag_name().name() == tag)
            .collect()
    }

    fn children_named(&self, tag: &str) -> Vec<Self> {
        self.children()
            .filter(|n| n.is_element() && n.tag_name().name() == tag)
            .collect()
    }

    fn attribute(&self, name: &str) -> Option<&'a str> {
        Node::attribute(self, name)
    }

    fn text_content(&self) -> String {
        self.descendants()
            .filter(|n| n.is_text())
            .filter_map(|n| n.text())
            .collect()
    }
}
