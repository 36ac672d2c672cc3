//! HTML utility functions for navigating html5ever DOM trees.

use html5ever::tendril::TendrilSink;
use html5ever::{parse_document, ParseOpts};
use markup5ever_rcdom::{Handle, NodeData, RcDom};

/// Parse an HTML document or fragment.
///
/// html5ever recovers from malformed markup the way browsers do, so parsing
/// never fails; fragments are wrapped in `html`/`body`.
pub fn parse_html(html: &str) -> RcDom {
    parse_document(RcDom::default(), ParseOpts::default()).one(html)
}

/// Local tag name of an element node, `None` for other nodes.
///
/// # Examples
/// ```
/// use zettel_harvester::html::{parse_html, tag_name};
///
/// let dom = parse_html("<p>x</p>");
/// let html = dom.document.children.borrow()[0].clone();
/// assert_eq!(tag_name(&html).as_deref(), Some("html"));
/// assert_eq!(tag_name(&dom.document), None);
/// ```
pub fn tag_name(node: &Handle) -> Option<String> {
    match &node.data {
        NodeData::Element { name, .. } => Some(name.local.to_string()),
        _ => None,
    }
}

/// Check whether a node is an element with the given tag.
pub fn is_tag(node: &Handle, tag: &str) -> bool {
    match &node.data {
        NodeData::Element { name, .. } => &*name.local == tag,
        _ => false,
    }
}

/// Value of an attribute on an element node.
pub fn attribute(node: &Handle, attr: &str) -> Option<String> {
    match &node.data {
        NodeData::Element { attrs, .. } => attrs
            .borrow()
            .iter()
            .find(|a| &*a.name.local == attr)
            .map(|a| a.value.to_string()),
        _ => None,
    }
}

/// Check whether the `class` attribute contains `needle`.
pub fn class_contains(node: &Handle, needle: &str) -> bool {
    attribute(node, "class").is_some_and(|class| class.contains(needle))
}
