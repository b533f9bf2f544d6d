//! Core node types and the fixed attribute tables.
//!
//! Design:
//! 1. u32 indices into the arena instead of pointers
//! 2. SmallVec for children (most nodes have <4 children)
//! 3. The backend identifier lives in its own field, hoisted out of the
//!    attribute map at ingest, so attribute rules never have to
//!    special-case it

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::HashMap;

/// Node identifier (index into the arena).
pub type NodeId = u32;

/// Pseudo-tag used for plain text content.
pub const TEXT_TAG: &str = "text";

/// Tag whose `class` attribute is scanned for icon names.
pub const ICON_TAG: &str = "svg";

/// The snapshot attribute carrying the opaque backend identifier.
pub const BACKEND_ID_ATTR: &str = "backend_node_id";

/// A single snapshot node.
///
/// Text content is modelled as child nodes with [`TEXT_TAG`]; an element
/// never carries inline text of its own. `backend_id` is the opaque,
/// snapshot-stable identifier assigned by the DOM-extraction collaborator;
/// synthetic or merged nodes have none and are unaddressable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub tag: String,
    pub attributes: HashMap<String, String>,
    pub backend_id: Option<String>,
    pub text: String,
    pub parent: Option<NodeId>,
    pub children: SmallVec<[NodeId; 4]>,
}

impl Node {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: HashMap::new(),
            backend_id: None,
            text: String::new(),
            parent: None,
            children: SmallVec::new(),
        }
    }

    /// Create a text pseudo-node.
    pub fn text_node(content: impl Into<String>) -> Self {
        let mut node = Self::new(TEXT_TAG);
        node.text = content.into();
        node
    }

    pub fn is_text(&self) -> bool {
        self.tag == TEXT_TAG
    }

    /// Get attribute value.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(|s| s.as_str())
    }
}

/// Attributes that survive sanitization. Everything else is dropped,
/// except the backend identifier and (on icon nodes) a filtered `class`.
pub const SALIENT_ATTRIBUTES: &[&str] = &[
    "alt",
    "aria_description",
    "aria_label",
    "aria_role",
    "input_checked",
    "input_value",
    "label",
    "name",
    "option_selected",
    "placeholder",
    "role",
    "text_value",
    "title",
    "type",
    "value",
];

/// Fixed order in which attribute values are condensed into the `meta`
/// token string. Earlier entries win the per-node token budget.
pub const ATTRIBUTE_PRIORITY: &[&str] = &[
    "role",
    "aria_role",
    "type",
    "alt",
    "aria_description",
    "aria_label",
    "label",
    "title",
    "name",
    "text_value",
    "value",
    "placeholder",
    "input_checked",
    "input_value",
    "option_selected",
    "class",
];

/// Attribute values that carry no signal and are skipped during meta
/// condensation.
pub const DISCARDED_META_VALUES: &[&str] = &["hidden", "none", "presentation", "null", "undefined"];

/// Entity unescape table applied at the end of rendering, in order.
pub const HTML_UNESCAPE_TABLE: &[(&str, &str)] = &[
    ("&quot;", "\""),
    ("&amp;", "&"),
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&nbsp;", " "),
    ("&ndash;", "-"),
    ("&rsquo;", "'"),
    ("&lsquo;", "'"),
    ("&ldquo;", "\""),
    ("&rdquo;", "\""),
    ("&#39;", "'"),
    ("&#40;", "("),
    ("&#41;", ")"),
];

/// Neighborhood bounds for candidate-scoped pruning.
#[derive(Debug, Clone)]
pub struct PruneLimits {
    /// Depth bound for the descendant traversal below each candidate.
    pub max_depth: usize,
    /// Cap on kept descendants per candidate.
    pub max_children: usize,
    /// Element-sibling window radius either side of each candidate.
    pub max_sibling: usize,
}

impl Default for PruneLimits {
    fn default() -> Self {
        Self {
            max_depth: 5,
            max_children: 50,
            max_sibling: 3,
        }
    }
}

/// Serializer configuration.
#[derive(Debug, Clone)]
pub struct SerializeConfig {
    /// Token cap per condensed attribute value.
    pub max_value_length: usize,
    /// Token cap for a node's combined meta string and for text content.
    pub max_length: usize,
    /// Keep `<tag>` markup instead of rewriting to parenthesis notation.
    pub keep_html_brackets: bool,
}

impl Default for SerializeConfig {
    fn default() -> Self {
        Self {
            max_value_length: 5,
            max_length: 20,
            keep_html_brackets: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_covers_allow_list() {
        for attr in SALIENT_ATTRIBUTES {
            assert!(
                ATTRIBUTE_PRIORITY.contains(attr),
                "salient attribute {} missing from priority order",
                attr
            );
        }
        assert_eq!(ATTRIBUTE_PRIORITY.len(), SALIENT_ATTRIBUTES.len() + 1);
    }

    #[test]
    fn text_node_shape() {
        let node = Node::text_node("hello");
        assert!(node.is_text());
        assert_eq!(node.text, "hello");
        assert!(node.backend_id.is_none());
    }
}
