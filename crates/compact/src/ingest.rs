//! Snapshot ingest: build a [`DomArena`] from a serialized snapshot.
//!
//! Two input forms are accepted. The markup form is the wire format of
//! the DOM-extraction collaborator: ordinary element tags where every
//! element of interest carries a `backend_node_id` attribute, and plain
//! text is represented as `text`-tagged elements. The JSON form is a
//! nested object tree:
//!
//! ```text
//! {
//!   "root": {
//!     "tag": "div",
//!     "attributes": {"backend_node_id": "1", "role": "main"},
//!     "children": [{"tag": "text", "text": "Hi"}]
//!   }
//! }
//! ```
//!
//! The `root` envelope is optional. In both forms the `backend_node_id`
//! attribute is hoisted into [`Node::backend_id`].

use crate::arena::DomArena;
use crate::error::{CompactError, Result};
use crate::types::{Node, NodeId, BACKEND_ID_ATTR, TEXT_TAG};
use crate::utils::unescape_entities;
use serde_json::Value;

fn malformed(message: impl Into<String>) -> CompactError {
    CompactError::MalformedSnapshot(message.into())
}

/// Parse a serialized markup snapshot into an arena tree.
///
/// Accepts self-closing tags, single- or double-quoted attribute values,
/// bare boolean attributes, and comments. Character data directly inside
/// a non-`text` element synthesizes a `text` pseudo-node child when it
/// contains anything beyond whitespace. Exactly one root element is
/// required; unbalanced or mismatched tags are rejected.
pub fn parse_snapshot(input: &str) -> Result<DomArena> {
    let mut arena = DomArena::new();
    let mut stack: Vec<NodeId> = Vec::new();
    let mut root: Option<NodeId> = None;
    let bytes = input.as_bytes();
    let mut pos = 0;

    while pos < input.len() {
        if bytes[pos] == b'<' {
            if input[pos..].starts_with("<!--") {
                let end = input[pos..]
                    .find("-->")
                    .ok_or_else(|| malformed("unterminated comment"))?;
                pos += end + 3;
            } else if input[pos..].starts_with("</") {
                let end = input[pos..]
                    .find('>')
                    .ok_or_else(|| malformed("unterminated closing tag"))?
                    + pos;
                let name = input[pos + 2..end].trim();
                let top = stack
                    .pop()
                    .ok_or_else(|| malformed(format!("unmatched closing tag </{name}>")))?;
                let open_tag = &arena.get(top)?.tag;
                if open_tag != name {
                    return Err(malformed(format!(
                        "closing tag </{name}> does not match <{open_tag}>"
                    )));
                }
                pos = end + 1;
            } else {
                let (node_id, self_closing, next) = parse_open_tag(&mut arena, input, pos)?;
                match stack.last() {
                    Some(&parent) => arena.append_child(parent, node_id)?,
                    None => {
                        if root.is_some() {
                            return Err(malformed("snapshot has multiple root elements"));
                        }
                        root = Some(node_id);
                    }
                }
                if !self_closing {
                    stack.push(node_id);
                }
                pos = next;
            }
        } else {
            let end = input[pos..]
                .find('<')
                .map(|offset| pos + offset)
                .unwrap_or(input.len());
            let raw = &input[pos..end];
            match stack.last() {
                Some(&parent) => {
                    let content = unescape_entities(raw);
                    if arena.get(parent)?.tag == TEXT_TAG {
                        arena.get_mut(parent)?.text.push_str(&content);
                    } else if !content.trim().is_empty() {
                        let child = arena.add_node(Node::text_node(content));
                        arena.append_child(parent, child)?;
                    }
                }
                None => {
                    if !raw.trim().is_empty() {
                        return Err(malformed("text content outside of the root element"));
                    }
                }
            }
            pos = end;
        }
    }

    if let Some(&unclosed) = stack.last() {
        return Err(malformed(format!(
            "unclosed element <{}>",
            arena.get(unclosed)?.tag
        )));
    }
    let root = root.ok_or_else(|| malformed("snapshot has no root element"))?;
    arena.set_root(root)?;
    Ok(arena)
}

/// Parse one open tag starting at `start` (which points at `<`).
/// Returns the new node, whether the tag was self-closing, and the
/// position just past the closing `>`.
fn parse_open_tag(arena: &mut DomArena, input: &str, start: usize) -> Result<(NodeId, bool, usize)> {
    let bytes = input.as_bytes();
    let len = input.len();
    let mut pos = start + 1;

    let name_start = pos;
    while pos < len
        && !bytes[pos].is_ascii_whitespace()
        && bytes[pos] != b'>'
        && bytes[pos] != b'/'
    {
        pos += 1;
    }
    let name = &input[name_start..pos];
    if name.is_empty() {
        return Err(malformed("empty tag name"));
    }
    let mut node = Node::new(name);

    let self_closing = loop {
        while pos < len && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        if pos >= len {
            return Err(malformed(format!("unterminated tag <{name}>")));
        }
        match bytes[pos] {
            b'>' => {
                pos += 1;
                break false;
            }
            b'/' => {
                if bytes.get(pos + 1) == Some(&b'>') {
                    pos += 2;
                    break true;
                }
                return Err(malformed(format!("stray '/' in tag <{name}>")));
            }
            _ => {
                let attr_start = pos;
                while pos < len
                    && !bytes[pos].is_ascii_whitespace()
                    && bytes[pos] != b'='
                    && bytes[pos] != b'>'
                    && bytes[pos] != b'/'
                {
                    pos += 1;
                }
                let attr_name = input[attr_start..pos].to_string();
                while pos < len && bytes[pos].is_ascii_whitespace() {
                    pos += 1;
                }
                let mut value = String::new();
                if pos < len && bytes[pos] == b'=' {
                    pos += 1;
                    while pos < len && bytes[pos].is_ascii_whitespace() {
                        pos += 1;
                    }
                    let quote = match bytes.get(pos) {
                        Some(&q @ (b'"' | b'\'')) => q,
                        _ => {
                            return Err(malformed(format!(
                                "attribute {attr_name} value must be quoted"
                            )))
                        }
                    };
                    pos += 1;
                    let value_start = pos;
                    while pos < len && bytes[pos] != quote {
                        pos += 1;
                    }
                    if pos >= len {
                        return Err(malformed(format!(
                            "unterminated value for attribute {attr_name}"
                        )));
                    }
                    value = unescape_entities(&input[value_start..pos]);
                    pos += 1;
                }
                if attr_name == BACKEND_ID_ATTR {
                    node.backend_id = Some(value);
                } else {
                    node.attributes.insert(attr_name, value);
                }
            }
        }
    };

    Ok((arena.add_node(node), self_closing, pos))
}

/// Parse a raw JSON snapshot payload into an arena tree.
pub fn parse_snapshot_json_str(input: &str) -> Result<DomArena> {
    let snapshot: Value = serde_json::from_str(input)?;
    parse_snapshot_json(&snapshot)
}

/// Parse a JSON snapshot into an arena tree.
pub fn parse_snapshot_json(snapshot: &Value) -> Result<DomArena> {
    let root_value = snapshot.get("root").unwrap_or(snapshot);
    let mut arena = DomArena::new();
    let root = parse_json_node(&mut arena, root_value)?;
    arena.set_root(root)?;
    Ok(arena)
}

fn parse_json_node(arena: &mut DomArena, value: &Value) -> Result<NodeId> {
    let object = value
        .as_object()
        .ok_or_else(|| malformed("snapshot node must be an object"))?;
    let tag = object
        .get("tag")
        .and_then(Value::as_str)
        .ok_or_else(|| malformed("snapshot node is missing its tag"))?;

    let mut node = Node::new(tag);
    if let Some(attrs) = object.get("attributes") {
        let attrs = attrs
            .as_object()
            .ok_or_else(|| malformed("attributes must be an object"))?;
        for (key, value) in attrs {
            let value = value
                .as_str()
                .ok_or_else(|| malformed(format!("attribute {key} must be a string")))?;
            if key == BACKEND_ID_ATTR {
                node.backend_id = Some(value.to_string());
            } else {
                node.attributes.insert(key.clone(), value.to_string());
            }
        }
    }
    let inline_text = object
        .get("text")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    if tag == TEXT_TAG {
        node.text = inline_text.clone();
    }
    let node_id = arena.add_node(node);

    // inline text on an element precedes its child list, as in the markup form
    if tag != TEXT_TAG && !inline_text.trim().is_empty() {
        let text_id = arena.add_node(Node::text_node(inline_text));
        arena.append_child(node_id, text_id)?;
    }

    if let Some(children) = object.get("children") {
        let children = children
            .as_array()
            .ok_or_else(|| malformed("children must be an array"))?;
        for child in children {
            let child_id = parse_json_node(arena, child)?;
            arena.append_child(node_id, child_id)?;
        }
    }
    Ok(node_id)
}
