//! Compact serialization: render a tree as dense bracketed text with
//! small integer identifiers and one ranked `meta` token string per node.
//!
//! The parenthesis notation drops the angle-bracket and quote token
//! overhead of markup while staying unambiguously re-parseable: every
//! `(` is matched by exactly one later `)`, and the `>` after the
//! condensed attributes separates them from the node's content. The
//! `meta` marker itself is elided in the rendered form, so the ranked
//! tokens follow the id bare:
//!
//! ```text
//! (div>(button id=3 submit search>Search)(a id=4>Help))
//! ```

use crate::arena::DomArena;
use crate::error::Result;
use crate::types::{
    Node, NodeId, SerializeConfig, ATTRIBUTE_PRIORITY, DISCARDED_META_VALUES, HTML_UNESCAPE_TABLE,
};
use crate::utils::{cap_tokens, clean_text};
use ahash::{AHashMap, AHashSet};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// Meta tokens longer than this carry hashes and minified junk, not words.
const MAX_META_TOKEN_CHARS: usize = 15;

static RE_TEXT_WRAP: Lazy<Regex> = Lazy::new(|| Regex::new(r"<text>(.*?)</text>").unwrap());
static RE_CLOSE_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"</(.+?)>").unwrap());
static RE_OPEN_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<(.+?)>").unwrap());

/// Sentinel protecting self-closing tags across the open/close rewrites.
const SELF_CLOSE_SENTINEL: &str = "$/$";

/// Caller-owned bijection from backend identifiers to small dense
/// integers.
///
/// The map is shared across serializer calls within one decision step, so
/// the same element always renders as the same integer that step, and the
/// integer codomain is exactly `{0..len-1}`. The action-grounding step
/// inverts it to resolve a chosen integer back to a live element handle.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IdentifierMap {
    forward: AHashMap<String, u32>,
}

impl IdentifierMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a backend identifier, assigning the next dense integer on
    /// first sight.
    pub fn resolve(&mut self, backend_id: &str) -> u32 {
        if let Some(&mapped) = self.forward.get(backend_id) {
            return mapped;
        }
        let next = self.forward.len() as u32;
        self.forward.insert(backend_id.to_string(), next);
        next
    }

    pub fn get(&self, backend_id: &str) -> Option<u32> {
        self.forward.get(backend_id).copied()
    }

    pub fn len(&self) -> usize {
        self.forward.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.forward.iter().map(|(k, &v)| (k.as_str(), v))
    }

    /// Integer → backend identifier view, for action grounding.
    pub fn inverse(&self) -> AHashMap<u32, String> {
        self.forward.iter().map(|(k, &v)| (v, k.clone())).collect()
    }
}

/// Serialize a whole tree. An empty arena renders as an empty string.
pub fn serialize_tree(
    tree: &DomArena,
    ids: &mut IdentifierMap,
    config: &SerializeConfig,
) -> Result<String> {
    match tree.root_id() {
        Some(root) => serialize_subtree(tree, root, ids, config),
        None => Ok(String::new()),
    }
}

/// Serialize the subtree rooted at `node_id` with the shared identifier
/// map. Used both for the full tree and for per-candidate choice labels.
pub fn serialize_subtree(
    tree: &DomArena,
    node_id: NodeId,
    ids: &mut IdentifierMap,
    config: &SerializeConfig,
) -> Result<String> {
    let mut markup = String::with_capacity(1024);
    write_node(tree, node_id, ids, config, &mut markup)?;
    Ok(render(&markup, config.keep_html_brackets))
}

fn write_node(
    tree: &DomArena,
    node_id: NodeId,
    ids: &mut IdentifierMap,
    config: &SerializeConfig,
    out: &mut String,
) -> Result<()> {
    let node = tree.get(node_id)?;
    if node.is_text() {
        out.push_str("<text>");
        push_escaped_text(out, &cap_tokens(&node.text, config.max_length));
        out.push_str("</text>");
        return Ok(());
    }

    out.push('<');
    out.push_str(&node.tag);
    if let Some(backend) = &node.backend_id {
        let mapped = ids.resolve(backend);
        out.push_str(" id=\"");
        out.push_str(&mapped.to_string());
        out.push('"');
    }
    let meta = condense_attributes(node, config);
    if !meta.is_empty() {
        out.push_str(" meta=\"");
        push_escaped_attr(out, &meta);
        out.push('"');
    }

    if node.children.is_empty() {
        out.push_str("/>");
    } else {
        out.push('>');
        for &child_id in &node.children {
            write_node(tree, child_id, ids, config, out)?;
        }
        out.push_str("</");
        out.push_str(&node.tag);
        out.push('>');
    }
    Ok(())
}

/// Condense a node's attribute bag into one ranked meta token string.
fn condense_attributes(node: &Node, config: &SerializeConfig) -> String {
    let mut seen: AHashSet<String> = AHashSet::new();
    let mut parts: Vec<String> = Vec::new();
    for &attr in ATTRIBUTE_PRIORITY {
        let Some(raw) = node.attr(attr) else { continue };
        let value = raw.to_lowercase();
        if DISCARDED_META_VALUES.contains(&value.as_str()) || value.starts_with("http") {
            continue;
        }
        let condensed = value
            .split_whitespace()
            .filter(|token| token.chars().count() < MAX_META_TOKEN_CHARS)
            .take(config.max_value_length)
            .collect::<Vec<_>>()
            .join(" ");
        if !condensed.is_empty() && seen.insert(condensed.clone()) {
            parts.push(condensed);
        }
    }
    cap_tokens(&parts.join(" "), config.max_length)
}

fn push_escaped_text(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
}

fn push_escaped_attr(out: &mut String, value: &str) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
}

/// Fixed rendering pipeline over the attribute-condensed markup.
fn render(markup: &str, keep_html_brackets: bool) -> String {
    let mut repr = markup.replace('"', " ");
    repr = repr
        .replace("meta= ", "")
        .replace("id= ", "id=")
        .replace(" >", ">");
    repr = RE_TEXT_WRAP.replace_all(&repr, "$1").into_owned();
    if !keep_html_brackets {
        repr = repr.replace("/>", &format!("{SELF_CLOSE_SENTINEL}>"));
        repr = RE_CLOSE_TAG.replace_all(&repr, ")").into_owned();
        repr = RE_OPEN_TAG.replace_all(&repr, "(${1}>").into_owned();
        repr = repr.replace(&format!("{SELF_CLOSE_SENTINEL}>"), ")");
    }
    for (entity, plain) in HTML_UNESCAPE_TABLE {
        repr = repr.replace(entity, plain);
    }
    clean_text(&repr)
}
