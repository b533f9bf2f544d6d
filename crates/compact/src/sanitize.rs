//! Attribute sanitization: reduce every node to the salient allow-list
//! and collapse structurally redundant single-child wrappers.

use crate::arena::DomArena;
use crate::error::Result;
use crate::types::{NodeId, ICON_TAG, SALIENT_ATTRIBUTES};
use crate::utils::clean_text;
use ahash::AHashSet;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

/// Whitespace tokens that name an icon, matched case-insensitively
/// anywhere inside the token.
static ICON_CLASS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\S*icon\S*").unwrap());

/// Sanitize a tree into a new one; the input is untouched.
///
/// Rules, applied in reverse document order so child collapses resolve
/// before a node's own collapse eligibility is evaluated:
/// - on `svg` nodes, `class` keeps only its icon tokens (attribute
///   dropped when none match); every other non-salient attribute goes
/// - salient attributes are whitespace-normalized and dropped when empty;
///   `role` values `presentation`/`none`/`link` and `type` value `hidden`
///   are dropped outright
/// - `text` nodes survive only with non-empty normalized content
/// - wrappers collapse: a non-text node whose backend identifier is not
///   in `must_keep`, with no remaining attributes, no direct text child,
///   a parent, and at most one child is spliced out of the tree
pub fn sanitize_tree(tree: &DomArena, must_keep: &AHashSet<String>) -> Result<DomArena> {
    let mut out = tree.clone();
    let worklist = out.document_order()?;
    let before = worklist.len();

    for &node_id in worklist.iter().rev() {
        reduce_attributes(&mut out, node_id)?;
        let node = out.get(node_id)?;
        if node.is_text() {
            let cleaned = clean_text(&node.text);
            if cleaned.is_empty() {
                if node.parent.is_some() {
                    out.detach_subtree(node_id)?;
                }
            } else {
                out.get_mut(node_id)?.text = cleaned;
            }
        } else {
            // identifier-less wrappers are left alone here; only pruning
            // may collapse a node that was never addressable
            let collapsible = node
                .backend_id
                .as_deref()
                .map_or(false, |backend| !must_keep.contains(backend));
            if collapsible && wrapper_shape(&out, node_id)? {
                out.splice_out(node_id)?;
            }
        }
    }

    let after = out.document_order()?.len();
    debug!(nodes_before = before, nodes_after = after, "sanitized snapshot tree");
    Ok(out)
}

/// Reduce one node's attribute bag to the allow-list.
fn reduce_attributes(arena: &mut DomArena, node_id: NodeId) -> Result<()> {
    let node = arena.get_mut(node_id)?;
    let keys: Vec<String> = node.attributes.keys().cloned().collect();
    for key in keys {
        let raw = node.attributes[&key].clone();
        if key == "class" && !raw.is_empty() && node.tag == ICON_TAG {
            let icons: Vec<&str> = ICON_CLASS_RE.find_iter(&raw).map(|m| m.as_str()).collect();
            if icons.is_empty() {
                node.attributes.remove(&key);
            } else {
                node.attributes.insert(key, icons.join(" "));
            }
        } else if SALIENT_ATTRIBUTES.contains(&key.as_str()) {
            let discard = (key == "role"
                && matches!(raw.as_str(), "presentation" | "none" | "link"))
                || (key == "type" && raw == "hidden");
            if discard {
                node.attributes.remove(&key);
            } else {
                let value = clean_text(&raw);
                if value.is_empty() {
                    node.attributes.remove(&key);
                } else {
                    node.attributes.insert(key, value);
                }
            }
        } else {
            node.attributes.remove(&key);
        }
    }
    Ok(())
}

/// Structural half of the wrapper-collapse rule: non-text, has a parent,
/// at most one child, no remaining attributes, and no direct text child.
/// The identifier half differs between sanitization and pruning.
pub(crate) fn wrapper_shape(arena: &DomArena, node_id: NodeId) -> Result<bool> {
    let node = arena.get(node_id)?;
    if node.is_text()
        || node.parent.is_none()
        || node.children.len() > 1
        || !node.attributes.is_empty()
    {
        return Ok(false);
    }
    for &child_id in &node.children {
        if arena.get(child_id)?.is_text() {
            return Ok(false);
        }
    }
    Ok(true)
}
