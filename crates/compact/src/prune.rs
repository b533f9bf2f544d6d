//! Candidate-scoped pruning: keep only the neighborhood of a set of
//! candidate elements and discard everything else.
//!
//! The neighborhood of one candidate is its full ancestor chain, a
//! depth- and count-bounded slice of its descendants, and a window of
//! element siblings either side. Keep-sets are unioned across all
//! candidates, then a single mutation pass over a deep copy removes
//! non-kept subtrees, strips backend identifiers from surviving
//! non-candidates (visible for context, unaddressable), and re-collapses
//! wrappers the deletions exposed.

use crate::arena::DomArena;
use crate::error::{CompactError, Result};
use crate::sanitize::wrapper_shape;
use crate::types::{NodeId, PruneLimits};
use ahash::AHashSet;
use tracing::debug;

/// Prune a tree around `candidates`, returning the new tree and the
/// backend identifiers of every kept node. Callers that only want the
/// tree ignore the second element.
///
/// Every candidate must resolve: any identifier without a matching node
/// fails the whole call with [`CompactError::CandidateNotFound`] before
/// anything is computed, and no partial tree is ever returned.
pub fn prune_tree(
    tree: &DomArena,
    candidates: &AHashSet<String>,
    limits: &PruneLimits,
) -> Result<(DomArena, AHashSet<String>)> {
    // resolve every candidate independently before touching anything
    let mut candidate_nodes = Vec::with_capacity(candidates.len());
    let mut missing: Vec<&str> = Vec::new();
    for backend_id in candidates {
        match tree.node_id_by_backend(backend_id) {
            Some(node_id) => candidate_nodes.push(node_id),
            None => missing.push(backend_id),
        }
    }
    if !missing.is_empty() {
        missing.sort_unstable();
        return Err(CompactError::CandidateNotFound(missing.join(", ")));
    }

    let mut keep: AHashSet<NodeId> = AHashSet::new();
    for &candidate in &candidate_nodes {
        keep.insert(candidate);
        keep.extend(tree.ancestors(candidate)?);
        for node_id in descendants(tree, candidate, limits.max_depth)?
            .into_iter()
            .take(limits.max_children)
        {
            keep.insert(node_id);
        }
        keep.extend(sibling_window(tree, candidate, limits.max_sibling)?);
    }

    let kept_ids: AHashSet<String> = keep
        .iter()
        .filter_map(|&node_id| tree.get(node_id).ok()?.backend_id.clone())
        .collect();

    let mut out = tree.clone();
    let worklist = out.document_order()?;
    let mut removed = vec![false; out.len()];
    for &node_id in worklist.iter().rev() {
        if removed[node_id as usize] {
            continue;
        }
        let node = out.get(node_id)?;
        let is_text = node.is_text();
        // a text node is keyed by its parent: kept with it, candidate
        // through it
        let subject = if is_text { node.parent } else { Some(node_id) };
        let (is_keep, is_candidate) = match subject {
            Some(subject_id) => {
                let subject_node = out.get(subject_id)?;
                (
                    keep.contains(&subject_id),
                    subject_node
                        .backend_id
                        .as_deref()
                        .map_or(false, |backend| candidates.contains(backend)),
                )
            }
            None => (false, false),
        };

        if !is_keep && out.get(node_id)?.parent.is_some() {
            for detached in out.detach_subtree(node_id)? {
                removed[detached as usize] = true;
            }
            continue;
        }
        if !is_candidate || is_text {
            out.set_backend_id(node_id, None)?;
        }
        if !is_text && out.get(node_id)?.backend_id.is_none() && wrapper_shape(&out, node_id)? {
            out.splice_out(node_id)?;
        }
    }

    let after = out.document_order()?.len();
    debug!(
        candidates = candidate_nodes.len(),
        kept = keep.len(),
        nodes_before = worklist.len(),
        nodes_after = after,
        "pruned snapshot tree"
    );
    Ok((out, kept_ids))
}

/// Depth-first pre-order descendants of `node_id`, bounded by
/// `max_depth` levels of recursion below the node.
fn descendants(tree: &DomArena, node_id: NodeId, max_depth: usize) -> Result<Vec<NodeId>> {
    fn walk(
        tree: &DomArena,
        node_id: NodeId,
        depth: usize,
        max_depth: usize,
        out: &mut Vec<NodeId>,
    ) -> Result<()> {
        if depth > max_depth {
            return Ok(());
        }
        for &child_id in tree.get(node_id)?.children.iter() {
            out.push(child_id);
            walk(tree, child_id, depth + 1, max_depth, out)?;
        }
        Ok(())
    }

    let mut out = Vec::new();
    walk(tree, node_id, 0, max_depth, &mut out)?;
    Ok(out)
}

/// Element siblings within `radius` positions either side of the node,
/// the node itself included. Text pseudo-nodes do not count as siblings
/// and do not occupy a position.
fn sibling_window(tree: &DomArena, node_id: NodeId, radius: usize) -> Result<Vec<NodeId>> {
    let Some(parent_id) = tree.get(node_id)?.parent else {
        return Ok(Vec::new());
    };
    let mut siblings = Vec::new();
    for &child_id in &tree.get(parent_id)?.children {
        if !tree.get(child_id)?.is_text() {
            siblings.push(child_id);
        }
    }
    let Some(position) = siblings.iter().position(|&s| s == node_id) else {
        return Ok(Vec::new());
    };
    let low = position.saturating_sub(radius);
    let high = (position + radius + 1).min(siblings.len());
    Ok(siblings[low..high].to_vec())
}
