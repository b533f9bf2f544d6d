//! Arena-based storage for snapshot trees.
//!
//! Nodes live in one `Vec` and reference each other by index, so the
//! parent back-references the data model needs never become dangling
//! pointers, and a deep copy of a whole tree is a single `clone()`.
//! Wrapper collapse and subtree removal are index rewiring; detached
//! nodes stay allocated but unreachable from the root.
//!
//! ## Memory layout
//!
//! ```text
//! Arena: Vec<Node>
//!        [Node0][Node1][Node2]...
//!         ↑ 4-byte index, not 8-byte pointer
//! ```

use crate::error::{CompactError, Result};
use crate::types::{Node, NodeId};
use ahash::AHashMap;
use smallvec::SmallVec;

/// Arena allocator for snapshot nodes.
///
/// Design:
/// - Single `Vec<Node>` for sequential allocation
/// - Hash map for backend identifier → NodeId lookup
/// - No Rc/Arc: indices everywhere, `Clone` is the deep-copy primitive
#[derive(Debug, Clone, Default)]
pub struct DomArena {
    /// All nodes stored sequentially (cache-friendly).
    nodes: Vec<Node>,

    /// Backend identifier → NodeId lookup. First occurrence wins.
    backend_id_map: AHashMap<String, NodeId>,

    /// Root node ID (if set).
    root_id: Option<NodeId>,
}

impl DomArena {
    pub fn new() -> Self {
        Self::with_capacity(1024) // typical page
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            backend_id_map: AHashMap::with_capacity(capacity),
            root_id: None,
        }
    }

    /// Add a node to the arena, returns its ID.
    pub fn add_node(&mut self, node: Node) -> NodeId {
        let node_id = self.nodes.len() as NodeId;
        if let Some(backend) = &node.backend_id {
            self.backend_id_map.entry(backend.clone()).or_insert(node_id);
        }
        self.nodes.push(node);
        node_id
    }

    pub fn get(&self, node_id: NodeId) -> Result<&Node> {
        self.nodes
            .get(node_id as usize)
            .ok_or(CompactError::NodeNotFound(node_id))
    }

    pub fn get_mut(&mut self, node_id: NodeId) -> Result<&mut Node> {
        self.nodes
            .get_mut(node_id as usize)
            .ok_or(CompactError::NodeNotFound(node_id))
    }

    /// Get node ID by backend identifier.
    pub fn node_id_by_backend(&self, backend_id: &str) -> Option<NodeId> {
        self.backend_id_map.get(backend_id).copied()
    }

    /// Get node by backend identifier.
    pub fn get_by_backend(&self, backend_id: &str) -> Result<&Node> {
        let node_id = self
            .node_id_by_backend(backend_id)
            .ok_or_else(|| CompactError::CandidateNotFound(backend_id.to_string()))?;
        self.get(node_id)
    }

    pub fn set_root(&mut self, node_id: NodeId) -> Result<()> {
        self.get(node_id)?;
        self.root_id = Some(node_id);
        Ok(())
    }

    pub fn root_id(&self) -> Option<NodeId> {
        self.root_id
    }

    /// Total number of allocated nodes, detached ones included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Link `child_id` as the last child of `parent_id`.
    pub fn append_child(&mut self, parent_id: NodeId, child_id: NodeId) -> Result<()> {
        self.get(parent_id)?;
        self.get_mut(child_id)?.parent = Some(parent_id);
        self.get_mut(parent_id)?.children.push(child_id);
        Ok(())
    }

    /// Rewrite or remove a node's backend identifier, keeping the lookup
    /// map in sync.
    pub fn set_backend_id(&mut self, node_id: NodeId, backend_id: Option<String>) -> Result<()> {
        if let Some(old) = self.get(node_id)?.backend_id.clone() {
            if self.backend_id_map.get(&old) == Some(&node_id) {
                self.backend_id_map.remove(&old);
            }
        }
        if let Some(new) = &backend_id {
            self.backend_id_map.entry(new.clone()).or_insert(node_id);
        }
        self.get_mut(node_id)?.backend_id = backend_id;
        Ok(())
    }

    /// Pre-order traversal of the subtree rooted at `start` (iterative,
    /// no recursion). Fails on cyclic input.
    pub fn subtree(&self, start: NodeId) -> Result<Vec<NodeId>> {
        let mut order = Vec::new();
        let mut stack = vec![start];
        while let Some(node_id) = stack.pop() {
            order.push(node_id);
            if order.len() > self.nodes.len() {
                return Err(CompactError::StructuralInvariantViolation(start));
            }
            let node = self.get(node_id)?;
            // push children in reverse so they are visited left-to-right
            for &child_id in node.children.iter().rev() {
                stack.push(child_id);
            }
        }
        Ok(order)
    }

    /// Pre-order traversal of the whole tree; empty when no root is set.
    pub fn document_order(&self) -> Result<Vec<NodeId>> {
        match self.root_id {
            Some(root) => self.subtree(root),
            None => Ok(Vec::new()),
        }
    }

    /// Ancestor chain from the node's parent up to the root, nearest
    /// first. Fails when the chain cycles or ends somewhere other than
    /// the tree root.
    pub fn ancestors(&self, node_id: NodeId) -> Result<Vec<NodeId>> {
        let mut chain = Vec::new();
        let mut current = self.get(node_id)?.parent;
        while let Some(ancestor) = current {
            chain.push(ancestor);
            if chain.len() > self.nodes.len() {
                return Err(CompactError::StructuralInvariantViolation(node_id));
            }
            current = self.get(ancestor)?.parent;
        }
        if let (Some(root), Some(&topmost)) = (self.root_id, chain.last()) {
            if topmost != root {
                return Err(CompactError::StructuralInvariantViolation(node_id));
            }
        }
        Ok(chain)
    }

    /// Unlink a node (and so its whole subtree) from its parent and drop
    /// the subtree's backend identifiers from the lookup map. Returns the
    /// detached node IDs in pre-order.
    pub fn detach_subtree(&mut self, node_id: NodeId) -> Result<Vec<NodeId>> {
        if let Some(parent_id) = self.get(node_id)?.parent {
            let parent = self.get_mut(parent_id)?;
            if let Some(pos) = parent.children.iter().position(|&c| c == node_id) {
                parent.children.remove(pos);
            }
            self.get_mut(node_id)?.parent = None;
        }
        let detached = self.subtree(node_id)?;
        for &id in &detached {
            if let Some(backend) = self.get(id)?.backend_id.clone() {
                if self.backend_id_map.get(&backend) == Some(&id) {
                    self.backend_id_map.remove(&backend);
                }
            }
        }
        Ok(detached)
    }

    /// Wrapper collapse: replace a node with its children (at the same
    /// position in the parent's child list) and unlink it.
    pub fn splice_out(&mut self, node_id: NodeId) -> Result<()> {
        let node = self.get(node_id)?;
        let parent_id = node
            .parent
            .ok_or(CompactError::StructuralInvariantViolation(node_id))?;
        let children: SmallVec<[NodeId; 4]> = node.children.clone();
        let backend = node.backend_id.clone();

        let parent = self.get_mut(parent_id)?;
        let pos = parent
            .children
            .iter()
            .position(|&c| c == node_id)
            .ok_or(CompactError::StructuralInvariantViolation(node_id))?;
        parent.children.remove(pos);
        for (offset, &child_id) in children.iter().enumerate() {
            parent.children.insert(pos + offset, child_id);
        }
        for &child_id in &children {
            self.get_mut(child_id)?.parent = Some(parent_id);
        }

        if let Some(backend) = backend {
            if self.backend_id_map.get(&backend) == Some(&node_id) {
                self.backend_id_map.remove(&backend);
            }
        }
        let node = self.get_mut(node_id)?;
        node.parent = None;
        node.children.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(tag: &str, backend_id: Option<&str>) -> Node {
        let mut node = Node::new(tag);
        node.backend_id = backend_id.map(str::to_string);
        node
    }

    #[test]
    fn test_arena_basic() {
        let mut arena = DomArena::new();
        let id = arena.add_node(element("div", Some("100")));
        assert_eq!(id, 0);

        let retrieved = arena.get(id).unwrap();
        assert_eq!(retrieved.tag, "div");
        assert_eq!(retrieved.backend_id.as_deref(), Some("100"));
    }

    #[test]
    fn test_backend_lookup() {
        let mut arena = DomArena::new();
        arena.add_node(element("div", Some("100")));

        let found = arena.get_by_backend("100").unwrap();
        assert_eq!(found.tag, "div");
        assert!(matches!(
            arena.get_by_backend("404"),
            Err(CompactError::CandidateNotFound(_))
        ));
    }

    #[test]
    fn test_document_order() {
        let mut arena = DomArena::new();
        let root = arena.add_node(element("div", None));
        let a = arena.add_node(element("span", None));
        let b = arena.add_node(element("span", None));
        let a1 = arena.add_node(element("em", None));
        arena.append_child(root, a).unwrap();
        arena.append_child(root, b).unwrap();
        arena.append_child(a, a1).unwrap();
        arena.set_root(root).unwrap();

        assert_eq!(arena.document_order().unwrap(), vec![root, a, a1, b]);
    }

    #[test]
    fn test_ancestors_and_cycle_guard() {
        let mut arena = DomArena::new();
        let root = arena.add_node(element("html", None));
        let mid = arena.add_node(element("body", None));
        let leaf = arena.add_node(element("a", None));
        arena.append_child(root, mid).unwrap();
        arena.append_child(mid, leaf).unwrap();
        arena.set_root(root).unwrap();

        assert_eq!(arena.ancestors(leaf).unwrap(), vec![mid, root]);

        // a parent cycle must be reported, not looped on
        arena.get_mut(root).unwrap().parent = Some(leaf);
        assert!(matches!(
            arena.ancestors(leaf),
            Err(CompactError::StructuralInvariantViolation(_))
        ));
    }

    #[test]
    fn test_detach_subtree() {
        let mut arena = DomArena::new();
        let root = arena.add_node(element("div", None));
        let branch = arena.add_node(element("ul", Some("7")));
        let leaf = arena.add_node(element("li", Some("8")));
        arena.append_child(root, branch).unwrap();
        arena.append_child(branch, leaf).unwrap();
        arena.set_root(root).unwrap();

        let detached = arena.detach_subtree(branch).unwrap();
        assert_eq!(detached, vec![branch, leaf]);
        assert_eq!(arena.document_order().unwrap(), vec![root]);
        assert!(arena.node_id_by_backend("7").is_none());
        assert!(arena.node_id_by_backend("8").is_none());
    }

    #[test]
    fn test_splice_out_keeps_position() {
        let mut arena = DomArena::new();
        let root = arena.add_node(element("div", None));
        let first = arena.add_node(element("a", None));
        let wrapper = arena.add_node(element("span", Some("9")));
        let inner = arena.add_node(element("b", None));
        let last = arena.add_node(element("a", None));
        arena.append_child(root, first).unwrap();
        arena.append_child(root, wrapper).unwrap();
        arena.append_child(root, last).unwrap();
        arena.append_child(wrapper, inner).unwrap();
        arena.set_root(root).unwrap();

        arena.splice_out(wrapper).unwrap();
        assert_eq!(arena.get(root).unwrap().children.as_slice(), &[first, inner, last]);
        assert_eq!(arena.get(inner).unwrap().parent, Some(root));
        assert!(arena.node_id_by_backend("9").is_none());
    }
}
