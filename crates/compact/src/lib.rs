//! DOM snapshot compaction for web-automation agents.
//!
//! Converts a full DOM/accessibility snapshot (potentially thousands of
//! nodes) into a compact, bounded, deterministic textual form that fits
//! a model's context budget, keeps a stable identity mapping between
//! textual references and live element handles, and concentrates detail
//! around a caller-supplied set of candidate elements.
//!
//! ## Pipeline
//!
//! ```text
//! snapshot → ingest → sanitize → (external candidate selection)
//!          → prune → serialize → prompt text + IdentifierMap
//! ```
//!
//! The engine is a pure transform: no I/O, no async, no shared state.
//! Each decision step owns its own tree and [`IdentifierMap`]; sanitize
//! and prune build new trees over deep copies, so the sanitized baseline
//! is never corrupted by a failed prune attempt.

pub mod arena;
pub mod error;
pub mod ingest;
pub mod prune;
pub mod sanitize;
pub mod serialize;
pub mod types;
pub mod utils;

pub use arena::DomArena;
pub use error::{CompactError, Result};
pub use ingest::{parse_snapshot, parse_snapshot_json, parse_snapshot_json_str};
pub use prune::prune_tree;
pub use sanitize::sanitize_tree;
pub use serialize::{serialize_subtree, serialize_tree, IdentifierMap};
pub use types::{Node, NodeId, PruneLimits, SerializeConfig};

#[cfg(test)]
mod tests {
    use super::*;
    use ahash::AHashSet;

    /// End-to-end: ingest, sanitize, prune around one candidate,
    /// serialize with a shared map.
    #[test]
    fn test_full_pipeline() {
        let snapshot = r#"<html><body role="main"><nav backend_node_id="10"><a backend_node_id="11" title="Home">Home</a><a backend_node_id="12" title="Cart">Cart</a></nav><div><button backend_node_id="20" role="button" aria_label="Add to cart">Add</button></div></body></html>"#;

        let candidates: AHashSet<String> = ["20".to_string()].into_iter().collect();
        let tree = parse_snapshot(snapshot).unwrap();
        let sanitized = sanitize_tree(&tree, &candidates).unwrap();
        let (pruned, kept) = prune_tree(&sanitized, &candidates, &PruneLimits::default()).unwrap();

        assert!(kept.contains("20"));
        let mut ids = IdentifierMap::new();
        let repr = serialize_tree(&pruned, &mut ids, &SerializeConfig::default()).unwrap();

        assert!(repr.contains("(button id=0 button add to cart>Add)"), "got: {repr}");
        assert_eq!(ids.get("20"), Some(0));
        // the nav branch was outside the candidate neighborhood
        assert!(!repr.contains("Cart"));
    }
}
