//! Error types for snapshot compaction.
//!
//! Flat error hierarchy, one enum for the whole crate. Every failure is a
//! caller contract violation or malformed input; the engine never retries
//! and never substitutes degraded output, because the action-grounding
//! step downstream depends on exact identifier correspondence.

use crate::types::NodeId;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CompactError>;

#[derive(Debug, Error)]
pub enum CompactError {
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("Candidate not found: no node carries backend_node_id {0}")]
    CandidateNotFound(String),

    #[error("Structural invariant violated: node {0} has no ancestor chain to the root")]
    StructuralInvariantViolation(NodeId),

    #[error("Malformed snapshot: {0}")]
    MalformedSnapshot(String),

    #[error("Parse error: {0}")]
    Json(#[from] serde_json::Error),
}
