//! Core error taxonomy shared by every crate that rewrites or inspects a
//! hypergraph.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ForgeError {
    /// The goal subgraph is not acyclic; fatal for topological sort and any
    /// operation that depends on it.
    #[error("cycle detected reaching node {node}")]
    CycleDetected { node: usize },

    /// `goal` is not a real node, or the goal subgraph failed validation.
    #[error("invalid hypergraph: {reason}")]
    InvalidGraph { reason: String },

    /// A tree-rule instantiation referenced an antecedent index beyond the
    /// matched rule's arity.
    #[error("non-terminal index {index} out of range (max {max})")]
    NonTerminalIndexOutOfRange { index: usize, max: usize },
}
