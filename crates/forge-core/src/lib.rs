//! Hypergraph data model, symbol interning, rule sharing, and semirings
//! shared by every stage of the forge decoder pipeline.
//!
//! ## Overview
//!
//! A [`hypergraph::Hypergraph`] is the common currency passed between
//! composition, parsing, rescoring, and pruning: a DAG of
//! [`hypergraph::Node`]s joined by [`hypergraph::Edge`]s, each edge carrying
//! an optional shared [`rule::Rule`], a sparse [`feature::FeatureVector`],
//! and [`attribute::AttributeMap`] side-channel bookkeeping.
//!
//! Symbols ([`symbol::Symbol`]), features, and attributes are all backed by
//! a process-wide [`intern::Interner`] so that equal strings always compare
//! as equal small integers, regardless of which crate or thread produced
//! them.
//!
//! ```
//! use forge_core::hypergraph::Hypergraph;
//! use forge_core::symbol::Symbol;
//! use forge_core::rule::intern_rule;
//! use forge_core::feature::FeatureVector;
//!
//! let mut graph = Hypergraph::new();
//! let rule = intern_rule(Symbol::intern("[S]"), vec![Symbol::intern("hello")]);
//! graph.goal = graph.add_edge_to_new_node(vec![], Some(rule), FeatureVector::new(), Default::default());
//! assert!(graph.is_valid());
//! ```

pub mod attribute;
pub mod coverage;
pub mod error;
pub mod feature;
pub mod fnv_mix;
pub mod hypergraph;
pub mod intern;
pub mod lattice;
pub mod rule;
pub mod semiring;
pub mod sort;
pub mod symbol;
pub mod tree_rule;

pub use error::ForgeError;
pub use fnv_mix::fnv_mix;
pub use hypergraph::{Edge, EdgeId, Hypergraph, Node, NodeId};
pub use rule::Rule;
pub use symbol::Symbol;
