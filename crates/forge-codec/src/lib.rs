//! Textual wire formats for the forge decoder: rules, tree-rules, lattices,
//! feature weights files, and the k-best hypergraph output line.
//!
//! None of these formats are a general grammar-loading subsystem — they
//! exist so the composers, rescorer, and pruner can be driven from text in
//! tests and from `forge-pipeline`'s `output` stage.

pub mod error;
pub mod hypergraph_format;
pub mod lattice_format;
pub mod location;
pub mod rule_format;
pub mod tree_rule_format;
pub mod weights_format;

pub use error::CodecError;
pub use location::Location;
