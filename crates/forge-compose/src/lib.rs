//! Composes translation hypergraphs by matching synchronous grammars
//! against an input lattice (phrase-based, [`phrase`]) or an input parse
//! forest (tree-to-tree, [`tree`]).

pub mod error;
pub mod phrase;
pub mod transducer;
pub mod tree;

pub use error::ComposeError;
pub use phrase::PhraseComposer;
pub use transducer::{PhraseTransducer, TransducerNode, TrieGrammar};
pub use tree::{TreeComposer, TreeGrammar};
