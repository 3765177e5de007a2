//! Word lattice: a sequence of arc sets, one per position, each arc
//! spanning `distance` positions forward. `EPSILON`/`BOS`/`EOS`/`NONE` are
//! the designated sentinel labels from [`crate::symbol::Symbol`].

use crate::feature::FeatureVector;
use crate::symbol::Symbol;

/// One lattice transition: a label spanning `distance` positions, with its
/// own feature contribution (e.g. an ASR confidence score).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Arc {
    pub label: Symbol,
    pub distance: usize,
    pub features: FeatureVector,
}

impl Arc {
    pub fn new(label: Symbol, distance: usize, features: FeatureVector) -> Self {
        Arc { label, distance, features }
    }

    pub fn is_epsilon(&self) -> bool {
        self.label == Symbol::epsilon()
    }
}

/// A sequence of positions, each holding the arcs leaving it. A lattice of
/// length `n` represents sentence spans `[0, n]`; a plain sentence is the
/// degenerate case where every position has exactly one arc of
/// `distance == 1`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Lattice {
    positions: Vec<Vec<Arc>>,
}

impl Lattice {
    pub fn new(positions: Vec<Vec<Arc>>) -> Self {
        Lattice { positions }
    }

    /// Builds the degenerate lattice for a plain token sequence: one arc of
    /// distance 1 per word.
    pub fn from_sentence(words: impl IntoIterator<Item = Symbol>) -> Self {
        Lattice {
            positions: words
                .into_iter()
                .map(|w| vec![Arc::new(w, 1, FeatureVector::new())])
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn arcs_at(&self, pos: usize) -> &[Arc] {
        self.positions.get(pos).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn positions(&self) -> &[Vec<Arc>] {
        &self.positions
    }

    /// `true` iff every arc's span stays within `[0, len]` — the
    /// `MalformedLattice` check required before composing.
    pub fn is_well_formed(&self) -> bool {
        self.positions
            .iter()
            .enumerate()
            .all(|(pos, arcs)| arcs.iter().all(|arc| pos + arc.distance <= self.len()))
    }
}
