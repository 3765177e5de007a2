//! Feature-function state: an opaque, fixed-length byte blob per stacked
//! function, hashed and compared by bytes so that cube-growing can merge
//! nodes whose derivations reach byte-equal state.

use std::hash::{Hash, Hasher};

use forge_core::fnv_mix;
use forge_core::hypergraph::Edge;

/// One feature function's state for a single derivation. `State::empty()`
/// is the stateless case (`cicada`'s `base == 0`).
#[derive(Debug, Clone, Default)]
pub struct State(Option<Box<[u8]>>);

impl State {
    pub fn empty() -> Self {
        State(None)
    }

    pub fn from_bytes(bytes: Box<[u8]>) -> Self {
        if bytes.is_empty() {
            State(None)
        } else {
            State(Some(bytes))
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_deref().unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }
}

impl PartialEq for State {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}
impl Eq for State {}

impl Hash for State {
    fn hash<H: Hasher>(&self, hasher: &mut H) {
        hasher.write_u64(fnv_mix(self.as_bytes(), 0));
    }
}

/// The combined per-node state of every function stacked in a
/// [`crate::model::Model`], in model order. Two `CompositeState`s are equal
/// iff every function's sub-state is byte-equal — the merge key
/// cube-growing uses to collapse sibling derivations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct CompositeState(pub Vec<State>);

impl CompositeState {
    pub fn stateless(count: usize) -> Self {
        CompositeState(vec![State::empty(); count])
    }
}

/// A stateful or stateless scoring component stacked inside a
/// [`crate::model::Model`]. Mirrors `cicada`'s `FeatureFunction` interface:
/// `apply` is the one-shot entry point cube-growing drives; `apply_coarse`
/// backs a cheaper first pass; `apply_predict`/`apply_scan`/`apply_complete`
/// back incremental (left-to-right) application, used outside the
/// cube-growing path.
pub trait FeatureFunction {
    /// Fixed length, in bytes, of the state this function produces. `0`
    /// marks it stateless.
    fn state_size(&self) -> usize;

    fn is_stateless(&self) -> bool {
        self.state_size() == 0
    }

    /// Scores `edge` given each tail's already-computed state, accumulating
    /// into `features`, and returns this function's state for the new
    /// derivation at `edge.head`.
    fn apply(&self, antecedents: &[&State], edge: &Edge, features: &mut forge_core::feature::FeatureVector, is_final: bool) -> State;

    /// Cheaper approximation of [`FeatureFunction::apply`] used by a coarse
    /// pre-pass. Defaults to the exact computation.
    fn apply_coarse(&self, antecedents: &[&State], edge: &Edge, features: &mut forge_core::feature::FeatureVector, is_final: bool) -> State {
        self.apply(antecedents, edge, features, is_final)
    }

    /// Incremental entry points for left-to-right application outside
    /// cube-growing. Defaults no-op: most functions only need the one-shot
    /// `apply` and never participate in incremental decoding.
    fn apply_predict(&self, _edge: &Edge, _features: &mut forge_core::feature::FeatureVector, _is_final: bool) {}

    fn apply_scan(&self, _antecedents: &[&State], _edge: &Edge, _dot: usize, _features: &mut forge_core::feature::FeatureVector, _is_final: bool) {}

    fn apply_complete(&self, antecedents: &[&State], edge: &Edge, features: &mut forge_core::feature::FeatureVector, is_final: bool) -> State {
        self.apply(antecedents, edge, features, is_final)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_states_compare_equal() {
        assert_eq!(State::empty(), State::empty());
    }

    #[test]
    fn byte_equal_states_compare_equal_regardless_of_allocation() {
        let a = State::from_bytes(vec![1, 2, 3].into_boxed_slice());
        let b = State::from_bytes(vec![1, 2, 3].into_boxed_slice());
        assert_eq!(a, b);
    }

    #[test]
    fn differing_bytes_compare_unequal() {
        let a = State::from_bytes(vec![1, 2, 3].into_boxed_slice());
        let b = State::from_bytes(vec![1, 2, 4].into_boxed_slice());
        assert_ne!(a, b);
    }
}
