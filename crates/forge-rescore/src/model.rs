//! A model composed of many feature functions, applied in a fixed stack
//! order. Grounded on `cicada`'s `Model`.

use forge_core::feature::FeatureVector;
use forge_core::hypergraph::Edge;

use crate::feature::{CompositeState, FeatureFunction, State};

/// Stacks feature functions and applies them together, one state slot per
/// function in stack order.
#[derive(Default)]
pub struct Model {
    functions: Vec<Box<dyn FeatureFunction>>,
}

impl Model {
    pub fn new() -> Self {
        Model { functions: Vec::new() }
    }

    pub fn push(&mut self, function: Box<dyn FeatureFunction>) {
        self.functions.push(function);
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    /// Sum of every stacked function's state size. `0` iff every function is
    /// stateless.
    pub fn state_size(&self) -> usize {
        self.functions.iter().map(|f| f.state_size()).sum()
    }

    pub fn is_stateless(&self) -> bool {
        self.state_size() == 0
    }

    /// Combined, fully-exact application: every function scores `edge`
    /// given its own antecedent sub-states, accumulating into `features`.
    pub fn apply(&self, node_states: &[CompositeState], edge: &Edge, features: &mut FeatureVector, is_final: bool) -> CompositeState {
        self.apply_with(|f, ants, e, feats, fin| f.apply(ants, e, feats, fin), node_states, edge, features, is_final)
    }

    /// Same as [`Model::apply`], using each function's cheaper coarse score.
    pub fn apply_coarse(&self, node_states: &[CompositeState], edge: &Edge, features: &mut FeatureVector, is_final: bool) -> CompositeState {
        self.apply_with(|f, ants, e, feats, fin| f.apply_coarse(ants, e, feats, fin), node_states, edge, features, is_final)
    }

    fn apply_with(
        &self,
        call: impl Fn(&dyn FeatureFunction, &[&State], &Edge, &mut FeatureVector, bool) -> State,
        node_states: &[CompositeState],
        edge: &Edge,
        features: &mut FeatureVector,
        is_final: bool,
    ) -> CompositeState {
        let mut composite = Vec::with_capacity(self.functions.len());
        for (i, function) in self.functions.iter().enumerate() {
            let antecedents: Vec<&State> = node_states.iter().map(|ns| &ns.0[i]).collect();
            composite.push(call(function.as_ref(), &antecedents, edge, features, is_final));
        }
        CompositeState(composite)
    }

    pub fn clone_state(&self, state: &CompositeState) -> CompositeState {
        state.clone()
    }

    /// No-op: unlike the reference implementation's per-thread interning
    /// tables, [`forge_core::intern::Interner`] is process-wide and needs no
    /// per-model setup or teardown. Kept for API parity with callers that
    /// expect to call this once before applying the model.
    pub fn initialize(&self) {}

    pub fn deallocate(&self, _state: CompositeState) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use forge_core::attribute::AttributeMap;
    use forge_core::symbol::Symbol;

    struct WordCount;

    impl FeatureFunction for WordCount {
        fn state_size(&self) -> usize {
            0
        }

        fn apply(&self, _antecedents: &[&State], edge: &Edge, features: &mut FeatureVector, _is_final: bool) -> State {
            let count = edge.tails.len() as f64;
            features.insert(forge_core::feature::Feature::intern("word"), count);
            State::empty()
        }
    }

    #[test]
    fn stateless_model_has_zero_state_size() {
        let mut model = Model::new();
        model.push(Box::new(WordCount));
        assert!(model.is_stateless());
        assert_eq!(model.state_size(), 0);
    }

    #[test]
    fn apply_accumulates_features_from_every_function() {
        let mut model = Model::new();
        model.push(Box::new(WordCount));

        let rule = forge_core::rule::intern_rule(Symbol::intern("[S]"), vec![Symbol::intern("a")]);
        let edge = Edge {
            id: forge_core::hypergraph::EdgeId(0),
            head: forge_core::hypergraph::NodeId(0),
            tails: vec![],
            rule: Some(rule),
            features: FeatureVector::new(),
            attributes: AttributeMap::default(),
        };

        let mut features = FeatureVector::new();
        let state = model.apply(&[], &edge, &mut features, true);
        assert_eq!(features[&forge_core::feature::Feature::intern("word")], 0.0);
        assert!(state.0[0].is_empty());
    }
}
