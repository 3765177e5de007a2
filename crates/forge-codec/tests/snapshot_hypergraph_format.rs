//! Snapshot tests for the k-best output line format.
//!
//! These pin the exact textual shape `serialize_hypergraph`/`serialize_weights`
//! produce, so a change to the wire convention shows up as a diff here
//! instead of silently drifting.

use forge_codec::hypergraph_format::serialize_hypergraph;
use forge_codec::weights_format::{serialize_weights, weights_one, Weights};
use forge_core::feature::{Feature, FeatureVector};
use forge_core::hypergraph::Hypergraph;
use forge_core::rule::intern_rule;
use forge_core::symbol::Symbol;

fn two_edge_graph() -> Hypergraph {
    let mut g = Hypergraph::new();
    let rule = intern_rule(Symbol::intern("[A]"), vec![Symbol::intern("x")]);
    let mut feats = FeatureVector::new();
    feats.insert(Feature::intern("lm"), 0.5);
    let leaf = g.add_edge_to_new_node(vec![], Some(rule), feats, Default::default());
    let goal_rule = intern_rule(Symbol::intern("[GOAL]"), vec![Symbol::intern("[A,1]")]);
    g.goal = g.add_edge_to_new_node(vec![leaf], Some(goal_rule), FeatureVector::new(), Default::default());
    g
}

#[test]
fn two_edge_graph_serializes_to_the_expected_line() {
    let line = serialize_hypergraph(7, &two_edge_graph());
    insta::assert_snapshot!("hypergraph_two_edge_line", line);
}

#[test]
fn rule_less_glue_edge_serializes_with_a_dash_lhs() {
    let mut g = Hypergraph::new();
    let a = g.add_node();
    g.goal = g.add_edge_to_new_node(vec![a], None, FeatureVector::new(), Default::default());
    let line = serialize_hypergraph(0, &g);
    insta::assert_snapshot!("hypergraph_glue_edge_line", line);
}

#[test]
fn weights_file_serializes_features_in_sorted_order() {
    let mut weights = Weights::new();
    weights.insert(Feature::intern("tm"), -0.25);
    weights.insert(Feature::intern("lm"), 0.5);
    weights.insert(Feature::intern("wp"), 1.0);
    insta::assert_snapshot!("weights_sorted_order", serialize_weights(&weights));
}

#[test]
fn weights_one_serializes_every_feature_as_unity() {
    let weights = weights_one([Feature::intern("lm"), Feature::intern("tm")]);
    insta::assert_snapshot!("weights_one_output", serialize_weights(&weights));
}
