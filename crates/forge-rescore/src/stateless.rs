//! Naive, no-state rescoring pass: applies a stateless [`Model`] to every
//! edge in topological order, writing scores straight into a copy of the
//! input graph. Grounded on `cicada`'s `ApplyStateLess`.

use forge_core::hypergraph::Hypergraph;

use crate::error::RescoreError;
use crate::model::Model;

/// Applies `model` to every edge of `graph_in`, in topological (bottom-up)
/// order, returning a rescored copy. `model` must be stateless; stateful
/// models need the cube-growing applicator instead.
pub fn apply_state_less(model: &Model, graph_in: &Hypergraph) -> Result<Hypergraph, RescoreError> {
    if !model.is_stateless() {
        return Err(RescoreError::StatefulModelRequired);
    }

    model.initialize();

    let mut graph_out = graph_in.clone();
    for node in &graph_out.nodes.clone() {
        for &edge_id in &node.edges {
            tracing::trace!(edge = edge_id.index(), "stateless rescorer applying model to edge");
            let is_final = graph_out.edges[edge_id.index()].head == graph_out.goal;
            let edge = graph_out.edges[edge_id.index()].clone();
            let mut features = edge.features.clone();
            model.apply(&[], &edge, &mut features, is_final);
            graph_out.edges[edge_id.index()].features = features;
        }
    }

    model.initialize();
    Ok(graph_out)
}
