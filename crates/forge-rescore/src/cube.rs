//! Lazy best-first cube-growing rescorer: per node, a priority heap whose
//! key is the product (in the tropical semiring) of antecedent scores and
//! the current edge's feature score, bounded to `cube_size_max`
//! derivations and deduplicated by `(edge, index-vector)`. Implements Huang
//! & Chiang (2007), "Forest Rescoring: Faster Decoding with Integrated
//! Language Models". Grounded on `cicada`'s `ApplyCubeGrow`.

use std::cmp::Ordering;
use std::collections::hash_map::Entry;
use std::collections::{BinaryHeap, HashMap, HashSet};

use std::rc::Rc;

use forge_core::attribute::AttributeMap;
use forge_core::feature::FeatureVector;
use forge_core::hypergraph::{EdgeId, Hypergraph, NodeId};
use forge_core::rule::Rule;
use forge_core::semiring::{Semiring, Tropical};
use forge_core::sort::topological_sort_unfiltered;

use crate::config::RescoreConfig;
use crate::error::RescoreError;
use crate::feature::CompositeState;
use crate::model::Model;
use crate::stateless::apply_state_less;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct CandidateId(u32);

/// One `(edge, index-vector)` instantiation: the antecedents it draws from
/// (by rank within each tail's `D` list) together with the score and state
/// it produces once every antecedent is resolved.
struct Candidate {
    in_edge: EdgeId,
    j: Vec<u32>,
    out_tails: Vec<NodeId>,
    out_rule: Option<Rc<Rule>>,
    out_features: FeatureVector,
    out_attributes: AttributeMap,
    state: CompositeState,
    score: Tropical,
    out_head: NodeId,
}

/// `Candidate` storage indexed by `u32` handle — no raw pointers, per the
/// cube-growing REDESIGN note.
#[derive(Default)]
struct CandidateArena {
    items: Vec<Candidate>,
}

impl CandidateArena {
    fn push(&mut self, candidate: Candidate) -> CandidateId {
        let id = CandidateId(self.items.len() as u32);
        self.items.push(candidate);
        id
    }

    fn get(&self, id: CandidateId) -> &Candidate {
        &self.items[id.0 as usize]
    }

    fn get_mut(&mut self, id: CandidateId) -> &mut Candidate {
        &mut self.items[id.0 as usize]
    }
}

#[derive(Clone, Copy)]
struct HeapKey {
    id: CandidateId,
    score: Tropical,
    cardinality: u32,
}

impl PartialEq for HeapKey {
    fn eq(&self, other: &Self) -> bool {
        self.score == other.score && self.cardinality == other.cardinality
    }
}
impl Eq for HeapKey {}

impl PartialOrd for HeapKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapKey {
    /// Higher score wins; on a tie, the candidate with the smaller
    /// index-vector sum (the shallower, earlier-enumerated one) wins —
    /// matches `cicada`'s `compare_heap_type`.
    fn cmp(&self, other: &Self) -> Ordering {
        match self.score.cmp(&other.score) {
            Ordering::Equal => self.cardinality.cmp(&other.cardinality).reverse(),
            ord => ord,
        }
    }
}

/// Per-node cube-growing bookkeeping: `cand` is the frontier heap, `buf`
/// holds popped-but-not-yet-admitted items awaiting a firm bound, `d` is
/// the list of admitted derivations in rank order, `uniques` guards against
/// re-firing the same `(edge, j)` pair, and `state_nodes` is the
/// state-merge map for non-goal nodes.
#[derive(Default)]
struct NodeCubeState {
    cand: BinaryHeap<HeapKey>,
    buf: BinaryHeap<HeapKey>,
    d: Vec<CandidateId>,
    uniques: HashSet<(EdgeId, Vec<u32>)>,
    state_nodes: HashMap<CompositeState, NodeId>,
    fired: bool,
}

/// Cube-growing rescorer. `score_fn` maps an edge's accumulated feature
/// vector to a single log-domain contribution combined multiplicatively
/// (tropical `mul`, i.e. summed) with antecedent scores.
pub struct CubeGrowRescorer<'m, F> {
    model: &'m Model,
    score_fn: F,
    config: RescoreConfig,
}

impl<'m, F> CubeGrowRescorer<'m, F>
where
    F: Fn(&FeatureVector) -> f64,
{
    pub fn new(model: &'m Model, score_fn: F, config: RescoreConfig) -> Self {
        CubeGrowRescorer { model, score_fn, config }
    }

    pub fn rescore(&self, graph_in: &Hypergraph) -> Result<Hypergraph, RescoreError> {
        self.model.initialize();

        if self.model.is_stateless() {
            return apply_state_less(self.model, graph_in);
        }

        if !graph_in.has_goal() {
            return Ok(Hypergraph::new());
        }

        let coarse = if self.config.coarse_rescore { Some(self.coarse_baseline(graph_in)) } else { None };

        let mut states: Vec<NodeCubeState> = (0..graph_in.nodes.len()).map(|_| NodeCubeState::default()).collect();
        let mut candidates = CandidateArena::default();
        let mut graph_out = Hypergraph::new();
        let mut node_states_out: Vec<CompositeState> = Vec::new();
        let mut scores_out: Vec<Tropical> = Vec::new();

        for j in 0..self.config.cube_size_max {
            tracing::trace!(j, edges_so_far = graph_out.edges.len(), "cube-growing rescorer expanding rank");
            let edges_before = graph_out.edges.len();
            self.lazy_jth_best(
                graph_in.goal,
                j,
                graph_in,
                &mut graph_out,
                &mut states,
                &mut candidates,
                &mut node_states_out,
                &mut scores_out,
                coarse.as_deref(),
            );
            if graph_out.edges.len() == edges_before {
                break;
            }
        }

        let sorted = topological_sort_unfiltered(&graph_out)?;
        self.model.initialize();
        Ok(sorted)
    }

    #[allow(clippy::too_many_arguments)]
    fn lazy_jth_best(
        &self,
        v: NodeId,
        j: usize,
        graph_in: &Hypergraph,
        graph_out: &mut Hypergraph,
        states: &mut [NodeCubeState],
        candidates: &mut CandidateArena,
        node_states_out: &mut Vec<CompositeState>,
        scores_out: &mut Vec<Tropical>,
        coarse: Option<&[Tropical]>,
    ) {
        let is_goal = graph_in.goal == v;

        if !states[v.index()].fired {
            let edges: Vec<EdgeId> = graph_in.nodes[v.index()].edges.clone();
            for edge_id in edges {
                let arity = graph_in.edges[edge_id.index()].tails.len();
                self.fire(edge_id, vec![0; arity], v, graph_in, graph_out, states, candidates, node_states_out, scores_out, coarse);
            }
            states[v.index()].fired = true;
        }

        while states[v.index()].d.len() <= j
            && states[v.index()].buf.len() + states[v.index()].d.len() < self.config.cube_size_max
            && !states[v.index()].cand.is_empty()
        {
            let top = states[v.index()].cand.pop().expect("checked non-empty above");
            states[v.index()].buf.push(top);
            self.push_succ(top.id, v, graph_in, graph_out, states, candidates, node_states_out, scores_out, coarse);

            if let Some(&next) = states[v.index()].cand.peek() {
                self.enum_item(v, next.score, is_goal, graph_out, states, candidates, node_states_out, scores_out);
            }
        }

        self.enum_item(v, Tropical::zero(), is_goal, graph_out, states, candidates, node_states_out, scores_out);
    }

    #[allow(clippy::too_many_arguments)]
    fn fire(
        &self,
        edge_id: EdgeId,
        j: Vec<u32>,
        v: NodeId,
        graph_in: &Hypergraph,
        graph_out: &mut Hypergraph,
        states: &mut [NodeCubeState],
        candidates: &mut CandidateArena,
        node_states_out: &mut Vec<CompositeState>,
        scores_out: &mut Vec<Tropical>,
        coarse: Option<&[Tropical]>,
    ) {
        let key = (edge_id, j.clone());
        if states[v.index()].uniques.contains(&key) {
            return;
        }

        let tails = graph_in.edges[edge_id.index()].tails.clone();
        for (i, &tail) in tails.iter().enumerate() {
            self.lazy_jth_best(tail, j[i] as usize, graph_in, graph_out, states, candidates, node_states_out, scores_out, coarse);
            if states[tail.index()].d.len() <= j[i] as usize {
                return;
            }
        }

        let Some(candidate) = self.make_candidate(edge_id, j.clone(), graph_in, states, candidates, node_states_out, scores_out, coarse) else {
            return;
        };
        let cardinality = candidate.j.iter().sum();
        let score = candidate.score;
        let id = candidates.push(candidate);
        states[v.index()].uniques.insert(key);
        states[v.index()].cand.push(HeapKey { id, score, cardinality });
    }

    #[allow(clippy::too_many_arguments)]
    fn push_succ(
        &self,
        id: CandidateId,
        v: NodeId,
        graph_in: &Hypergraph,
        graph_out: &mut Hypergraph,
        states: &mut [NodeCubeState],
        candidates: &mut CandidateArena,
        node_states_out: &mut Vec<CompositeState>,
        scores_out: &mut Vec<Tropical>,
        coarse: Option<&[Tropical]>,
    ) {
        let (edge_id, j) = {
            let candidate = candidates.get(id);
            (candidate.in_edge, candidate.j.clone())
        };
        for i in 0..j.len() {
            let mut next = j.clone();
            next[i] += 1;
            self.fire(edge_id, next, v, graph_in, graph_out, states, candidates, node_states_out, scores_out, coarse);
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn make_candidate(
        &self,
        edge_id: EdgeId,
        j: Vec<u32>,
        graph_in: &Hypergraph,
        states: &[NodeCubeState],
        candidates: &CandidateArena,
        node_states_out: &[CompositeState],
        scores_out: &[Tropical],
        coarse: Option<&[Tropical]>,
    ) -> Option<Candidate> {
        let edge = &graph_in.edges[edge_id.index()];
        let mut out_tails = Vec::with_capacity(edge.tails.len());
        let mut antecedent_states = Vec::with_capacity(edge.tails.len());
        let mut score = Tropical::one();

        for (i, &tail) in edge.tails.iter().enumerate() {
            let antecedent_id = *states[tail.index()].d.get(j[i] as usize)?;
            let antecedent = candidates.get(antecedent_id);
            out_tails.push(antecedent.out_head);
            antecedent_states.push(node_states_out[antecedent.out_head.index()].clone());
            score = score.mul(scores_out[antecedent.out_head.index()]);
        }

        let is_final = graph_in.goal == edge.head;
        let mut features = edge.features.clone();
        let state = self.model.apply(&antecedent_states, edge, &mut features, is_final);
        score = score.mul(Tropical((self.score_fn)(&features)));

        if let Some(baseline) = coarse {
            score = Tropical(score.0 - baseline[edge.head.index()].0);
        }

        Some(Candidate {
            in_edge: edge_id,
            j,
            out_tails,
            out_rule: edge.rule.clone(),
            out_features: features,
            out_attributes: edge.attributes.clone(),
            state,
            score,
            out_head: NodeId::INVALID,
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn enum_item(
        &self,
        v: NodeId,
        bound: Tropical,
        is_goal: bool,
        graph_out: &mut Hypergraph,
        states: &mut [NodeCubeState],
        candidates: &mut CandidateArena,
        node_states_out: &mut Vec<CompositeState>,
        scores_out: &mut Vec<Tropical>,
    ) {
        loop {
            let Some(&top) = states[v.index()].buf.peek() else { break };
            if top.score <= bound {
                break;
            }
            states[v.index()].buf.pop();

            let head = if is_goal {
                if graph_out.has_goal() {
                    let g = graph_out.goal;
                    scores_out[g.index()] = scores_out[g.index()].add(candidates.get(top.id).score);
                    g
                } else {
                    node_states_out.push(candidates.get(top.id).state.clone());
                    scores_out.push(candidates.get(top.id).score);
                    graph_out.goal = graph_out.add_node();
                    graph_out.goal
                }
            } else {
                let state = candidates.get(top.id).state.clone();
                match states[v.index()].state_nodes.entry(state.clone()) {
                    Entry::Occupied(e) => {
                        let head = *e.get();
                        scores_out[head.index()] = scores_out[head.index()].add(candidates.get(top.id).score);
                        head
                    }
                    Entry::Vacant(e) => {
                        node_states_out.push(state);
                        scores_out.push(candidates.get(top.id).score);
                        let head = graph_out.add_node();
                        e.insert(head);
                        head
                    }
                }
            };

            candidates.get_mut(top.id).out_head = head;

            let (tails, rule, features, attributes) = {
                let candidate = candidates.get(top.id);
                (
                    candidate.out_tails.clone(),
                    candidate.out_rule.clone(),
                    candidate.out_features.clone(),
                    candidate.out_attributes.clone(),
                )
            };

            let edge_id = graph_out.add_edge(tails, rule, features, attributes);
            graph_out.connect_edge(edge_id, head);

            states[v.index()].d.push(top.id);
        }
    }

    /// One-best coarse pre-pass: assumes `graph_in` is topologically sorted
    /// bottom-up (true of every composer/parser output in this workspace),
    /// so a single forward scan suffices instead of recursion.
    fn coarse_baseline(&self, graph_in: &Hypergraph) -> Vec<Tropical> {
        let mut best = vec![Tropical::zero(); graph_in.nodes.len()];
        for (node_id, node) in graph_in.nodes.iter().enumerate() {
            for &edge_id in &node.edges {
                let edge = &graph_in.edges[edge_id.index()];
                let mut antecedents = Vec::with_capacity(edge.tails.len());
                let mut score = Tropical::one();
                for &tail in &edge.tails {
                    score = score.mul(best[tail.index()]);
                    antecedents.push(CompositeState::stateless(self.model.len()));
                }
                let mut features = edge.features.clone();
                let is_final = graph_in.goal.index() == node_id;
                self.model.apply_coarse(&antecedents, edge, &mut features, is_final);
                score = score.mul(Tropical((self.score_fn)(&features)));
                if score > best[node_id] {
                    best[node_id] = score;
                }
            }
        }
        best
    }
}
