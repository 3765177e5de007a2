//! Benchmarks for the three loops that dominate decode time: rebuilding a
//! topologically-sorted hypergraph, cube-growing rescoring, and CKY span
//! processing.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use forge_compose::{PhraseTransducer, TrieGrammar};
use forge_core::feature::{Feature, FeatureVector};
use forge_core::hypergraph::{Edge, Hypergraph};
use forge_core::lattice::Lattice;
use forge_core::rule::intern_rule;
use forge_core::sort::topological_sort_unfiltered;
use forge_core::symbol::Symbol;
use forge_parse::{CkyParser, ParseConfig};
use forge_rescore::{FeatureFunction, Model, RescoreConfig, State};

fn leaf_rule(sym: &str) -> std::rc::Rc<forge_core::rule::Rule> {
    intern_rule(Symbol::intern(sym), vec![Symbol::intern("w")])
}

/// A long bottom-up chain: each edge has one tail, the prior edge's head.
fn chain_graph(depth: usize) -> Hypergraph {
    let mut g = Hypergraph::new();
    let mut prev = g.add_edge_to_new_node(vec![], Some(leaf_rule("[X0]")), FeatureVector::new(), Default::default());
    for i in 1..depth {
        let rule = leaf_rule(&format!("[X{i}]"));
        prev = g.add_edge_to_new_node(vec![prev], Some(rule), FeatureVector::new(), Default::default());
    }
    g.goal = prev;
    g
}

fn bench_topological_sort(c: &mut Criterion) {
    let graph = chain_graph(500);
    c.bench_function("topological_sort/chain_500", |b| {
        b.iter(|| topological_sort_unfiltered(black_box(&graph)).unwrap());
    });
}

/// Three alternative translations of a single-category span, fanning into
/// a shared goal node — the bread-and-butter shape cube-growing ranks.
fn fan_in_graph(width: usize) -> Hypergraph {
    let mut g = Hypergraph::new();
    let goal_rule = leaf_rule("[S]");
    let goal = g.add_node();
    for i in 0..width {
        let rule = intern_rule(Symbol::intern("[X]"), vec![Symbol::intern("w")]);
        let mut features = FeatureVector::new();
        features.insert(Feature::intern("score"), -(i as f64) * 0.01);
        let leaf = g.add_edge_to_new_node(vec![], Some(rule), features, Default::default());
        let edge = g.add_edge(vec![leaf], Some(goal_rule.clone()), FeatureVector::new(), Default::default());
        g.connect_edge(edge, goal);
    }
    g.goal = goal;
    g
}

struct ConstantCost;

impl FeatureFunction for ConstantCost {
    fn state_size(&self) -> usize {
        4
    }

    fn apply(&self, _antecedents: &[&State], _edge: &Edge, features: &mut FeatureVector, _is_final: bool) -> State {
        *features.entry(Feature::intern("score")).or_insert(0.0) += -0.1;
        State::from_bytes(vec![0; 4].into_boxed_slice())
    }
}

fn score_of(features: &FeatureVector) -> f64 {
    features.get(&Feature::intern("score")).copied().unwrap_or(0.0)
}

fn bench_cube_growing(c: &mut Criterion) {
    let graph = fan_in_graph(64);
    let mut model = Model::new();
    model.push(Box::new(ConstantCost));
    let config = RescoreConfig { cube_size_max: 16, coarse_rescore: false };

    c.bench_function("cube_growing/fan_in_64_cube_16", |b| {
        b.iter(|| {
            let rescorer = forge_rescore::CubeGrowRescorer::new(&model, score_of, config.clone());
            black_box(rescorer.rescore(black_box(&graph)).unwrap())
        });
    });
}

fn grammar_with(entries: &[(&str, &[&str])]) -> TrieGrammar {
    let mut g = TrieGrammar::new();
    for (lhs, rhs) in entries {
        let rhs_symbols: Vec<Symbol> = rhs.iter().map(|s| Symbol::intern(s)).collect();
        let source: Vec<Symbol> = rhs_symbols.iter().map(|s| s.non_terminal()).collect();
        let rule = intern_rule(Symbol::intern(lhs), rhs_symbols);
        g.insert(&source, rule, FeatureVector::new());
    }
    g
}

fn bench_cky_parse(c: &mut Criterion) {
    let grammar = grammar_with(&[
        ("[NP]", &["the", "dog"]),
        ("[NP]", &["the", "cat"]),
        ("[VP]", &["chased", "[NP]"]),
        ("[S]", &["[NP]", "[VP]"]),
    ]);
    let grammars: Vec<Box<dyn PhraseTransducer>> = vec![Box::new(grammar)];
    let parser = CkyParser::new(Symbol::intern("[S]"), &grammars, ParseConfig::default());
    let sentence: Vec<Symbol> = ["the", "dog", "chased", "the", "cat"].iter().map(|s| Symbol::intern(s)).collect();
    let lattice = Lattice::from_sentence(sentence);

    c.bench_function("cky_parse/five_word_sentence", |b| {
        b.iter(|| parser.parse(black_box(&lattice)).unwrap());
    });
}

criterion_group!(benches, bench_topological_sort, bench_cube_growing, bench_cky_parse);
criterion_main!(benches);
