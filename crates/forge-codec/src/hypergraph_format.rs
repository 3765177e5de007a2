//! The `id ||| <graph> ||| goal=N` k-best output line.
//!
//! `<graph>` is `||`-separated node records; each node record is
//! `;;`-separated edge records; each edge record is
//! `lhs->rhs,tokens/tail,ids/feat=val,.../attr=val,...` (`lhs` of `-` marks
//! a rule-less edge, e.g. a glue edge). This is an internal convention for
//! round-tripping k-best output, not a compatibility target with any
//! external tool.

use forge_core::attribute::{Attribute, AttributeMap, AttributeValue};
use forge_core::feature::{Feature, FeatureVector};
use forge_core::hypergraph::{Edge, Hypergraph, NodeId};
use forge_core::rule::intern_rule;
use forge_core::symbol::Symbol;

use crate::error::CodecError;
use crate::location::Location;

fn parse_feature_token(token: &str, out: &mut FeatureVector, err: impl Fn() -> CodecError) -> Result<(), CodecError> {
    let (key, value) = token.split_once('=').ok_or_else(&err)?;
    let value: f64 = value.parse().map_err(|_| err())?;
    out.insert(Feature::intern(key), value);
    Ok(())
}

fn parse_attribute_token(token: &str, out: &mut AttributeMap, err: impl Fn() -> CodecError) -> Result<(), CodecError> {
    let (key, value) = token.split_once('=').ok_or_else(&err)?;
    let parsed = match value {
        "true" => AttributeValue::Bool(true),
        "false" => AttributeValue::Bool(false),
        _ => match value.parse::<i64>() {
            Ok(i) => AttributeValue::Int(i),
            Err(_) => AttributeValue::Str(value.to_string()),
        },
    };
    out.insert(Attribute::intern(key), parsed);
    Ok(())
}

fn serialize_edge(edge: &Edge) -> String {
    let (lhs, rhs) = match &edge.rule {
        Some(rule) => (
            rule.lhs.to_string(),
            rule.rhs.iter().map(Symbol::to_string).collect::<Vec<_>>().join(","),
        ),
        None => ("-".to_string(), String::new()),
    };
    let tails = edge.tails.iter().map(|t| t.index().to_string()).collect::<Vec<_>>().join(",");
    let feats = edge.features.iter().map(|(f, v)| format!("{f}={v}")).collect::<Vec<_>>().join(",");
    let attrs = edge.attributes.iter().map(|(a, v)| format!("{a}={v}")).collect::<Vec<_>>().join(",");
    format!("{lhs}->{rhs}/{tails}/{feats}/{attrs}")
}

fn parse_edge(text: &str, lineno_hint: usize) -> Result<(Option<Symbol>, Vec<Symbol>, Vec<NodeId>, FeatureVector, AttributeMap), CodecError> {
    let bad = || CodecError::parse(Location { line: lineno_hint, column: 1, offset: 0 }, format!("malformed edge record {text:?}"));

    let mut fields = text.splitn(4, '/');
    let head = fields.next().ok_or_else(bad)?;
    let tails_text = fields.next().unwrap_or("");
    let feats_text = fields.next().unwrap_or("");
    let attrs_text = fields.next().unwrap_or("");

    let (lhs_text, rhs_text) = head.split_once("->").ok_or_else(bad)?;
    let lhs = if lhs_text == "-" { None } else { Some(Symbol::intern(lhs_text)) };
    let rhs: Vec<Symbol> = rhs_text.split(',').filter(|s| !s.is_empty()).map(Symbol::intern).collect();

    let tails: Vec<NodeId> = tails_text
        .split(',')
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<u32>().map(NodeId).map_err(|_| bad()))
        .collect::<Result<_, _>>()?;

    let mut features = FeatureVector::new();
    for token in feats_text.split(',').filter(|s| !s.is_empty()) {
        parse_feature_token(token, &mut features, bad)?;
    }
    let mut attributes = AttributeMap::new();
    for token in attrs_text.split(',').filter(|s| !s.is_empty()) {
        parse_attribute_token(token, &mut attributes, bad)?;
    }

    Ok((lhs, rhs, tails, features, attributes))
}

pub fn serialize_hypergraph(id: usize, graph: &Hypergraph) -> String {
    let nodes: Vec<String> = graph
        .nodes
        .iter()
        .map(|node| {
            node.edges
                .iter()
                .map(|&eid| serialize_edge(&graph.edges[eid.index()]))
                .collect::<Vec<_>>()
                .join(";;")
        })
        .collect();
    format!("{} ||| {} ||| goal={}", id, nodes.join("||"), graph.goal.index())
}

pub fn parse_hypergraph(input: &str) -> Result<(usize, Hypergraph), CodecError> {
    let mut parts = input.trim().splitn(3, "|||").map(str::trim);
    let id_text = parts.next().ok_or_else(|| CodecError::parse(Location::start(), "missing id field"))?;
    let body = parts.next().ok_or_else(|| CodecError::parse(Location::start(), "missing graph body"))?;
    let goal_text = parts.next().ok_or_else(|| CodecError::parse(Location::start(), "missing goal field"))?;

    let id: usize = id_text
        .parse()
        .map_err(|_| CodecError::parse(Location::start(), format!("invalid id {id_text:?}")))?;

    let mut graph = Hypergraph::new();
    let node_texts: Vec<&str> = if body.is_empty() { Vec::new() } else { body.split("||").collect() };
    for _ in &node_texts {
        graph.add_node();
    }
    for (node_index, node_text) in node_texts.iter().enumerate() {
        if node_text.is_empty() {
            continue;
        }
        for edge_text in node_text.split(";;") {
            let (lhs, rhs, tails, features, attributes) = parse_edge(edge_text, node_index + 1)?;
            let rule = lhs.map(|l| intern_rule(l, rhs));
            let edge = graph.add_edge(tails, rule, features, attributes);
            graph.connect_edge(edge, NodeId(node_index as u32));
        }
    }

    let goal_index: u32 = goal_text
        .strip_prefix("goal=")
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| CodecError::parse(Location::start(), format!("invalid goal field {goal_text:?}")))?;
    graph.goal = NodeId(goal_index);

    Ok((id, graph))
}

#[cfg(test)]
mod tests {
    use super::*;
    use forge_core::feature::FeatureVector as FV;

    #[test]
    fn round_trips_a_small_graph() {
        let mut g = Hypergraph::new();
        let rule = intern_rule(Symbol::intern("[A]"), vec![Symbol::intern("x")]);
        let mut feats = FV::new();
        feats.insert(Feature::intern("lm"), 0.5);
        let leaf = g.add_edge_to_new_node(vec![], Some(rule), feats, Default::default());
        let goal_rule = intern_rule(Symbol::intern("[GOAL]"), vec![Symbol::intern("[A,1]")]);
        g.goal = g.add_edge_to_new_node(vec![leaf], Some(goal_rule), FV::new(), Default::default());

        let line = serialize_hypergraph(7, &g);
        let (id, reparsed) = parse_hypergraph(&line).unwrap();
        assert_eq!(id, 7);
        assert_eq!(reparsed.nodes.len(), g.nodes.len());
        assert_eq!(reparsed.goal, g.goal);
        assert_eq!(reparsed.edges[0].features, g.edges[0].features);
        assert!(reparsed.is_valid());
    }

    #[test]
    fn rule_less_glue_edge_round_trips() {
        let mut g = Hypergraph::new();
        let a = g.add_node();
        g.goal = g.add_edge_to_new_node(vec![a], None, FV::new(), Default::default());

        let line = serialize_hypergraph(0, &g);
        let (_, reparsed) = parse_hypergraph(&line).unwrap();
        assert!(reparsed.edges[0].rule.is_none());
    }
}
