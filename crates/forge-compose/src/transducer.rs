//! The `Transducer` seam a phrase grammar exposes to the composer: walk
//! one terminal at a time from `root()`, and ask the node you land on for
//! its rule alternatives. [`TrieGrammar`] is the one concrete
//! implementation — a phrase table stored as a prefix trie so that shared
//! phrase prefixes share traversal state, the same incremental-match shape
//! `cicada`'s on-disk grammars expose.

use std::collections::HashMap;
use std::rc::Rc;

use forge_core::feature::FeatureVector;
use forge_core::rule::Rule;
use forge_core::symbol::Symbol;

pub type TransducerNode = u32;

/// A source-side phrase table walked one terminal at a time.
pub trait PhraseTransducer {
    fn root(&self) -> TransducerNode;
    /// Advances `node` by matching `terminal`, or `None` if no phrase in
    /// the table continues this way.
    fn next(&self, node: TransducerNode, terminal: Symbol) -> Option<TransducerNode>;
    /// Rule alternatives complete at `node` (the phrase matched so far is a
    /// full entry). Empty if no entry ends exactly here.
    fn rules(&self, node: TransducerNode) -> &[(Rc<Rule>, FeatureVector)];
}

#[derive(Default)]
struct TrieNode {
    children: HashMap<Symbol, TransducerNode>,
    rules: Vec<(Rc<Rule>, FeatureVector)>,
}

/// An in-memory phrase grammar: source phrases mapped to target rule
/// alternatives, stored as a trie over source terminals.
pub struct TrieGrammar {
    nodes: Vec<TrieNode>,
}

impl TrieGrammar {
    pub fn new() -> Self {
        TrieGrammar { nodes: vec![TrieNode::default()] }
    }

    /// Adds one `source phrase -> rule` entry with its feature contribution.
    pub fn insert(&mut self, source: &[Symbol], rule: Rc<Rule>, features: FeatureVector) {
        let mut node = 0usize;
        for &terminal in source {
            node = match self.nodes[node].children.get(&terminal) {
                Some(&next) => next as usize,
                None => {
                    let new_id = self.nodes.len() as TransducerNode;
                    self.nodes.push(TrieNode::default());
                    self.nodes[node].children.insert(terminal, new_id);
                    new_id as usize
                }
            };
        }
        self.nodes[node].rules.push((rule, features));
    }
}

impl Default for TrieGrammar {
    fn default() -> Self {
        Self::new()
    }
}

impl PhraseTransducer for TrieGrammar {
    fn root(&self) -> TransducerNode {
        0
    }

    fn next(&self, node: TransducerNode, terminal: Symbol) -> Option<TransducerNode> {
        self.nodes[node as usize].children.get(&terminal).copied()
    }

    fn rules(&self, node: TransducerNode) -> &[(Rc<Rule>, FeatureVector)] {
        &self.nodes[node as usize].rules
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forge_core::rule::intern_rule;

    #[test]
    fn matches_inserted_phrase_terminal_by_terminal() {
        let mut grammar = TrieGrammar::new();
        let rule = intern_rule(Symbol::intern("[X]"), vec![Symbol::intern("dog")]);
        grammar.insert(&[Symbol::intern("the"), Symbol::intern("dog")], rule, FeatureVector::new());

        let n1 = grammar.next(grammar.root(), Symbol::intern("the")).unwrap();
        assert!(grammar.rules(n1).is_empty());
        let n2 = grammar.next(n1, Symbol::intern("dog")).unwrap();
        assert_eq!(grammar.rules(n2).len(), 1);
    }

    #[test]
    fn unmatched_terminal_returns_none() {
        let grammar = TrieGrammar::new();
        assert!(grammar.next(grammar.root(), Symbol::intern("anything")).is_none());
    }
}
