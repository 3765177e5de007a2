//! Interned terminal/non-terminal tokens.
//!
//! A non-terminal is written `[CAT]` or `[CAT,k]`, where `k` is a 1-based
//! index into the rule's right-hand side identifying which antecedent it
//! aligns to (`0`, or an absent index, means "positional" — resolved by
//! position rather than by an explicit index). A terminal carrying a
//! part-of-speech signature is written `word|POS`; annotations layered onto
//! a non-terminal category are written `CAT^a^b` (finest-to-coarsest,
//! left-to-right), so `coarse(0)` strips all annotations down to the bare
//! category and `coarse(n)` keeps the first `n` annotation levels.

use std::fmt;

use crate::intern::{InternId, Interner};

static SYMBOLS: Interner = Interner::new();

/// An interned terminal or non-terminal token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol(InternId);

impl Symbol {
    /// Interns `text` verbatim and returns the handle for it.
    pub fn intern(text: &str) -> Self {
        Symbol(SYMBOLS.intern(text))
    }

    /// Returns the original text this symbol was interned from.
    pub fn as_str(&self) -> String {
        SYMBOLS.with_str(self.0, |s| s.to_string())
    }

    pub fn with_str<R>(&self, f: impl FnOnce(&str) -> R) -> R {
        SYMBOLS.with_str(self.0, f)
    }

    /// `true` iff the token is bracketed, e.g. `[X]` or `[X,2]`.
    pub fn is_non_terminal(&self) -> bool {
        self.with_str(|s| s.len() >= 2 && s.starts_with('[') && s.ends_with(']'))
    }

    /// The 1-based antecedent index carried by a non-terminal, if any.
    /// `[X]` has no index (`None`); `[X,2]` has index `Some(2)`.
    pub fn non_terminal_index(&self) -> Option<usize> {
        self.with_str(|s| {
            if !(s.starts_with('[') && s.ends_with(']')) {
                return None;
            }
            let inner = &s[1..s.len() - 1];
            let comma = inner.rfind(',')?;
            inner[comma + 1..].parse::<usize>().ok()
        })
    }

    /// Strips the antecedent index, leaving the bare non-terminal category.
    /// `[X,2].non_terminal() == [X]`. Terminals and already-bare
    /// non-terminals are returned unchanged.
    pub fn non_terminal(&self) -> Symbol {
        self.with_str(|s| {
            if !(s.starts_with('[') && s.ends_with(']')) {
                return *self;
            }
            let inner = &s[1..s.len() - 1];
            match inner.rfind(',') {
                Some(comma) if inner[comma + 1..].parse::<usize>().is_ok() => {
                    Symbol::intern(&format!("[{}]", &inner[..comma]))
                }
                _ => *self,
            }
        })
    }

    /// Builds the non-terminal `[CAT,k]` for this symbol's bare category,
    /// with antecedent index `k`. If `k == 0`, the bare `[CAT]` form is
    /// returned (a positional, unindexed non-terminal).
    pub fn non_terminal_with_index(&self, k: usize) -> Symbol {
        let base = self.non_terminal();
        if k == 0 {
            return base;
        }
        base.with_str(|s| Symbol::intern(&format!("[{},{}]", &s[1..s.len() - 1], k)))
    }

    /// Strips annotation levels beyond `depth`. Annotations are `^`-joined
    /// suffixes on a non-terminal category: `[NP^S^VP]`.`coarse(0)` is
    /// `[NP]`; `coarse(1)` is `[NP^S]`.
    pub fn coarse(&self, depth: usize) -> Symbol {
        self.with_str(|s| {
            if !(s.starts_with('[') && s.ends_with(']')) {
                return *self;
            }
            let inner = &s[1..s.len() - 1];
            let mut parts = inner.split('^');
            let base = parts.next().unwrap_or("");
            let kept: Vec<&str> = parts.take(depth).collect();
            if kept.is_empty() {
                Symbol::intern(&format!("[{}]", base))
            } else {
                Symbol::intern(&format!("[{}^{}]", base, kept.join("^")))
            }
        })
    }

    /// Splits a `word|POS` terminal into `(terminal, Some(pos))`, or
    /// `(self, None)` if there is no `|`-delimited signature.
    pub fn split_pos(&self) -> (Symbol, Option<Symbol>) {
        self.with_str(|s| match s.find('|') {
            Some(pipe) => (
                Symbol::intern(&s[..pipe]),
                Some(Symbol::intern(&s[pipe + 1..])),
            ),
            None => (*self, None),
        })
    }

    /// The terminal part of a `word|POS` token (or the whole token if bare).
    pub fn terminal(&self) -> Symbol {
        self.split_pos().0
    }

    /// The part-of-speech signature of a `word|POS` token, if present.
    pub fn pos(&self) -> Option<Symbol> {
        self.split_pos().1
    }

    pub fn epsilon() -> Symbol {
        Symbol::intern("<epsilon>")
    }

    pub fn bos() -> Symbol {
        Symbol::intern("<s>")
    }

    pub fn eos() -> Symbol {
        Symbol::intern("</s>")
    }

    pub fn none() -> Symbol {
        Symbol::intern("<none>")
    }

    pub fn goal() -> Symbol {
        Symbol::intern("[GOAL]")
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Symbol::intern(s)
    }
}
