//! Attribute names and values carried on edges (e.g. `source-root`,
//! `internal-node`, `glue-tree`) — side-channel bookkeeping distinct from
//! scored features.

use std::collections::BTreeMap;
use std::fmt;

use crate::intern::{InternId, Interner};

static ATTRIBUTES: Interner = Interner::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Attribute(InternId);

impl Attribute {
    pub fn intern(text: &str) -> Self {
        Attribute(ATTRIBUTES.intern(text))
    }

    pub fn as_str(&self) -> String {
        ATTRIBUTES.with_str(self.0, |s| s.to_string())
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<&str> for Attribute {
    fn from(s: &str) -> Self {
        Attribute::intern(s)
    }
}

/// An attribute's payload. Attributes are untyped bookkeeping, so the
/// value carries its own small sum type rather than reusing `f64`.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Bool(bool),
    Int(i64),
    Str(String),
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Bool(b) => write!(f, "{b}"),
            AttributeValue::Int(i) => write!(f, "{i}"),
            AttributeValue::Str(s) => write!(f, "{s:?}"),
        }
    }
}

pub type AttributeMap = BTreeMap<Attribute, AttributeValue>;
