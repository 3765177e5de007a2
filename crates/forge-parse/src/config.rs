use serde::{Deserialize, Serialize};

/// Per-parse tuning knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseConfig {
    /// Hard cap on unary-closure rounds at a single cell. A backstop only:
    /// the closure loop's own termination comes from tracking which labels
    /// have already entered the cell's closure, bounded by the grammar's
    /// distinct label count, not from this limit.
    pub unary_closure_stall_limit: u32,
    /// When several ambiguous derivations reach the goal category over the
    /// full span, pack them under one shared goal node (`true`) instead of
    /// keeping only the first one found.
    pub unique_goal: bool,
}

impl Default for ParseConfig {
    fn default() -> Self {
        ParseConfig {
            unary_closure_stall_limit: 4,
            unique_goal: true,
        }
    }
}
