//! Process-wide symbol/feature/attribute interning.
//!
//! The reference implementation keeps one interning table per thread,
//! rebuilt lazily and torn down at thread exit. That only works because the
//! reference never compares symbols interned on different threads. We
//! instead use a single process-wide table behind a mutex: every comparison
//! becomes integer equality, and identifiers are stable for the life of the
//! process regardless of which thread interned them first.

use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};

/// A stable integer handle into an [`Interner`] table. `u32::MAX` is never
/// allocated, so it is free to use as a sentinel by callers that need one.
pub type InternId = u32;

struct Table {
    to_id: HashMap<Box<str>, InternId>,
    to_str: Vec<Box<str>>,
}

impl Table {
    fn new() -> Self {
        Table {
            to_id: HashMap::new(),
            to_str: Vec::new(),
        }
    }

    fn intern(&mut self, text: &str) -> InternId {
        if let Some(&id) = self.to_id.get(text) {
            return id;
        }
        let id = self.to_str.len() as InternId;
        let boxed: Box<str> = text.into();
        self.to_str.push(boxed.clone());
        self.to_id.insert(boxed, id);
        id
    }

    fn resolve(&self, id: InternId) -> &str {
        &self.to_str[id as usize]
    }
}

/// A named, process-wide intern table. Construct one per distinct namespace
/// (symbols, features, attributes) via [`Interner::new`]; each is a global
/// with `'static` lifetime reached through a `OnceLock`.
pub struct Interner {
    table: OnceLock<Mutex<Table>>,
}

impl Interner {
    pub const fn new() -> Self {
        Interner {
            table: OnceLock::new(),
        }
    }

    fn table(&self) -> &Mutex<Table> {
        self.table.get_or_init(|| Mutex::new(Table::new()))
    }

    /// Interns `text`, returning a stable id. Repeated calls with equal text
    /// (from any thread) return the same id.
    pub fn intern(&self, text: &str) -> InternId {
        self.table().lock().unwrap().intern(text)
    }

    /// Looks up the text for a previously interned id.
    ///
    /// # Panics
    /// Panics if `id` was not produced by this table.
    pub fn resolve(&self, id: InternId) -> String {
        self.table().lock().unwrap().resolve(id).to_string()
    }

    /// Runs `f` with a borrowed view of the text for `id`, avoiding an
    /// allocation for short-lived comparisons.
    pub fn with_str<R>(&self, id: InternId, f: impl FnOnce(&str) -> R) -> R {
        let guard = self.table().lock().unwrap();
        f(guard.resolve(id))
    }

    pub fn len(&self) -> usize {
        self.table().lock().unwrap().to_str.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Interner {
    fn default() -> Self {
        Self::new()
    }
}
