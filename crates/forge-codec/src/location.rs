//! Source location tracking for parse errors.

use std::fmt;

/// A 1-indexed line/column position, plus the byte offset it corresponds to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Location {
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}

impl Location {
    pub fn start() -> Self {
        Location {
            line: 1,
            column: 1,
            offset: 0,
        }
    }

    /// Recomputes line/column for `offset` bytes into `full_input`.
    pub fn from_offset(full_input: &str, offset: usize) -> Self {
        let consumed = &full_input[..offset];
        let line = consumed.bytes().filter(|&b| b == b'\n').count() + 1;
        let column = match consumed.rfind('\n') {
            Some(nl) => offset - nl,
            None => offset + 1,
        };
        Location { line, column, offset }
    }
}

impl Default for Location {
    fn default() -> Self {
        Self::start()
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_on_first_line() {
        let loc = Location::from_offset("hello world", 6);
        assert_eq!(loc, Location { line: 1, column: 7, offset: 6 });
    }

    #[test]
    fn offset_after_newline() {
        let loc = Location::from_offset("abc\ndef", 5);
        assert_eq!(loc.line, 2);
        assert_eq!(loc.column, 2);
    }
}
