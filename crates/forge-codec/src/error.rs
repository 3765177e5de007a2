//! Error types for every textual wire format this crate round-trips.

use thiserror::Error;

use crate::location::Location;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CodecError {
    #[error("parse error at {location}: {message}")]
    Parse { location: Location, message: String },

    #[error("cannot serialize {what}: {reason}")]
    Serialize { what: String, reason: String },

    #[error("malformed weights file at line {line}: {message}")]
    Weights { line: usize, message: String },
}

impl CodecError {
    pub fn parse(location: Location, message: impl Into<String>) -> Self {
        CodecError::Parse {
            location,
            message: message.into(),
        }
    }

    pub fn serialize(what: impl Into<String>, reason: impl Into<String>) -> Self {
        CodecError::Serialize {
            what: what.into(),
            reason: reason.into(),
        }
    }
}
