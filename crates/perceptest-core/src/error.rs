//! Typed error enums for corpus validation and session transitions.
//!
//! Loaders and the engine wrap these in `anyhow` with context; the enums
//! themselves stay small so callers can match on them.

use thiserror::Error;

/// Why a corpus entry (or a whole corpus) was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CorpusError {
    /// The question vector is shorter than the fixed layout requires.
    #[error("question vector has {len} elements, need at least {min}")]
    VectorTooShort { len: usize, min: usize },

    /// A vector element is not 0 or 1.
    #[error("question vector element {index} is {value}, expected 0 or 1")]
    InvalidBit { index: usize, value: i64 },

    /// A vector string contains something other than `0` or `1`.
    #[error("invalid character {ch:?} at position {index} in vector string")]
    InvalidBitChar { index: usize, ch: char },

    /// A delimited line has the wrong number of fields.
    #[error("expected {expected} tab-separated fields, found {found}")]
    FieldCount { expected: usize, found: usize },

    /// A required field is absent or empty.
    #[error("missing or empty field: {0}")]
    MissingField(&'static str),

    /// The answer value cannot be normalized to a string.
    #[error("unsupported answer value: {0}")]
    InvalidAnswer(String),

    /// The entry does not have the expected shape.
    #[error("malformed entry: {0}")]
    Malformed(String),

    /// No valid question remains.
    #[error("corpus contains no valid questions")]
    Empty,
}

/// Misuse of the session state machine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// `start` was called while a question is awaiting an answer.
    #[error("session already in progress at question {index}")]
    InProgress { index: usize },
}
