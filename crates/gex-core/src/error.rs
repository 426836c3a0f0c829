//! Unified error types for the GEX crates.
//!
//! This module provides a common error type [`GexError`] shared by the
//! dataframe and sensitivity crates. Every failure carries the offending
//! identifier so callers can report it without re-deriving context; nothing
//! is retried internally.

use thiserror::Error;

/// Unified error type for all GEX operations.
///
/// Resolution failures are split by what failed to resolve (variable,
/// function, contingency, row) because callers route them differently:
/// registration-time failures abort before any analysis starts, while update
/// failures abort a single call.
#[derive(Error, Debug)]
pub enum GexError {
    /// Invalid registration input (empty id list, duplicate name, ...)
    #[error("Validation error: {0}")]
    Validation(String),

    /// A sensitivity row id resolved to no injection, phase shifter or variable set
    #[error("Variable '{0}' not found")]
    UnresolvedVariable(String),

    /// A sensitivity column id resolved to no branch or target-voltage bus
    #[error("Function '{0}' not found")]
    UnresolvedFunction(String),

    /// A transformer row id has no active phase tap changer
    #[error("Transformer '{0}' is not a phase shifter")]
    NotPhaseShifter(String),

    /// A post-contingency matrix referenced an unregistered contingency
    #[error("Contingency '{0}' not found")]
    UnresolvedContingency(String),

    /// An update row's index key matched no item in the target collection
    #[error("No item found for index '{0}'")]
    UnresolvedRow(String),

    /// An update supplied a column that has no registered setter
    #[error("Column '{0}' is not updatable")]
    MissingSetter(String),

    /// The external analysis engine failed
    #[error("Engine error: {0}")]
    Engine(String),

    /// Generic errors (for wrapping external errors)
    #[error("{0}")]
    Other(String),
}

/// Convenience type alias for Results using GexError.
pub type GexResult<T> = Result<T, GexError>;

// Conversion from anyhow::Error
impl From<anyhow::Error> for GexError {
    fn from(err: anyhow::Error) -> Self {
        GexError::Other(err.to_string())
    }
}

// Conversion from string-like types for convenience
impl From<String> for GexError {
    fn from(s: String) -> Self {
        GexError::Other(s)
    }
}

impl From<&str> for GexError {
    fn from(s: &str) -> Self {
        GexError::Other(s.to_string())
    }
}
