//! Error types for the Trellis layout engine.
//!
//! Layout itself never fails: formula problems are recorded on the formula
//! and surface as a size of zero for the pass. These types describe what went
//! wrong so an embedding editor can display it.

use thiserror::Error;

/// Top-level error type for the Trellis engine.
#[derive(Debug, Error)]
pub enum TrellisError {
    #[error(transparent)]
    Formula(#[from] FormulaError),

    #[error(transparent)]
    Tree(#[from] TreeError),
}

/// Errors while parsing or evaluating a size formula.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormulaError {
    #[error("{message} at line {line}, column {column}")]
    Syntax {
        message: String,
        line: u32,
        column: u32,
    },

    #[error("Unknown field '{name}'")]
    UnknownField { name: String },

    #[error("Unknown function '{name}'")]
    UnknownFunction { name: String },

    #[error("Function '{name}' expects {expected} arguments, got {found}")]
    WrongArgumentCount {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Invalid result type: {found}")]
    InvalidResult { found: String },

    #[error("Empty formula")]
    Empty,
}

impl FormulaError {
    /// Build a syntax error at the given position.
    pub fn syntax(message: impl Into<String>, line: u32, column: u32) -> Self {
        Self::Syntax {
            message: message.into(),
            line,
            column,
        }
    }
}

/// Errors while building a node tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("Unknown node {id}")]
    UnknownNode { id: u64 },

    #[error("Node {id} already has a parent")]
    AlreadyAttached { id: u64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_syntax_error_message() {
        let err = FormulaError::syntax("')' expected", 1, 7);
        assert_eq!(err.to_string(), "')' expected at line 1, column 7");
    }

    #[test]
    fn test_aggregate_conversion() {
        let err: TrellisError = TreeError::UnknownNode { id: 3 }.into();
        assert_eq!(err.to_string(), "Unknown node 3");
    }
}
