//! Errors of the compile-and-sample pipeline.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The input document does not have the expected shape.
    #[error("Malformed input at {path}: {reason}")]
    MalformedInput { path: String, reason: String },

    /// A division or remainder whose divisor is the constant zero.
    #[error("Division by constant zero at node {node}")]
    DivisionByZero { node: i64 },

    #[error("Constraint set is unsatisfiable")]
    UnsatisfiableConstraintSet,

    #[error("Allocation failure: {what}")]
    AllocationFailure { what: String },

    /// Failure while compiling the constraint at `index` of the constraint list.
    #[error("Constraint {index}: {source}")]
    Constraint { index: usize, source: Box<Error> },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn malformed(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::MalformedInput {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Tag `self` with the index of the constraint it was raised for.
    pub fn in_constraint(self, index: usize) -> Self {
        Error::Constraint {
            index,
            source: Box::new(self),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[test]
    fn test_constraint_tag_keeps_source() {
        let err = Error::DivisionByZero { node: 7 }.in_constraint(2);
        assert_eq!(err.to_string(), "Constraint 2: Division by constant zero at node 7");
        let source = err.source().map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("Division by constant zero at node 7"));
    }

    #[test]
    fn test_malformed_message() {
        let err = Error::malformed("variable_list[1].bit_width", "width 0 is out of range 1..=64");
        assert_eq!(
            err.to_string(),
            "Malformed input at variable_list[1].bit_width: width 0 is out of range 1..=64"
        );
    }
}
