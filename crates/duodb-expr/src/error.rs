//! Error types for expression parsing and AST construction.

use crate::ast::Arity;
use crate::scan::Failure;

/// The input could not be parsed as an expression or document path.
///
/// Carries the furthest byte offset any alternative reached and a description
/// of what the grammar expected there. Parsing has no side effects, so the
/// caller may simply try again with different input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("syntax error at offset {offset}: expected {expected}")]
pub struct SyntaxError {
    /// Byte offset of the failure in the input text.
    pub offset: usize,
    /// Description of the expected token.
    pub expected: String,
}

impl From<Failure> for SyntaxError {
    fn from(failure: Failure) -> Self {
        Self {
            offset: failure.offset,
            expected: failure.expected,
        }
    }
}

/// An operator node could not be built from the given operands.
///
/// Raised while constructing the AST, before any encoding is attempted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArityError {
    /// The operator name is not one of the canonical operator spellings.
    #[error("unknown operator: {name}")]
    UnknownOperator {
        /// The rejected name.
        name: String,
    },
    /// The operand count does not satisfy the operator's arity.
    #[error("operator {name} takes {expected} operands, got {actual}")]
    WrongOperandCount {
        /// Canonical operator name.
        name: String,
        /// Allowed operand count.
        expected: Arity,
        /// Operand count actually supplied.
        actual: usize,
    },
}
