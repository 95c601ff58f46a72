//! Formula errors

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The reason a formula could not be parsed or evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FormulaErrorKind {
    /// The formula contains no tokens.
    #[error("formula is empty")]
    Empty,

    /// A character that is not part of the formula grammar.
    #[error("unknown token '{token}' at position {position}")]
    UnknownToken {
        /// The offending character
        token: char,

        /// Byte offset of the character in the formula
        position: usize,
    },

    /// A numeric literal that could not be read as a decimal.
    #[error("invalid number '{literal}' at position {position}")]
    InvalidNumber {
        /// The literal as written
        literal: String,

        /// Byte offset of the literal in the formula
        position: usize,
    },

    /// A `(` without a matching `)`, or a stray `)`.
    #[error("unbalanced parentheses at position {position}")]
    UnbalancedParentheses {
        /// Byte offset where the imbalance was detected
        position: usize,
    },

    /// An identifier other than `W`, `H`, `P` or `A`.
    #[error("undefined variable '{name}' (expected one of W, H, P, A)")]
    UndefinedVariable {
        /// The identifier as written
        name: String,
    },

    /// A valid token in a position the grammar does not allow.
    #[error("unexpected '{token}' at position {position}")]
    UnexpectedToken {
        /// The token as written
        token: String,

        /// Byte offset of the token in the formula
        position: usize,
    },

    /// Parentheses nested deeper than the parser accepts.
    #[error("parentheses nested too deeply at position {position}")]
    TooDeeplyNested {
        /// Byte offset of the `(` that exceeded the limit
        position: usize,
    },

    /// More tokens than a single formula may hold.
    #[error("formula has {tokens} tokens (limit {limit})")]
    TooLong {
        /// Number of tokens found
        tokens: usize,

        /// Maximum number of tokens accepted
        limit: usize,
    },

    /// The formula ended where an operand was required.
    #[error("unexpected end of formula")]
    UnexpectedEnd,

    /// The right-hand side of a division evaluated to zero.
    #[error("division by zero")]
    DivisionByZero,

    /// An intermediate value exceeded the decimal range.
    #[error("arithmetic overflow")]
    Overflow,
}

/// A formula failed to parse or evaluate.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("formula `{formula}`: {kind}")]
pub struct FormulaError {
    /// The formula source text
    pub formula: String,

    /// Why the formula failed
    pub kind: FormulaErrorKind,
}

impl FormulaError {
    /// Create a new error for the given formula text.
    pub fn new(formula: impl Into<String>, kind: FormulaErrorKind) -> Self {
        Self {
            formula: formula.into(),
            kind,
        }
    }
}
