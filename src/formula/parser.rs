//! Recursive-descent formula parser
//!
//! ```text
//! expression := ["-"] term (("+" | "-") term)*
//! term       := primary (("*" | "/") primary)*
//! primary    := NUMBER | VARIABLE | "(" expression ")"
//! ```
//!
//! A leading minus is only accepted at the start of an expression, so
//! `-W + 10` and `(-W) * 2` parse while `W -- 40` and `W * -2` do not.
//!
//! Both the parser and [`Expr::evaluate`] recurse, so formulas are capped at
//! [`MAX_TOKENS`] tokens and [`MAX_DEPTH`] levels of parentheses.

use std::{iter::Peekable, vec::IntoIter};

use rust_decimal::Decimal;

use crate::formula::{
    Variable, Variables,
    error::FormulaErrorKind,
    lexer::{Token, TokenKind},
};

/// Deepest parenthesis nesting a formula may use.
pub const MAX_DEPTH: usize = 64;

/// Most tokens a single formula may contain.
pub const MAX_TOKENS: usize = 512;

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// `+`
    Add,

    /// `-`
    Subtract,

    /// `*`
    Multiply,

    /// `/`
    Divide,
}

/// Parsed formula syntax tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// Numeric literal
    Number(Decimal),

    /// Variable reference
    Variable(Variable),

    /// Unary minus
    Negate(Box<Expr>),

    /// Binary operation
    Binary {
        /// Operator
        op: BinaryOp,

        /// Left operand
        lhs: Box<Expr>,

        /// Right operand
        rhs: Box<Expr>,
    },
}

impl Expr {
    /// Evaluate the expression with checked decimal arithmetic.
    ///
    /// # Errors
    ///
    /// Returns [`FormulaErrorKind::DivisionByZero`] or [`FormulaErrorKind::Overflow`].
    pub fn evaluate(&self, variables: &Variables) -> Result<Decimal, FormulaErrorKind> {
        match self {
            Expr::Number(value) => Ok(*value),
            Expr::Variable(variable) => Ok(variables.get(*variable)),
            Expr::Negate(inner) => Ok(-inner.evaluate(variables)?),
            Expr::Binary { op, lhs, rhs } => {
                let lhs = lhs.evaluate(variables)?;
                let rhs = rhs.evaluate(variables)?;

                match op {
                    BinaryOp::Add => lhs.checked_add(rhs),
                    BinaryOp::Subtract => lhs.checked_sub(rhs),
                    BinaryOp::Multiply => lhs.checked_mul(rhs),
                    BinaryOp::Divide => {
                        if rhs.is_zero() {
                            return Err(FormulaErrorKind::DivisionByZero);
                        }

                        lhs.checked_div(rhs)
                    }
                }
                .ok_or(FormulaErrorKind::Overflow)
            }
        }
    }
}

/// Parse a token stream into an expression tree.
///
/// # Errors
///
/// Returns a [`FormulaErrorKind`] describing the first syntax problem found,
/// including [`FormulaErrorKind::TooLong`] past [`MAX_TOKENS`] and
/// [`FormulaErrorKind::TooDeeplyNested`] past [`MAX_DEPTH`].
pub fn parse(tokens: Vec<Token>) -> Result<Expr, FormulaErrorKind> {
    if tokens.is_empty() {
        return Err(FormulaErrorKind::Empty);
    }

    if tokens.len() > MAX_TOKENS {
        return Err(FormulaErrorKind::TooLong {
            tokens: tokens.len(),
            limit: MAX_TOKENS,
        });
    }

    let mut parser = Parser {
        tokens: tokens.into_iter().peekable(),
        depth: 0,
    };

    let expr = parser.expression()?;

    match parser.tokens.next() {
        None => Ok(expr),
        Some(Token {
            kind: TokenKind::RightParen,
            position,
        }) => Err(FormulaErrorKind::UnbalancedParentheses { position }),
        Some(token) => Err(unexpected(token)),
    }
}

struct Parser {
    tokens: Peekable<IntoIter<Token>>,
    depth: usize,
}

impl Parser {
    fn expression(&mut self) -> Result<Expr, FormulaErrorKind> {
        let negate = self.next_if(|kind| kind == TokenKind::Minus).is_some();

        let mut expr = self.term()?;

        if negate {
            expr = Expr::Negate(Box::new(expr));
        }

        while let Some(token) =
            self.next_if(|kind| matches!(kind, TokenKind::Plus | TokenKind::Minus))
        {
            let op = if token.kind == TokenKind::Plus {
                BinaryOp::Add
            } else {
                BinaryOp::Subtract
            };

            expr = Expr::Binary {
                op,
                lhs: Box::new(expr),
                rhs: Box::new(self.term()?),
            };
        }

        Ok(expr)
    }

    fn term(&mut self) -> Result<Expr, FormulaErrorKind> {
        let mut expr = self.primary()?;

        while let Some(token) =
            self.next_if(|kind| matches!(kind, TokenKind::Star | TokenKind::Slash))
        {
            let op = if token.kind == TokenKind::Star {
                BinaryOp::Multiply
            } else {
                BinaryOp::Divide
            };

            expr = Expr::Binary {
                op,
                lhs: Box::new(expr),
                rhs: Box::new(self.primary()?),
            };
        }

        Ok(expr)
    }

    fn primary(&mut self) -> Result<Expr, FormulaErrorKind> {
        let token = self.tokens.next().ok_or(FormulaErrorKind::UnexpectedEnd)?;

        match token.kind {
            TokenKind::Number(value) => Ok(Expr::Number(value)),
            TokenKind::Variable(variable) => Ok(Expr::Variable(variable)),
            TokenKind::LeftParen => {
                if self.depth >= MAX_DEPTH {
                    return Err(FormulaErrorKind::TooDeeplyNested {
                        position: token.position,
                    });
                }

                self.depth += 1;
                let inner = self.expression()?;
                self.depth -= 1;

                match self.tokens.next() {
                    Some(Token {
                        kind: TokenKind::RightParen,
                        ..
                    }) => Ok(inner),
                    Some(other) => Err(unexpected(other)),
                    None => Err(FormulaErrorKind::UnbalancedParentheses {
                        position: token.position,
                    }),
                }
            }
            TokenKind::RightParen
            | TokenKind::Plus
            | TokenKind::Minus
            | TokenKind::Star
            | TokenKind::Slash => Err(unexpected(token)),
        }
    }

    fn next_if(&mut self, accept: impl Fn(TokenKind) -> bool) -> Option<Token> {
        self.tokens.next_if(|token| accept(token.kind))
    }
}

fn unexpected(token: Token) -> FormulaErrorKind {
    FormulaErrorKind::UnexpectedToken {
        token: token.kind.to_string(),
        position: token.position,
    }
}
