//! Formula tokenizer

use std::{fmt, iter::Peekable, str::CharIndices, str::FromStr};

use rust_decimal::Decimal;

use crate::formula::{Variable, error::FormulaErrorKind};

/// Lexical token kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Numeric literal
    Number(Decimal),

    /// One of the formula variables
    Variable(Variable),

    /// `+`
    Plus,

    /// `-`
    Minus,

    /// `*`
    Star,

    /// `/`
    Slash,

    /// `(`
    LeftParen,

    /// `)`
    RightParen,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Number(value) => write!(f, "{value}"),
            TokenKind::Variable(variable) => write!(f, "{variable}"),
            TokenKind::Plus => f.write_str("+"),
            TokenKind::Minus => f.write_str("-"),
            TokenKind::Star => f.write_str("*"),
            TokenKind::Slash => f.write_str("/"),
            TokenKind::LeftParen => f.write_str("("),
            TokenKind::RightParen => f.write_str(")"),
        }
    }
}

/// A token and the byte offset it starts at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    /// What was read
    pub kind: TokenKind,

    /// Byte offset into the formula source
    pub position: usize,
}

/// Split a formula into tokens.
///
/// # Errors
///
/// Returns a [`FormulaErrorKind`] for characters outside the grammar, malformed
/// numbers and identifiers that are not formula variables.
pub fn tokenize(source: &str) -> Result<Vec<Token>, FormulaErrorKind> {
    let mut chars = source.char_indices().peekable();
    let mut tokens = Vec::new();

    while let Some(&(position, ch)) = chars.peek() {
        let kind = match ch {
            c if c.is_whitespace() => {
                chars.next();
                continue;
            }
            '0'..='9' | '.' => read_number(&mut chars, position)?,
            c if c.is_alphabetic() || c == '_' => read_variable(&mut chars)?,
            '+' => single(&mut chars, TokenKind::Plus),
            '-' => single(&mut chars, TokenKind::Minus),
            '*' => single(&mut chars, TokenKind::Star),
            '/' => single(&mut chars, TokenKind::Slash),
            '(' => single(&mut chars, TokenKind::LeftParen),
            ')' => single(&mut chars, TokenKind::RightParen),
            other => {
                return Err(FormulaErrorKind::UnknownToken {
                    token: other,
                    position,
                });
            }
        };

        tokens.push(Token { kind, position });
    }

    Ok(tokens)
}

fn single(chars: &mut Peekable<CharIndices<'_>>, kind: TokenKind) -> TokenKind {
    chars.next();
    kind
}

fn read_number(
    chars: &mut Peekable<CharIndices<'_>>,
    position: usize,
) -> Result<TokenKind, FormulaErrorKind> {
    let mut literal = String::new();

    while let Some(&(_, c)) = chars.peek() {
        if c.is_ascii_digit() || c == '.' {
            literal.push(c);
            chars.next();
        } else {
            break;
        }
    }

    Decimal::from_str(&literal)
        .map(TokenKind::Number)
        .map_err(|_err| FormulaErrorKind::InvalidNumber { literal, position })
}

fn read_variable(chars: &mut Peekable<CharIndices<'_>>) -> Result<TokenKind, FormulaErrorKind> {
    let mut name = String::new();

    while let Some(&(_, c)) = chars.peek() {
        if c.is_alphanumeric() || c == '_' {
            name.push(c);
            chars.next();
        } else {
            break;
        }
    }

    Variable::from_str(&name)
        .map(TokenKind::Variable)
        .map_err(|()| FormulaErrorKind::UndefinedVariable { name })
}
