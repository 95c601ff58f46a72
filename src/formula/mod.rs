//! Formulas
//!
//! Restricted arithmetic over the window dimensions. A formula may use decimal
//! literals, `+ - * /`, parentheses, a leading unary minus and four variables:
//!
//! - `W`: width in millimetres
//! - `H`: height in millimetres
//! - `P`: perimeter, `2 * (W + H)`
//! - `A`: area in square metres, `W * H / 1_000_000`
//!
//! Anything else is rejected while tokenizing or parsing; nothing is ever
//! handed to a general purpose interpreter.

use std::{fmt, str::FromStr};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub mod error;
pub mod lexer;
pub mod parser;

pub use error::{FormulaError, FormulaErrorKind};

use crate::formula::parser::Expr;

/// Gasket length rule used when a gasket item has no formula of its own.
pub const DEFAULT_GASKET_FORMULA: &str = "(W+H)*2";

const SQUARE_MM_PER_SQUARE_M: Decimal = Decimal::from_parts(1_000_000, 0, 0, false, 0);

/// A formula variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Variable {
    /// `W`
    Width,

    /// `H`
    Height,

    /// `P`
    Perimeter,

    /// `A`
    Area,
}

impl FromStr for Variable {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "W" => Ok(Variable::Width),
            "H" => Ok(Variable::Height),
            "P" => Ok(Variable::Perimeter),
            "A" => Ok(Variable::Area),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Variable::Width => "W",
            Variable::Height => "H",
            Variable::Perimeter => "P",
            Variable::Area => "A",
        })
    }
}

/// Variable bindings for one evaluation. `P` and `A` are always derived from
/// `W` and `H`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Variables {
    width: Decimal,
    height: Decimal,
    perimeter: Decimal,
    area: Decimal,
}

impl Variables {
    /// Bind `W` and `H` and derive `P` and `A`.
    ///
    /// Returns `None` if a derived value does not fit in a [`Decimal`].
    pub fn new(width: Decimal, height: Decimal) -> Option<Self> {
        let perimeter = width.checked_add(height)?.checked_mul(Decimal::TWO)?;
        let area = width
            .checked_mul(height)?
            .checked_div(SQUARE_MM_PER_SQUARE_M)?;

        Some(Self {
            width,
            height,
            perimeter,
            area,
        })
    }

    /// Value bound to a variable.
    pub fn get(&self, variable: Variable) -> Decimal {
        match variable {
            Variable::Width => self.width,
            Variable::Height => self.height,
            Variable::Perimeter => self.perimeter,
            Variable::Area => self.area,
        }
    }
}

/// A parsed formula, ready to be evaluated any number of times.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Formula {
    source: String,
    expr: Expr,
}

impl Formula {
    /// Parse formula source text.
    ///
    /// # Errors
    ///
    /// Returns a [`FormulaError`] for empty formulas, unknown tokens, unbalanced
    /// parentheses, undefined variables or any other syntax error.
    pub fn parse(source: &str) -> Result<Self, FormulaError> {
        let expr = lexer::tokenize(source)
            .and_then(parser::parse)
            .map_err(|kind| FormulaError::new(source, kind))?;

        Ok(Self {
            source: source.to_string(),
            expr,
        })
    }

    /// Evaluate against the given bindings.
    ///
    /// # Errors
    ///
    /// Returns a [`FormulaError`] on division by zero or decimal overflow.
    pub fn evaluate(&self, variables: &Variables) -> Result<Decimal, FormulaError> {
        self.expr
            .evaluate(variables)
            .map_err(|kind| FormulaError::new(self.source.clone(), kind))
    }

    /// The formula as written.
    pub fn source(&self) -> &str {
        &self.source
    }
}

impl FromStr for Formula {
    type Err = FormulaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Formula::parse(s)
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Parse and evaluate a formula in one step.
///
/// # Errors
///
/// Returns a [`FormulaError`] if the formula fails to parse or evaluate.
pub fn evaluate(formula: &str, variables: &Variables) -> Result<Decimal, FormulaError> {
    Formula::parse(formula)?.evaluate(variables)
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    fn window(width: i64, height: i64) -> Result<Variables, &'static str> {
        Variables::new(Decimal::from(width), Decimal::from(height)).ok_or("out of range")
    }

    #[test]
    fn derives_perimeter_and_area() -> TestResult {
        let vars = window(1200, 1500)?;

        assert_eq!(vars.get(Variable::Perimeter), Decimal::from(5400));
        assert_eq!(vars.get(Variable::Area), Decimal::new(18, 1));

        Ok(())
    }

    #[test]
    fn evaluates_width_offset() -> TestResult {
        assert_eq!(evaluate("W - 40", &window(1200, 1500)?)?, Decimal::from(1160));

        Ok(())
    }

    #[test]
    fn evaluates_default_gasket_rule() -> TestResult {
        assert_eq!(
            evaluate(DEFAULT_GASKET_FORMULA, &window(1200, 1500)?)?,
            Decimal::from(5400)
        );

        Ok(())
    }

    #[test]
    fn evaluates_derived_variables() -> TestResult {
        let vars = window(1000, 2000)?;

        assert_eq!(evaluate("P / 2", &vars)?, Decimal::from(3000));
        assert_eq!(evaluate("A * 10", &vars)?, Decimal::from(20));

        Ok(())
    }

    #[test]
    fn evaluates_both_sash_rules() -> TestResult {
        let vars = window(1200, 1500)?;

        assert_eq!(evaluate("(W - 40)/2 - 40", &vars)?, Decimal::from(540));
        assert_eq!(evaluate("(W/2) - 50", &vars)?, Decimal::from(550));

        Ok(())
    }

    #[test]
    fn evaluates_negated_group() -> TestResult {
        assert_eq!(evaluate("-(W - H)", &window(1200, 1500)?)?, Decimal::from(300));

        Ok(())
    }

    #[test]
    fn division_by_zero_is_an_error() -> TestResult {
        let result = evaluate("W / (H - H)", &window(1200, 1500)?);

        assert_eq!(
            result,
            Err(FormulaError::new(
                "W / (H - H)",
                FormulaErrorKind::DivisionByZero
            ))
        );

        Ok(())
    }

    #[test]
    fn blank_formula_is_empty() -> TestResult {
        let result = evaluate("   ", &window(1200, 1500)?);

        assert!(matches!(
            result,
            Err(FormulaError {
                kind: FormulaErrorKind::Empty,
                ..
            })
        ));

        Ok(())
    }

    #[test]
    fn deeply_nested_formula_is_rejected_without_recursing() -> TestResult {
        let vars = window(1200, 1500)?;

        for depth in [100, 3000, 50_000] {
            let formula = format!("{}W{}", "(".repeat(depth), ")".repeat(depth));
            let kind = evaluate(&formula, &vars).err().map(|err| err.kind);

            assert!(matches!(
                kind,
                Some(FormulaErrorKind::TooDeeplyNested { .. } | FormulaErrorKind::TooLong { .. })
            ));
        }

        Ok(())
    }

    #[test]
    fn parsed_formula_is_reusable_and_deterministic() -> TestResult {
        let formula: Formula = "W * 0.5 + H / 3".parse()?;
        let vars = window(1201, 1499)?;

        assert_eq!(formula.evaluate(&vars)?, formula.evaluate(&vars)?);
        assert_eq!(formula.to_string(), "W * 0.5 + H / 3");

        Ok(())
    }

    #[test]
    fn error_carries_formula_source() {
        let result = Formula::parse("W + X");

        assert_eq!(
            result.err().map(|err| err.formula),
            Some("W + X".to_string())
        );
    }
}
