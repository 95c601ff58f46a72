//! Template validation
//!
//! Checks run while a BOM template is being authored. Nothing here mutates
//! the template; every check reports its findings as [`FieldProblem`]s.

use std::num::NonZeroU32;

use rust_decimal::{Decimal, prelude::FromPrimitive};
use thiserror::Error;

use crate::{
    dimensions::{DimensionRequest, Dimensions, ValidationError},
    formula::{DEFAULT_GASKET_FORMULA, Formula, FormulaError},
    items::{BomItemDefinition, BomItemDraft, ItemRole},
    resolver::item::resolve_item,
    templates::ProductBomTemplate,
};

/// A single problem with one field of an item.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FieldProblem {
    /// The item code is blank.
    #[error("item code must not be empty")]
    MissingItemCode,

    /// The role is not one of the known roles.
    #[error("unknown item role '{0}'")]
    UnknownRole(String),

    /// Pieces per unit is zero or negative.
    #[error("quantity per unit must be a positive whole number, got {0}")]
    NonPositiveQuantity(i64),

    /// Pieces per unit does not fit in 32 bits.
    #[error("quantity per unit {0} is too large")]
    QuantityTooLarge(i64),

    /// The display unit is blank.
    #[error("unit must not be empty")]
    MissingUnit,

    /// Weight per metre is negative or not finite.
    #[error("weight per meter must be a finite, non-negative number, got {0}")]
    InvalidWeight(f64),

    /// A profile has no cutting length formula.
    #[error("profile items need a formula")]
    MissingFormula,

    /// The formula failed to parse or evaluate.
    #[error(transparent)]
    Formula(#[from] FormulaError),

    /// The formula or glazing rule gives a zero or negative size for the
    /// sample dimensions.
    #[error("calculated size {0}mm is not positive for the sample dimensions")]
    NonPositiveSize(Decimal),

    /// The sample dimensions themselves are invalid.
    #[error("sample dimensions are invalid: {0}")]
    Sample(#[from] ValidationError),
}

impl FieldProblem {
    /// Name of the field the problem belongs to.
    pub fn field(&self) -> &'static str {
        match self {
            FieldProblem::MissingItemCode => "item_code",
            FieldProblem::UnknownRole(_) => "role",
            FieldProblem::NonPositiveQuantity(_) | FieldProblem::QuantityTooLarge(_) => {
                "qty_per_unit"
            }
            FieldProblem::MissingUnit => "unit",
            FieldProblem::InvalidWeight(_) => "weight_per_meter",
            FieldProblem::MissingFormula
            | FieldProblem::Formula(_)
            | FieldProblem::NonPositiveSize(_) => "formula",
            FieldProblem::Sample(_) => "sample_dimensions",
        }
    }
}

/// An item was rejected, with every problem found.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("item {item_code} is invalid: {}", summary(.problems))]
pub struct InvalidItem {
    /// Code of the rejected item, as authored
    pub item_code: String,

    /// Problems in field order
    pub problems: Vec<FieldProblem>,
}

fn summary(problems: &[FieldProblem]) -> String {
    problems
        .iter()
        .map(|problem| format!("{}: {problem}", problem.field()))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Check a draft item and test-evaluate its formula against sample dimensions.
///
/// # Errors
///
/// Returns [`InvalidItem`] listing every problem found, including problems
/// with the sample dimensions.
pub fn validate(
    draft: &BomItemDraft,
    sample: &DimensionRequest,
) -> Result<BomItemDefinition, InvalidItem> {
    match sample.validate() {
        Ok(dimensions) => validate_with(draft, &dimensions),
        Err(error) => {
            let mut problems = field_problems(draft).err().unwrap_or_default();
            problems.push(FieldProblem::Sample(error));

            Err(InvalidItem {
                item_code: draft.item_code.clone(),
                problems,
            })
        }
    }
}

/// Check a draft item against already validated sample dimensions.
///
/// # Errors
///
/// Returns [`InvalidItem`] listing every problem found.
pub fn validate_with(
    draft: &BomItemDraft,
    sample: &Dimensions,
) -> Result<BomItemDefinition, InvalidItem> {
    let invalid = |problems| InvalidItem {
        item_code: draft.item_code.clone(),
        problems,
    };

    let item = field_problems(draft).map_err(invalid)?;

    let problems = sample_problems(&item, sample);
    if problems.is_empty() {
        Ok(item)
    } else {
        Err(invalid(problems))
    }
}

/// Check a draft's fields without evaluating its formula.
///
/// # Errors
///
/// Returns [`InvalidItem`] listing every problem found.
pub fn check_fields(draft: &BomItemDraft) -> Result<BomItemDefinition, InvalidItem> {
    field_problems(draft).map_err(|problems| InvalidItem {
        item_code: draft.item_code.clone(),
        problems,
    })
}

/// Test-evaluate every item of a template, returning the items that fail.
pub fn validate_template(template: &ProductBomTemplate, sample: &Dimensions) -> Vec<InvalidItem> {
    template
        .items()
        .iter()
        .filter_map(|item| {
            let mut problems = sample_problems(item, sample);

            if item.role == ItemRole::Glass {
                problems.extend(glass_problems(template, item, sample));
            }

            (!problems.is_empty()).then(|| InvalidItem {
                item_code: item.item_code.clone(),
                problems,
            })
        })
        .collect()
}

fn field_problems(draft: &BomItemDraft) -> Result<BomItemDefinition, Vec<FieldProblem>> {
    let mut problems = Vec::new();

    if draft.item_code.trim().is_empty() {
        problems.push(FieldProblem::MissingItemCode);
    }

    let role = match draft.role.parse::<ItemRole>() {
        Ok(role) => Some(role),
        Err(unknown) => {
            problems.push(FieldProblem::UnknownRole(unknown.0));
            None
        }
    };

    let qty_per_unit = if draft.qty_per_unit <= 0 {
        problems.push(FieldProblem::NonPositiveQuantity(draft.qty_per_unit));
        None
    } else {
        let qty = u32::try_from(draft.qty_per_unit)
            .ok()
            .and_then(NonZeroU32::new);
        if qty.is_none() {
            problems.push(FieldProblem::QuantityTooLarge(draft.qty_per_unit));
        }
        qty
    };

    if draft.unit.trim().is_empty() {
        problems.push(FieldProblem::MissingUnit);
    }

    let weight_per_meter = Decimal::from_f64(draft.weight_per_meter)
        .filter(|weight| !weight.is_sign_negative() || weight.is_zero());
    if weight_per_meter.is_none() {
        problems.push(FieldProblem::InvalidWeight(draft.weight_per_meter));
    }

    let formula = draft
        .formula
        .as_deref()
        .map(str::trim)
        .filter(|formula| !formula.is_empty());

    let formula_used = role.is_none_or(ItemRole::has_length);

    if let Some(Err(error)) = formula.filter(|_| formula_used).map(Formula::parse) {
        problems.push(FieldProblem::Formula(error));
    }

    if role == Some(ItemRole::Profile) && formula.is_none() {
        problems.push(FieldProblem::MissingFormula);
    }

    match (role, qty_per_unit, weight_per_meter) {
        (Some(role), Some(qty_per_unit), Some(weight_per_meter)) if problems.is_empty() => {
            Ok(BomItemDefinition {
                item_code: draft.item_code.trim().to_string(),
                description: draft.description.clone(),
                role,
                formula: formula.map(str::to_string),
                qty_per_unit,
                weight_per_meter,
                unit: draft.unit.trim().to_string(),
            })
        }
        _ => Err(problems),
    }
}

/// Evaluate the item's formula for the sample and flag failures and
/// non-positive lengths. Only profiles and gaskets are cut to a formula;
/// any formula on other roles is never evaluated.
fn sample_problems(item: &BomItemDefinition, sample: &Dimensions) -> Vec<FieldProblem> {
    let source = match (item.role, item.formula.as_deref()) {
        (role, _) if !role.has_length() => return Vec::new(),
        (ItemRole::Gasket, None) => DEFAULT_GASKET_FORMULA,
        (_, None) => return vec![FieldProblem::MissingFormula],
        (_, Some(source)) => source,
    };

    match Formula::parse(source).and_then(|formula| formula.evaluate(sample.variables())) {
        Ok(value) if item.role.has_length() && value <= Decimal::ZERO => {
            vec![FieldProblem::NonPositiveSize(value)]
        }
        Ok(_) => Vec::new(),
        Err(error) => vec![FieldProblem::Formula(error)],
    }
}

fn glass_problems(
    template: &ProductBomTemplate,
    item: &BomItemDefinition,
    sample: &Dimensions,
) -> Vec<FieldProblem> {
    let Ok(resolved) = resolve_item(item, sample, template.glazing()) else {
        return Vec::new();
    };

    [resolved.pane_width_mm, resolved.pane_height_mm]
        .into_iter()
        .flatten()
        .filter(|size| *size <= Decimal::ZERO)
        .map(FieldProblem::NonPositiveSize)
        .collect()
}
