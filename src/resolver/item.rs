//! Item resolution
//!
//! One [`BomItemDefinition`] against one set of [`Dimensions`]. Dispatch is on
//! [`ItemRole`] only.
//!
//! Rounding is the same on every path: lengths and pane sizes to whole
//! millimetres, weights to 2 decimal places, areas to 4, midpoints away from
//! zero.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::{
    dimensions::Dimensions,
    formula::{DEFAULT_GASKET_FORMULA, Formula, FormulaError, FormulaErrorKind},
    items::{BomItemDefinition, ItemRole},
    resolver::resolved::{ItemWarning, ResolvedItem},
    templates::GlazingRule,
};

const MM_PER_M: Decimal = Decimal::ONE_THOUSAND;
const SQUARE_MM_PER_SQUARE_M: Decimal = Decimal::from_parts(1_000_000, 0, 0, false, 0);

/// Resolve an item, returning the formula error if there is one.
///
/// # Errors
///
/// Returns a [`FormulaError`] if the item's formula (or the glazing rule, for
/// glass) cannot be evaluated for these dimensions.
pub fn resolve_item(
    item: &BomItemDefinition,
    dimensions: &Dimensions,
    glazing: &GlazingRule,
) -> Result<ResolvedItem, FormulaError> {
    let quantity = u64::from(dimensions.quantity());
    let qty_per_unit = item.qty_per_unit.get();
    let pieces = u64::from(qty_per_unit) * quantity;

    let mut resolved = ResolvedItem::empty(
        &item.item_code,
        &item.description,
        item.role,
        &item.unit,
        qty_per_unit,
    );

    match item.role {
        ItemRole::Profile => {
            let source = item.formula.as_deref().unwrap_or_default();
            let length = round_mm(evaluate(source, dimensions)?);
            let total_length = length
                .checked_mul(Decimal::from(pieces))
                .ok_or_else(|| overflow(source))?;

            let weight = (length / MM_PER_M)
                .checked_mul(item.weight_per_meter)
                .and_then(|per_piece| per_piece.checked_mul(Decimal::from(pieces)))
                .ok_or_else(|| overflow(source))?;

            resolved.per_unit_length_mm = Some(length);
            resolved.total_quantity = Some(pieces);
            resolved.total_length_mm = Some(total_length);
            resolved.weight_kg = Some(round_dp(weight, 2));
            resolved.warning = non_positive([length]);
        }
        ItemRole::Hardware | ItemRole::Accessory => {
            resolved.total_quantity = Some(pieces);
        }
        ItemRole::Gasket => {
            let source = item.formula.as_deref().unwrap_or(DEFAULT_GASKET_FORMULA);
            let length = round_mm(evaluate(source, dimensions)?);
            let total_length = length
                .checked_mul(Decimal::from(quantity))
                .ok_or_else(|| overflow(source))?;

            resolved.per_unit_length_mm = Some(length);
            resolved.total_quantity = Some(quantity);
            resolved.total_length_mm = Some(total_length);
            resolved.warning = non_positive([length]);
        }
        ItemRole::Glass => {
            let pane = pane_size(dimensions, glazing)?;

            resolved.pane_width_mm = Some(pane.width);
            resolved.pane_height_mm = Some(pane.height);
            resolved.area_m2 = Some(pane.area);
            resolved.total_quantity = Some(pieces);
            resolved.total_area_m2 = Some(
                pane.area
                    .checked_mul(Decimal::from(pieces))
                    .ok_or_else(|| overflow(&glazing_description(glazing)))?,
            );
            resolved.warning = non_positive([pane.width, pane.height]);
        }
    }

    Ok(resolved)
}

/// Resolve an item, recording a formula error on the item instead of
/// returning it.
pub fn resolve_item_lenient(
    item: &BomItemDefinition,
    dimensions: &Dimensions,
    glazing: &GlazingRule,
) -> ResolvedItem {
    resolve_item(item, dimensions, glazing).unwrap_or_else(|error| failed_item(item, error))
}

/// An item carrying a formula error and no numbers.
pub(crate) fn failed_item(item: &BomItemDefinition, error: FormulaError) -> ResolvedItem {
    ResolvedItem {
        error: Some(error),
        ..ResolvedItem::empty(
            &item.item_code,
            &item.description,
            item.role,
            &item.unit,
            item.qty_per_unit.get(),
        )
    }
}

struct PaneSize {
    width: Decimal,
    height: Decimal,
    area: Decimal,
}

fn pane_size(dimensions: &Dimensions, glazing: &GlazingRule) -> Result<PaneSize, FormulaError> {
    let leaves = Decimal::from(glazing.leaf_count.get());

    let size = dimensions
        .width_mm()
        .checked_div(leaves)
        .and_then(|leaf_width| leaf_width.checked_sub(glazing.width_clearance_mm))
        .zip(
            dimensions
                .height_mm()
                .checked_sub(glazing.height_clearance_mm),
        )
        .and_then(|(width, height)| {
            let (width, height) = (round_mm(width), round_mm(height));
            let area = width.checked_mul(height)?.checked_div(SQUARE_MM_PER_SQUARE_M)?;

            Some(PaneSize {
                width,
                height,
                area: round_dp(area, 4),
            })
        });

    size.ok_or_else(|| overflow(&glazing_description(glazing)))
}

fn glazing_description(glazing: &GlazingRule) -> String {
    format!(
        "W / {} - {}, H - {}",
        glazing.leaf_count, glazing.width_clearance_mm, glazing.height_clearance_mm
    )
}

fn evaluate(source: &str, dimensions: &Dimensions) -> Result<Decimal, FormulaError> {
    Formula::parse(source)?.evaluate(dimensions.variables())
}

fn overflow(source: &str) -> FormulaError {
    FormulaError::new(source, FormulaErrorKind::Overflow)
}

fn non_positive<const N: usize>(sizes: [Decimal; N]) -> Option<ItemWarning> {
    sizes
        .iter()
        .any(|size| *size <= Decimal::ZERO)
        .then_some(ItemWarning::NonPositiveLength)
}

fn round_mm(value: Decimal) -> Decimal {
    round_dp(value, 0)
}

fn round_dp(value: Decimal, dp: u32) -> Decimal {
    value
        .round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
        .normalize()
}
