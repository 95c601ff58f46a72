//! Quotation aggregation
//!
//! Sums resolved BOMs across the lines of a quotation and, given a
//! [`PricingHook`], prices them.

use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use rustc_hash::FxHashMap;
use rusty_money::{Money, MoneyError, iso::Currency};
use serde::{Serialize, Serializer};
use smallvec::SmallVec;
use thiserror::Error;

use crate::{
    items::ItemRole,
    resolver::{ResolvedBom, ResolvedItem, Totals, TotalsOverflow},
};

/// Errors that can occur while pricing a quotation.
#[derive(Debug, Error)]
pub enum QuotationError {
    /// Wrapper for money errors, e.g. mixed currencies.
    #[error(transparent)]
    Money(#[from] MoneyError),

    /// A subtotal did not fit in minor units.
    #[error("subtotal for item {0} is out of range")]
    Conversion(String),

    /// Quantities summed across lines left the decimal range.
    #[error(transparent)]
    Totals(#[from] TotalsOverflow),
}

/// Supplies unit prices for resolved items.
///
/// Glass is priced per square metre of `total_area_m2`, everything else per
/// piece of `total_quantity`.
pub trait PricingHook<'a> {
    /// Currency every price and total is expressed in.
    fn currency(&self) -> &'a Currency;

    /// Unit price for an item, or `None` if the item has no price.
    fn unit_price(&self, item: &ResolvedItem) -> Option<Money<'a, Currency>>;
}

/// Unit prices keyed by item code.
#[derive(Debug, Clone)]
pub struct PriceList<'a> {
    currency: &'a Currency,
    prices: FxHashMap<String, Money<'a, Currency>>,
}

impl<'a> PriceList<'a> {
    /// Create an empty price list.
    pub fn new(currency: &'a Currency) -> Self {
        Self {
            currency,
            prices: FxHashMap::default(),
        }
    }

    /// Set the unit price of an item code.
    #[must_use]
    pub fn with_price(mut self, item_code: impl Into<String>, price: Money<'a, Currency>) -> Self {
        self.insert(item_code, price);
        self
    }

    /// Set the unit price of an item code.
    pub fn insert(&mut self, item_code: impl Into<String>, price: Money<'a, Currency>) {
        self.prices.insert(item_code.into(), price);
    }

    /// Number of priced item codes.
    pub fn len(&self) -> usize {
        self.prices.len()
    }

    /// Whether no prices are set.
    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}

impl<'a> PricingHook<'a> for PriceList<'a> {
    fn currency(&self) -> &'a Currency {
        self.currency
    }

    fn unit_price(&self, item: &ResolvedItem) -> Option<Money<'a, Currency>> {
        self.prices.get(&item.item_code).copied()
    }
}

/// Totals for one role across a quotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleTotals {
    /// Role
    pub role: ItemRole,

    /// Totals for the role
    pub totals: Totals,
}

/// Why an item was left out of the priced total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnpricedReason {
    /// The pricing hook has no price for the item.
    NoPrice,

    /// The item failed to resolve.
    Unresolved,
}

/// An item left out of the priced total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnpricedItem {
    /// Product the item belongs to
    pub product_code: String,

    /// Item code
    pub item_code: String,

    /// Reason
    pub reason: UnpricedReason,
}

/// One priced item of one order line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricedLine<'a> {
    /// Product the item belongs to
    pub product_code: String,

    /// Item code
    pub item_code: String,

    /// Role
    pub role: ItemRole,

    /// Price per piece or per square metre
    #[serde(serialize_with = "serialize_money")]
    pub unit_price: Money<'a, Currency>,

    /// Pieces, or square metres for glass
    pub priced_quantity: Decimal,

    /// `unit_price * priced_quantity`, rounded to minor units
    #[serde(serialize_with = "serialize_money")]
    pub subtotal: Money<'a, Currency>,
}

/// Subtotal for one role.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoleSubtotal<'a> {
    /// Role
    pub role: ItemRole,

    /// Sum of the role's priced lines
    #[serde(serialize_with = "serialize_money")]
    pub subtotal: Money<'a, Currency>,
}

/// The monetary part of a quotation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuotationPricing<'a> {
    /// Priced items in quotation order
    pub lines: Vec<PricedLine<'a>>,

    /// Subtotals for roles with at least one priced item, in display order
    pub by_role: SmallVec<[RoleSubtotal<'a>; 5]>,

    /// Sum of all priced lines
    #[serde(serialize_with = "serialize_money")]
    pub total: Money<'a, Currency>,

    /// Items not included in `total`
    pub unpriced: Vec<UnpricedItem>,
}

impl QuotationPricing<'_> {
    /// Whether every item was priced.
    pub fn is_complete(&self) -> bool {
        self.unpriced.is_empty()
    }
}

/// Aggregated totals for a quotation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuotationTotals<'a> {
    /// Number of resolved BOMs (order lines)
    pub bom_count: usize,

    /// Totals per role, in display order, for roles present in any BOM
    pub by_role: SmallVec<[RoleTotals; 5]>,

    /// Totals across everything
    pub totals: Totals,

    /// Prices, when a pricing hook was supplied
    pub pricing: Option<QuotationPricing<'a>>,
}

impl QuotationTotals<'_> {
    /// Totals for a role.
    pub fn role(&self, role: ItemRole) -> Option<&Totals> {
        self.by_role
            .iter()
            .find(|entry| entry.role == role)
            .map(|entry| &entry.totals)
    }
}

/// Sum resolved BOMs without prices.
///
/// # Errors
///
/// Returns [`QuotationError::Totals`] if a sum leaves the decimal range.
pub fn aggregate<'a>(boms: &[ResolvedBom]) -> Result<QuotationTotals<'a>, QuotationError> {
    let mut by_role: SmallVec<[RoleTotals; 5]> = SmallVec::new();
    let mut totals = Totals::default();

    for role in ItemRole::DISPLAY_ORDER {
        let groups: Vec<&Totals> = boms
            .iter()
            .filter_map(|bom| bom.group(role))
            .map(|group| &group.totals)
            .collect();

        if groups.is_empty() {
            continue;
        }

        let mut role_totals = Totals::default();

        for group in groups {
            role_totals.merge(group)?;
        }

        totals.merge(&role_totals)?;

        by_role.push(RoleTotals {
            role,
            totals: role_totals,
        });
    }

    Ok(QuotationTotals {
        bom_count: boms.len(),
        by_role,
        totals,
        pricing: None,
    })
}

/// Sum resolved BOMs and price them.
///
/// # Errors
///
/// Returns [`QuotationError::Money`] if a price is in a different currency
/// from the hook's, [`QuotationError::Conversion`] if a subtotal does not
/// fit in minor units, or [`QuotationError::Totals`] as for [`aggregate`].
pub fn aggregate_priced<'a>(
    boms: &[ResolvedBom],
    hook: &impl PricingHook<'a>,
) -> Result<QuotationTotals<'a>, QuotationError> {
    let currency = hook.currency();
    let mut lines = Vec::new();
    let mut unpriced = Vec::new();

    for bom in boms {
        for item in bom.items() {
            let unpriced_item = |reason| UnpricedItem {
                product_code: bom.product_code.clone(),
                item_code: item.item_code.clone(),
                reason,
            };

            if !item.is_resolved() {
                unpriced.push(unpriced_item(UnpricedReason::Unresolved));
                continue;
            }

            let Some(unit_price) = hook.unit_price(item) else {
                unpriced.push(unpriced_item(UnpricedReason::NoPrice));
                continue;
            };

            let priced_quantity = priced_quantity(item);
            let subtotal = Money::from_minor(
                minor_times(unit_price.to_minor_units(), priced_quantity)
                    .ok_or_else(|| QuotationError::Conversion(item.item_code.clone()))?,
                unit_price.currency(),
            );

            lines.push(PricedLine {
                product_code: bom.product_code.clone(),
                item_code: item.item_code.clone(),
                role: item.role,
                unit_price,
                priced_quantity,
                subtotal,
            });
        }
    }

    let mut by_role: SmallVec<[RoleSubtotal<'a>; 5]> = SmallVec::new();
    let mut total = Money::from_minor(0, currency);

    for role in ItemRole::DISPLAY_ORDER {
        let mut role_lines = lines.iter().filter(|line| line.role == role).peekable();

        if role_lines.peek().is_none() {
            continue;
        }

        let mut subtotal = Money::from_minor(0, currency);

        for line in role_lines {
            subtotal = subtotal.add(line.subtotal)?;
        }

        total = total.add(subtotal)?;

        by_role.push(RoleSubtotal { role, subtotal });
    }

    Ok(QuotationTotals {
        pricing: Some(QuotationPricing {
            lines,
            by_role,
            total,
            unpriced,
        }),
        ..aggregate(boms)?
    })
}

/// What an item's unit price is multiplied by.
fn priced_quantity(item: &ResolvedItem) -> Decimal {
    match item.role {
        ItemRole::Glass => item.total_area_m2.unwrap_or_default(),
        _ => Decimal::from(item.total_quantity.unwrap_or_default()),
    }
}

fn minor_times(minor: i64, factor: Decimal) -> Option<i64> {
    Decimal::from(minor)
        .checked_mul(factor)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
}

/// Serialize money as `"AMOUNT CODE"`, e.g. `"12.50 GBP"`.
///
/// # Errors
///
/// Returns the serializer's error.
pub fn serialize_money<S: Serializer>(
    money: &Money<'_, Currency>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_money(money))
}

/// Format money as `"AMOUNT CODE"`, e.g. `"12.50 GBP"`.
pub fn format_money(money: &Money<'_, Currency>) -> String {
    let currency = money.currency();
    let amount = Decimal::new(money.to_minor_units(), currency.exponent);

    format!("{amount} {}", currency.iso_alpha_code)
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::{GBP, USD};
    use testresult::TestResult;

    use super::*;
    use crate::{
        dimensions::DimensionRequest,
        items::BomItemDefinition,
        resolver::{ResolutionMode, resolve},
        templates::ProductBomTemplate,
    };

    type BoxError = Box<dyn std::error::Error>;

    fn bom(width: f64, height: f64, quantity: u32) -> Result<ResolvedBom, BoxError> {
        let template = ProductBomTemplate::new(
            "FX-100",
            "Fixed",
            "Fixed light",
            vec![
                BomItemDefinition::new("FR-01", "Frame", ItemRole::Profile, "mm")
                    .with_formula("P")
                    .with_weight_per_meter(Decimal::ONE),
                BomItemDefinition::new("BR-01", "Bracket", ItemRole::Accessory, "pcs"),
                BomItemDefinition::new("GL-01", "Pane", ItemRole::Glass, "m2"),
                BomItemDefinition::new("SA-01", "Sash", ItemRole::Profile, "mm")
                    .with_formula("W / (H - H)"),
            ],
        )?;

        Ok(resolve(
            &template,
            &DimensionRequest::new(width, height, quantity),
            ResolutionMode::Lenient,
        )?)
    }

    #[test]
    fn glass_area_sums_across_lines() -> TestResult {
        let boms = [bom(1000.0, 800.0, 1)?, bom(1000.0, 800.0, 1)?];

        let quotation = aggregate(&boms)?;

        assert_eq!(quotation.bom_count, 2);
        assert_eq!(
            quotation.role(ItemRole::Glass).map(|totals| totals.area_m2),
            Some(Decimal::new(160, 2))
        );
        assert_eq!(quotation.totals.area_m2, Decimal::new(160, 2));
        assert!(quotation.pricing.is_none());

        Ok(())
    }

    #[test]
    fn totals_cover_lengths_weights_and_pieces() -> TestResult {
        let boms = [bom(1000.0, 800.0, 2)?, bom(500.0, 500.0, 1)?];

        let quotation = aggregate(&boms)?;
        let profiles = quotation.role(ItemRole::Profile).ok_or("no profiles")?;

        // 3600mm x 2 + 2000mm x 1
        assert_eq!(profiles.length_mm, Decimal::from(9200));
        assert_eq!(profiles.weight_kg, Decimal::new(92, 1));
        assert_eq!(profiles.failed_items, 2);
        assert_eq!(quotation.totals.piece_count, 9);

        Ok(())
    }

    #[test]
    fn lengths_summed_past_the_decimal_range_are_an_error() -> TestResult {
        let template = ProductBomTemplate::new(
            "XL-1",
            "Test",
            "Oversize",
            vec![
                BomItemDefinition::new("FR-01", "Frame", ItemRole::Profile, "mm")
                    .with_formula("W*W*W*50"),
            ],
        )?;
        let line = resolve(
            &template,
            &DimensionRequest::new(1e9, 1.0, 1),
            ResolutionMode::Strict,
        )?;

        let result = aggregate(&[line.clone(), line]);

        assert!(matches!(result, Err(QuotationError::Totals(TotalsOverflow))));

        Ok(())
    }

    #[test]
    fn priced_quotation_uses_area_for_glass() -> TestResult {
        let prices = PriceList::new(GBP)
            .with_price("FR-01", Money::from_minor(250, GBP))
            .with_price("BR-01", Money::from_minor(99, GBP))
            .with_price("GL-01", Money::from_minor(4500, GBP));

        let quotation = aggregate_priced(&[bom(1000.0, 800.0, 2)?], &prices)?;
        let pricing = quotation.pricing.ok_or("no pricing")?;

        let subtotals: Vec<(&str, i64)> = pricing
            .lines
            .iter()
            .map(|line| (line.item_code.as_str(), line.subtotal.to_minor_units()))
            .collect();

        // 1.6 m2 of glass at 45.00
        assert_eq!(
            subtotals,
            vec![("FR-01", 500), ("BR-01", 198), ("GL-01", 7200)]
        );
        assert_eq!(pricing.total, Money::from_minor(7898, GBP));
        assert_eq!(pricing.by_role.len(), 3);

        Ok(())
    }

    #[test]
    fn unpriced_and_failed_items_are_listed() -> TestResult {
        let prices = PriceList::new(GBP).with_price("FR-01", Money::from_minor(250, GBP));

        let quotation = aggregate_priced(&[bom(1000.0, 800.0, 1)?], &prices)?;
        let pricing = quotation.pricing.ok_or("no pricing")?;

        let unpriced: Vec<(&str, UnpricedReason)> = pricing
            .unpriced
            .iter()
            .map(|item| (item.item_code.as_str(), item.reason))
            .collect();

        assert_eq!(
            unpriced,
            vec![
                ("SA-01", UnpricedReason::Unresolved),
                ("BR-01", UnpricedReason::NoPrice),
                ("GL-01", UnpricedReason::NoPrice),
            ]
        );
        assert!(!pricing.is_complete());
        assert_eq!(pricing.total, Money::from_minor(250, GBP));

        Ok(())
    }

    #[test]
    fn mixed_currencies_are_an_error() -> TestResult {
        let prices = PriceList::new(GBP).with_price("BR-01", Money::from_minor(100, USD));

        let result = aggregate_priced(&[bom(1000.0, 800.0, 1)?], &prices);

        assert!(matches!(
            result,
            Err(QuotationError::Money(MoneyError::CurrencyMismatch { .. }))
        ));

        Ok(())
    }

    #[test]
    fn money_formats_with_currency_code() {
        assert_eq!(format_money(&Money::from_minor(1250, GBP)), "12.50 GBP");
        assert_eq!(format_money(&Money::from_minor(-5, USD)), "-0.05 USD");
    }

    #[test]
    fn minor_times_rounds_half_away_from_zero() {
        assert_eq!(minor_times(5, Decimal::new(5, 1)), Some(3));
        assert_eq!(minor_times(-5, Decimal::new(5, 1)), Some(-3));
        assert_eq!(minor_times(i64::MAX, Decimal::TWO), None);
    }
}
