//! Order Fixtures

use rust_decimal::{Decimal, prelude::ToPrimitive};
use rustc_hash::FxHashMap;
use rusty_money::{
    Money,
    iso::{Currency, EUR, GBP, USD},
};
use serde::Deserialize;

use crate::{
    dimensions::DimensionRequest, fixtures::FixtureError, quotation::PriceList,
    resolver::ResolutionMode,
};

/// One line of an order: a template and the dimensions to resolve it for.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OrderLine {
    /// Template file name
    pub template: String,

    /// Dimensions, quantity and glass
    #[serde(flatten)]
    pub request: DimensionRequest,
}

/// Wrapper for an order in YAML
#[derive(Debug, Deserialize)]
pub struct OrderFixture {
    /// Resolution mode
    #[serde(default)]
    pub mode: ResolutionMode,

    /// Currency code for the price list, inferred from the prices if absent
    #[serde(default)]
    pub currency: Option<String>,

    /// Order lines
    pub lines: Vec<OrderLine>,

    /// Unit prices keyed by item code, e.g. `"2.99 GBP"`
    #[serde(default)]
    pub prices: FxHashMap<String, String>,
}

impl OrderFixture {
    /// Build the price list.
    ///
    /// Returns `None` if the order names no currency and has no prices.
    ///
    /// # Errors
    ///
    /// Returns an error if a price is malformed or in a different currency.
    pub fn price_list(&self) -> Result<Option<PriceList<'static>>, FixtureError> {
        let mut currency = self.currency.as_deref().map(parse_currency).transpose()?;
        let mut prices = Vec::with_capacity(self.prices.len());

        for (item_code, price) in &self.prices {
            let price = parse_price(price)?;

            match currency {
                Some(expected) if expected != price.currency() => {
                    return Err(FixtureError::CurrencyMismatch(
                        expected.iso_alpha_code.to_string(),
                        price.currency().iso_alpha_code.to_string(),
                    ));
                }
                Some(_) => {}
                None => currency = Some(price.currency()),
            }

            prices.push((item_code, price));
        }

        Ok(currency.map(|currency| {
            prices
                .into_iter()
                .fold(PriceList::new(currency), |list, (code, price)| {
                    list.with_price(code.clone(), price)
                })
        }))
    }
}

/// Parse price string (e.g., "2.99 GBP") into money
///
/// # Errors
///
/// Returns an error if the price format is invalid or the currency is unknown.
pub fn parse_price(s: &str) -> Result<Money<'static, Currency>, FixtureError> {
    let mut parts = s.split_whitespace();

    let (Some(amount), Some(currency_code), None) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(FixtureError::InvalidPrice(format!(
            "Expected format 'AMOUNT CURRENCY', got: {s}"
        )));
    };

    let currency = parse_currency(currency_code)?;

    let minor_units = amount
        .parse::<Decimal>()
        .ok()
        .and_then(|amount| amount.checked_mul(Decimal::ONE_HUNDRED))
        .and_then(|value| value.round_dp(0).to_i64())
        .ok_or_else(|| FixtureError::InvalidPrice(s.to_string()))?;

    Ok(Money::from_minor(minor_units, currency))
}

fn parse_currency(code: &str) -> Result<&'static Currency, FixtureError> {
    match code {
        "GBP" => Ok(GBP),
        "USD" => Ok(USD),
        "EUR" => Ok(EUR),
        other => Err(FixtureError::UnknownCurrency(other.to_string())),
    }
}
