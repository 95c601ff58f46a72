//! Resolved BOM structures

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use thiserror::Error;

use crate::{dimensions::Dimensions, formula::FormulaError, items::ItemRole};

/// Something suspicious about an otherwise resolved item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemWarning {
    /// A cutting length or pane dimension came out zero or negative, which
    /// means the formula does not suit the requested dimensions.
    NonPositiveLength,
}

/// One BOM item resolved for an order line.
///
/// When `error` is set every numeric field is `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedItem {
    /// Item code
    pub item_code: String,

    /// Description
    pub description: String,

    /// Role
    pub role: ItemRole,

    /// Display unit
    pub unit: String,

    /// Pieces per finished unit, from the template
    pub qty_per_unit: u32,

    /// Cutting length of one piece, profiles and gaskets
    pub per_unit_length_mm: Option<Decimal>,

    /// Pieces (or gasket runs, or panes) for the whole order line
    pub total_quantity: Option<u64>,

    /// Length of all pieces together, profiles and gaskets
    pub total_length_mm: Option<Decimal>,

    /// Profile weight for the whole order line
    pub weight_kg: Option<Decimal>,

    /// Pane width, glass only
    pub pane_width_mm: Option<Decimal>,

    /// Pane height, glass only
    pub pane_height_mm: Option<Decimal>,

    /// Area of one pane, glass only
    pub area_m2: Option<Decimal>,

    /// Area of all panes, glass only
    pub total_area_m2: Option<Decimal>,

    /// Set when a size came out non-positive
    pub warning: Option<ItemWarning>,

    /// Set instead of the numeric fields when the formula failed
    pub error: Option<FormulaError>,
}

impl ResolvedItem {
    /// An item with no numeric fields set.
    pub(crate) fn empty(
        item_code: &str,
        description: &str,
        role: ItemRole,
        unit: &str,
        qty_per_unit: u32,
    ) -> Self {
        Self {
            item_code: item_code.to_string(),
            description: description.to_string(),
            role,
            unit: unit.to_string(),
            qty_per_unit,
            per_unit_length_mm: None,
            total_quantity: None,
            total_length_mm: None,
            weight_kg: None,
            pane_width_mm: None,
            pane_height_mm: None,
            area_m2: None,
            total_area_m2: None,
            warning: None,
            error: None,
        }
    }

    /// Whether the item resolved without a formula error.
    pub fn is_resolved(&self) -> bool {
        self.error.is_none()
    }
}

/// Sums over a set of resolved items. Failed items only count towards
/// `failed_items`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Totals {
    /// Number of items
    pub item_count: u32,

    /// Number of items whose formula failed
    pub failed_items: u32,

    /// Total pieces, runs and panes
    pub piece_count: u64,

    /// Total cut length of profiles and gaskets
    pub length_mm: Decimal,

    /// Total profile weight
    pub weight_kg: Decimal,

    /// Total glass area
    pub area_m2: Decimal,
}

/// A sum of totals left the decimal range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("totals exceed the decimal range")]
pub struct TotalsOverflow;

impl Totals {
    /// Sum a set of items.
    ///
    /// # Errors
    ///
    /// Returns [`TotalsOverflow`] if a sum leaves the decimal range.
    pub fn from_items<'a>(
        items: impl IntoIterator<Item = &'a ResolvedItem>,
    ) -> Result<Self, TotalsOverflow> {
        let mut totals = Totals::default();

        for item in items {
            totals.add_item(item)?;
        }

        Ok(totals)
    }

    /// Add one item to the totals. Left unchanged on error.
    ///
    /// # Errors
    ///
    /// Returns [`TotalsOverflow`] if a sum leaves the decimal range.
    pub fn add_item(&mut self, item: &ResolvedItem) -> Result<(), TotalsOverflow> {
        let mut other = Totals {
            item_count: 1,
            ..Totals::default()
        };

        if item.is_resolved() {
            other.piece_count = item.total_quantity.unwrap_or_default();
            other.length_mm = item.total_length_mm.unwrap_or_default();
            other.weight_kg = item.weight_kg.unwrap_or_default();
            other.area_m2 = item.total_area_m2.unwrap_or_default();
        } else {
            other.failed_items = 1;
        }

        self.merge(&other)
    }

    /// Add another set of totals. Left unchanged on error.
    ///
    /// # Errors
    ///
    /// Returns [`TotalsOverflow`] if a sum leaves the decimal range.
    pub fn merge(&mut self, other: &Totals) -> Result<(), TotalsOverflow> {
        let length_mm = checked_sum(self.length_mm, other.length_mm)?;
        let weight_kg = checked_sum(self.weight_kg, other.weight_kg)?;
        let area_m2 = checked_sum(self.area_m2, other.area_m2)?;

        self.item_count = self.item_count.saturating_add(other.item_count);
        self.failed_items = self.failed_items.saturating_add(other.failed_items);
        self.piece_count = self.piece_count.saturating_add(other.piece_count);
        self.length_mm = length_mm;
        self.weight_kg = weight_kg;
        self.area_m2 = area_m2;

        Ok(())
    }
}

fn checked_sum(lhs: Decimal, rhs: Decimal) -> Result<Decimal, TotalsOverflow> {
    lhs.checked_add(rhs).ok_or(TotalsOverflow)
}

/// Resolved items of one role, in template order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleGroup {
    /// Role shared by every item in the group
    pub role: ItemRole,

    /// Items in template order
    pub items: Vec<ResolvedItem>,

    /// Totals for this role
    pub totals: Totals,
}

/// A template resolved against one order line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedBom {
    /// Product code of the template
    pub product_code: String,

    /// Product series
    pub series: String,

    /// Product category
    pub category: String,

    /// The validated order line
    pub dimensions: Dimensions,

    /// Non-empty role groups in display order
    pub groups: SmallVec<[RoleGroup; 5]>,

    /// Totals across all groups
    pub totals: Totals,
}

impl ResolvedBom {
    /// The group for a role, if the template has items of that role.
    pub fn group(&self, role: ItemRole) -> Option<&RoleGroup> {
        self.groups.iter().find(|group| group.role == role)
    }

    /// All items in display order.
    pub fn items(&self) -> impl Iterator<Item = &ResolvedItem> {
        self.groups.iter().flat_map(|group| group.items.iter())
    }

    /// Find an item by code.
    pub fn item(&self, item_code: &str) -> Option<&ResolvedItem> {
        self.items().find(|item| item.item_code == item_code)
    }

    /// Items whose formula failed.
    pub fn failed_items(&self) -> impl Iterator<Item = &ResolvedItem> {
        self.items().filter(|item| !item.is_resolved())
    }
}
