//! BOM items

use std::{fmt, num::NonZeroU32, str::FromStr};

use rust_decimal::{Decimal, prelude::ToPrimitive};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// What an item is, which decides how it is calculated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemRole {
    /// Extruded profile cut to length, sold by weight
    Profile,

    /// Hinges, handles, locks: counted per unit
    Hardware,

    /// Screws, caps, clips: counted per unit
    Accessory,

    /// Continuous sealing run, one per unit
    Gasket,

    /// Glazing panes sized from the glazing rule
    Glass,
}

impl ItemRole {
    /// Roles in the order they are displayed.
    pub const DISPLAY_ORDER: [ItemRole; 5] = [
        ItemRole::Profile,
        ItemRole::Hardware,
        ItemRole::Accessory,
        ItemRole::Gasket,
        ItemRole::Glass,
    ];

    /// Lower-case role name.
    pub const fn as_str(self) -> &'static str {
        match self {
            ItemRole::Profile => "profile",
            ItemRole::Hardware => "hardware",
            ItemRole::Accessory => "accessory",
            ItemRole::Gasket => "gasket",
            ItemRole::Glass => "glass",
        }
    }

    /// Whether items of this role are cut to a calculated length.
    pub const fn has_length(self) -> bool {
        matches!(self, ItemRole::Profile | ItemRole::Gasket)
    }
}

impl fmt::Display for ItemRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unrecognised role name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown item role '{0}'")]
pub struct UnknownRole(pub String);

impl FromStr for ItemRole {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ItemRole::DISPLAY_ORDER
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownRole(s.to_string()))
    }
}

/// One line of a BOM template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BomItemDefinition {
    /// Code unique within the template
    pub item_code: String,

    /// Human readable description
    pub description: String,

    /// Calculation role
    pub role: ItemRole,

    /// Cutting length formula over `W`, `H`, `P` and `A`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,

    /// Pieces of this item per finished unit
    pub qty_per_unit: NonZeroU32,

    /// Kilograms per metre, profiles only
    #[serde(default)]
    pub weight_per_meter: Decimal,

    /// Display unit
    pub unit: String,
}

impl BomItemDefinition {
    /// Create an item with one piece per unit and no weight.
    pub fn new(
        item_code: impl Into<String>,
        description: impl Into<String>,
        role: ItemRole,
        unit: impl Into<String>,
    ) -> Self {
        Self {
            item_code: item_code.into(),
            description: description.into(),
            role,
            formula: None,
            qty_per_unit: NonZeroU32::MIN,
            weight_per_meter: Decimal::ZERO,
            unit: unit.into(),
        }
    }

    /// Set the formula.
    #[must_use]
    pub fn with_formula(mut self, formula: impl Into<String>) -> Self {
        self.formula = Some(formula.into());
        self
    }

    /// Set the pieces per unit.
    #[must_use]
    pub fn with_qty_per_unit(mut self, qty_per_unit: NonZeroU32) -> Self {
        self.qty_per_unit = qty_per_unit;
        self
    }

    /// Set the weight per metre.
    #[must_use]
    pub fn with_weight_per_meter(mut self, weight_per_meter: Decimal) -> Self {
        self.weight_per_meter = weight_per_meter;
        self
    }
}

/// An item as authored, before it has been checked.
///
/// Fields keep the loose types an editing form or fixture file produces so that
/// every problem can be reported instead of failing on the first.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BomItemDraft {
    /// Item code
    pub item_code: String,

    /// Description
    #[serde(default)]
    pub description: String,

    /// Role name
    pub role: String,

    /// Formula, blank means none
    #[serde(default)]
    pub formula: Option<String>,

    /// Pieces per unit
    pub qty_per_unit: i64,

    /// Kilograms per metre
    #[serde(default)]
    pub weight_per_meter: f64,

    /// Display unit
    #[serde(default)]
    pub unit: String,
}

impl From<&BomItemDefinition> for BomItemDraft {
    fn from(item: &BomItemDefinition) -> Self {
        Self {
            item_code: item.item_code.clone(),
            description: item.description.clone(),
            role: item.role.as_str().to_string(),
            formula: item.formula.clone(),
            qty_per_unit: i64::from(item.qty_per_unit.get()),
            weight_per_meter: item.weight_per_meter.to_f64().unwrap_or_default(),
            unit: item.unit.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn role_parses_case_insensitively() -> TestResult {
        assert_eq!("Profile".parse::<ItemRole>()?, ItemRole::Profile);
        assert_eq!(" gasket ".parse::<ItemRole>()?, ItemRole::Gasket);

        Ok(())
    }

    #[test]
    fn unknown_role_is_rejected() {
        assert_eq!(
            "sealant".parse::<ItemRole>(),
            Err(UnknownRole("sealant".to_string()))
        );
    }

    #[test]
    fn only_profiles_and_gaskets_have_length() {
        let with_length: Vec<ItemRole> = ItemRole::DISPLAY_ORDER
            .into_iter()
            .filter(|role| role.has_length())
            .collect();

        assert_eq!(with_length, vec![ItemRole::Profile, ItemRole::Gasket]);
    }

    #[test]
    fn definition_converts_to_draft() {
        let item = BomItemDefinition::new("FR-01", "Head frame", ItemRole::Profile, "mm")
            .with_formula("W - 40")
            .with_weight_per_meter(Decimal::new(12, 1));

        let draft = BomItemDraft::from(&item);

        assert_eq!(draft.role, "profile");
        assert_eq!(draft.qty_per_unit, 1);
        assert_eq!(draft.formula.as_deref(), Some("W - 40"));
    }

    #[test]
    fn definition_deserializes_from_yaml() -> TestResult {
        let item: BomItemDefinition = serde_norway::from_str(
            "item_code: GK-01\ndescription: EPDM gasket\nrole: gasket\nqty_per_unit: 1\nunit: mm\n",
        )?;

        assert_eq!(item.role, ItemRole::Gasket);
        assert_eq!(item.formula, None);
        assert_eq!(item.weight_per_meter, Decimal::ZERO);

        Ok(())
    }
}
