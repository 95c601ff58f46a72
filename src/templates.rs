//! Product BOM templates

use std::num::NonZeroU32;

use rust_decimal::Decimal;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    items::{BomItemDefinition, BomItemDraft, ItemRole},
    validation::{InvalidItem, check_fields},
};

/// Structural problems in a template.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TemplateError {
    /// Two items share a code (product code, item code).
    #[error("template {0} contains item code {1} more than once")]
    DuplicateItemCode(String, String),

    /// An item names a role that does not exist (item code, role).
    #[error("item {0} has unknown role '{1}'")]
    UnknownRole(String, String),

    /// An item failed authoring checks.
    #[error(transparent)]
    InvalidItem(#[from] InvalidItem),
}

/// How glass panes are sized from the overall dimensions.
///
/// `pane width = W / leaf_count - width_clearance_mm`,
/// `pane height = H - height_clearance_mm`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlazingRule {
    /// Number of leaves the width is divided between
    pub leaf_count: NonZeroU32,

    /// Clearance subtracted from each pane's width
    #[serde(default)]
    pub width_clearance_mm: Decimal,

    /// Clearance subtracted from each pane's height
    #[serde(default)]
    pub height_clearance_mm: Decimal,
}

impl GlazingRule {
    /// Create a glazing rule.
    pub const fn new(
        leaf_count: NonZeroU32,
        width_clearance_mm: Decimal,
        height_clearance_mm: Decimal,
    ) -> Self {
        Self {
            leaf_count,
            width_clearance_mm,
            height_clearance_mm,
        }
    }
}

impl Default for GlazingRule {
    fn default() -> Self {
        Self::new(NonZeroU32::MIN, Decimal::ZERO, Decimal::ZERO)
    }
}

/// A product's BOM template. Item order is display order within a role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "UncheckedTemplate")]
pub struct ProductBomTemplate {
    product_code: String,
    series: String,
    category: String,
    glazing: GlazingRule,
    items: Vec<BomItemDefinition>,
}

#[derive(Deserialize)]
struct UncheckedTemplate {
    product_code: String,
    #[serde(default)]
    series: String,
    #[serde(default)]
    category: String,
    #[serde(default)]
    glazing: GlazingRule,
    items: Vec<BomItemDefinition>,
}

impl TryFrom<UncheckedTemplate> for ProductBomTemplate {
    type Error = TemplateError;

    fn try_from(unchecked: UncheckedTemplate) -> Result<Self, Self::Error> {
        ProductBomTemplate::new(
            unchecked.product_code,
            unchecked.series,
            unchecked.category,
            unchecked.items,
        )
        .map(|template| template.with_glazing(unchecked.glazing))
    }
}

impl ProductBomTemplate {
    /// Create a template with the default glazing rule.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::DuplicateItemCode`] if two items share a code.
    pub fn new(
        product_code: impl Into<String>,
        series: impl Into<String>,
        category: impl Into<String>,
        items: Vec<BomItemDefinition>,
    ) -> Result<Self, TemplateError> {
        let product_code = product_code.into();
        let mut seen = FxHashSet::default();

        for item in &items {
            if !seen.insert(item.item_code.as_str()) {
                return Err(TemplateError::DuplicateItemCode(
                    product_code,
                    item.item_code.clone(),
                ));
            }
        }

        Ok(Self {
            product_code,
            series: series.into(),
            category: category.into(),
            glazing: GlazingRule::default(),
            items,
        })
    }

    /// Build a template from authored drafts.
    ///
    /// Each draft is checked field by field; formulas are parsed but not
    /// evaluated.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::UnknownRole`] for an unrecognised role,
    /// [`TemplateError::InvalidItem`] for any other field problem and
    /// [`TemplateError::DuplicateItemCode`] if two items share a code.
    pub fn from_drafts(
        product_code: impl Into<String>,
        series: impl Into<String>,
        category: impl Into<String>,
        drafts: &[BomItemDraft],
    ) -> Result<Self, TemplateError> {
        let items = drafts
            .iter()
            .map(|draft| {
                draft.role.parse::<ItemRole>().map_err(|unknown| {
                    TemplateError::UnknownRole(draft.item_code.clone(), unknown.0)
                })?;

                Ok(check_fields(draft)?)
            })
            .collect::<Result<Vec<_>, TemplateError>>()?;

        Self::new(product_code, series, category, items)
    }

    /// Replace the glazing rule.
    #[must_use]
    pub fn with_glazing(mut self, glazing: GlazingRule) -> Self {
        self.glazing = glazing;
        self
    }

    /// Product code
    pub fn product_code(&self) -> &str {
        &self.product_code
    }

    /// Product series
    pub fn series(&self) -> &str {
        &self.series
    }

    /// Product category
    pub fn category(&self) -> &str {
        &self.category
    }

    /// Glazing rule
    pub fn glazing(&self) -> &GlazingRule {
        &self.glazing
    }

    /// Items in template order
    pub fn items(&self) -> &[BomItemDefinition] {
        &self.items
    }

    /// Find an item by code.
    pub fn item(&self, item_code: &str) -> Option<&BomItemDefinition> {
        self.items.iter().find(|item| item.item_code == item_code)
    }
}
