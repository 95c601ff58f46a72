//! BOM resolution
//!
//! Resolves every item of a [`ProductBomTemplate`] for one order line and
//! groups the results by role in [`ItemRole::DISPLAY_ORDER`].

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    dimensions::{DimensionRequest, Dimensions, ValidationError},
    formula::FormulaError,
    items::ItemRole,
    templates::{ProductBomTemplate, TemplateError},
};

pub mod item;
pub mod resolved;

pub use resolved::{ItemWarning, ResolvedBom, ResolvedItem, RoleGroup, Totals, TotalsOverflow};

/// What to do when an item's formula fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionMode {
    /// Abort on the first failing item.
    Strict,

    /// Record the failure on the item and carry on.
    #[default]
    Lenient,
}

/// Errors from resolving a BOM.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResolveError {
    /// The order line is invalid; nothing was resolved.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The template is structurally invalid.
    #[error(transparent)]
    Template(#[from] TemplateError),

    /// An item's formula failed in strict mode.
    #[error("item {item_code}: {source}")]
    Formula {
        /// Code of the failing item
        item_code: String,

        /// Underlying formula error
        source: FormulaError,
    },

    /// Every item resolved but the BOM totals left the decimal range.
    #[error(transparent)]
    Overflow(#[from] TotalsOverflow),
}

/// Resolve a template for one order line.
///
/// # Errors
///
/// Returns [`ResolveError::Validation`] if the request is invalid,
/// [`ResolveError::Formula`] for the first failing item in strict mode, or
/// [`ResolveError::Overflow`] if the totals do not fit.
pub fn resolve(
    template: &ProductBomTemplate,
    request: &DimensionRequest,
    mode: ResolutionMode,
) -> Result<ResolvedBom, ResolveError> {
    let dimensions = request.validate()?;

    resolve_dimensions(template, dimensions, mode)
}

/// Resolve a template for an already validated order line.
///
/// # Errors
///
/// Returns [`ResolveError::Formula`] for the first failing item in strict
/// mode, or [`ResolveError::Overflow`] if the totals do not fit.
pub fn resolve_dimensions(
    template: &ProductBomTemplate,
    dimensions: Dimensions,
    mode: ResolutionMode,
) -> Result<ResolvedBom, ResolveError> {
    debug!(
        product_code = template.product_code(),
        width_mm = %dimensions.width_mm(),
        height_mm = %dimensions.height_mm(),
        quantity = dimensions.quantity(),
        ?mode,
        "resolving BOM"
    );

    let mut resolved = Vec::with_capacity(template.items().len());

    for definition in template.items() {
        let item = match item::resolve_item(definition, &dimensions, template.glazing()) {
            Ok(item) => item,
            Err(source) if mode == ResolutionMode::Strict => {
                return Err(ResolveError::Formula {
                    item_code: definition.item_code.clone(),
                    source,
                });
            }
            Err(source) => {
                warn!(
                    product_code = template.product_code(),
                    item_code = %definition.item_code,
                    "formula failed: {source}"
                );

                item::failed_item(definition, source)
            }
        };

        resolved.push(item);
    }

    let mut groups: SmallVec<[RoleGroup; 5]> = SmallVec::new();
    let mut totals = Totals::default();

    for role in ItemRole::DISPLAY_ORDER {
        let (items, rest): (Vec<_>, Vec<_>) =
            resolved.into_iter().partition(|item| item.role == role);
        resolved = rest;

        if items.is_empty() {
            continue;
        }

        let role_totals = Totals::from_items(&items)?;
        totals.merge(&role_totals)?;

        groups.push(RoleGroup {
            role,
            items,
            totals: role_totals,
        });
    }

    Ok(ResolvedBom {
        product_code: template.product_code().to_string(),
        series: template.series().to_string(),
        category: template.category().to_string(),
        dimensions,
        groups,
        totals,
    })
}

/// Resolves order lines with a fixed [`ResolutionMode`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BomResolver {
    mode: ResolutionMode,
}

impl BomResolver {
    /// Create a resolver.
    pub const fn new(mode: ResolutionMode) -> Self {
        Self { mode }
    }

    /// A strict resolver.
    pub const fn strict() -> Self {
        Self::new(ResolutionMode::Strict)
    }

    /// A lenient resolver.
    pub const fn lenient() -> Self {
        Self::new(ResolutionMode::Lenient)
    }

    /// The resolution mode.
    pub const fn mode(&self) -> ResolutionMode {
        self.mode
    }

    /// Resolve one order line.
    ///
    /// # Errors
    ///
    /// See [`resolve`].
    pub fn resolve(
        &self,
        template: &ProductBomTemplate,
        request: &DimensionRequest,
    ) -> Result<ResolvedBom, ResolveError> {
        resolve(template, request, self.mode)
    }

    /// Resolve several order lines independently. One line failing does not
    /// affect the others.
    pub fn resolve_many<'t, I>(&self, lines: I) -> Vec<Result<ResolvedBom, ResolveError>>
    where
        I: IntoIterator<Item = (&'t ProductBomTemplate, &'t DimensionRequest)>,
    {
        lines
            .into_iter()
            .map(|(template, request)| self.resolve(template, request))
            .collect()
    }
}
