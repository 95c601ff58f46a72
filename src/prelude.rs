//! Fenestra prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    diagnostics::{diagnostics_text, write_diagnostics, write_table, write_totals},
    dimensions::{DimensionRequest, Dimensions, GlassSpec, ValidationError},
    fixtures::{Fixture, FixtureError},
    formula::{DEFAULT_GASKET_FORMULA, Formula, FormulaError, FormulaErrorKind, Variables, evaluate},
    items::{BomItemDefinition, BomItemDraft, ItemRole},
    quotation::{
        PriceList, PricingHook, QuotationError, QuotationPricing, QuotationTotals, aggregate,
        aggregate_priced,
    },
    resolver::{
        BomResolver, ItemWarning, ResolutionMode, ResolveError, ResolvedBom, ResolvedItem,
        RoleGroup, Totals, TotalsOverflow, resolve,
    },
    templates::{GlazingRule, ProductBomTemplate, TemplateError},
    validation::{FieldProblem, InvalidItem, validate, validate_template},
};
