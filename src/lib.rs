//! Fenestra
//!
//! Fenestra is a parametric bill-of-materials engine for windows and doors. It
//! resolves product BOM templates, whose cutting lengths are formulas over the
//! window's width and height, into material lists for concrete order lines, and
//! aggregates them into quotations.

pub mod diagnostics;
pub mod dimensions;
pub mod fixtures;
pub mod formula;
pub mod items;
pub mod prelude;
pub mod quotation;
pub mod resolver;
pub mod templates;
pub mod utils;
pub mod validation;
