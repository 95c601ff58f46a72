//! Template Fixtures

use serde::Deserialize;

use crate::{
    items::BomItemDraft,
    templates::{GlazingRule, ProductBomTemplate, TemplateError},
};

/// Wrapper for a template in YAML
#[derive(Debug, Deserialize)]
pub struct TemplateFixture {
    /// Product code
    pub product_code: String,

    /// Product series
    #[serde(default)]
    pub series: String,

    /// Product category
    #[serde(default)]
    pub category: String,

    /// Glazing rule
    #[serde(default)]
    pub glazing: GlazingRule,

    /// Items as authored
    pub items: Vec<BomItemDraft>,
}

impl TryFrom<TemplateFixture> for ProductBomTemplate {
    type Error = TemplateError;

    fn try_from(fixture: TemplateFixture) -> Result<Self, Self::Error> {
        ProductBomTemplate::from_drafts(
            fixture.product_code,
            fixture.series,
            fixture.category,
            &fixture.items,
        )
        .map(|template| template.with_glazing(fixture.glazing))
    }
}
