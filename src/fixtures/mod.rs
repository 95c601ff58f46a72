//! Fixtures
//!
//! YAML template and order files under a base directory:
//!
//! ```text
//! fixtures/
//!   templates/<name>.yml
//!   orders/<name>.yml
//! ```

use std::{fs, path::PathBuf};

use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::{
    dimensions::DimensionRequest,
    fixtures::{orders::OrderFixture, templates::TemplateFixture},
    quotation::PriceList,
    resolver::ResolutionMode,
    templates::{ProductBomTemplate, TemplateError},
};

pub mod orders;
pub mod templates;

pub use orders::{OrderLine, parse_price};

/// Fixture Parsing Errors
#[derive(Debug, Error)]
pub enum FixtureError {
    /// IO error reading fixture files
    #[error("Failed to read fixture file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// The template file describes an invalid template
    #[error("Invalid template: {0}")]
    Template(#[from] TemplateError),

    /// Invalid price format
    #[error("Invalid price format: {0}")]
    InvalidPrice(String),

    /// Unknown currency code
    #[error("Unknown currency code: {0}")]
    UnknownCurrency(String),

    /// Currency mismatch between prices
    #[error("Currency mismatch: expected {0}, found {1}")]
    CurrencyMismatch(String, String),

    /// Template not loaded
    #[error("Template not found: {0}")]
    TemplateNotFound(String),
}

/// Fixture
#[derive(Debug)]
pub struct Fixture {
    /// Base path for fixture files
    base_path: PathBuf,

    /// Templates keyed by file name
    templates: FxHashMap<String, ProductBomTemplate>,

    /// Order lines in file order
    lines: Vec<OrderLine>,

    /// Resolution mode requested by the order
    mode: ResolutionMode,

    /// Unit prices, if the order has any
    prices: Option<PriceList<'static>>,
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new()
    }
}

impl Fixture {
    /// Create a new empty fixture with default base path
    pub fn new() -> Self {
        Self::with_base_path("./fixtures")
    }

    /// Create a new empty fixture with custom base path
    pub fn with_base_path(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            templates: FxHashMap::default(),
            lines: Vec::new(),
            mode: ResolutionMode::default(),
            prices: None,
        }
    }

    /// Load a template from `templates/<name>.yml`
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or describes an
    /// invalid template.
    pub fn load_template(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let file_path = self.base_path.join("templates").join(format!("{name}.yml"));
        let contents = fs::read_to_string(&file_path)?;
        let fixture: TemplateFixture = serde_norway::from_str(&contents)?;

        self.templates
            .insert(name.to_string(), fixture.try_into()?);

        Ok(self)
    }

    /// Load an order from `orders/<name>.yml`, along with every template it
    /// references that is not already loaded
    ///
    /// # Errors
    ///
    /// Returns an error if the order or any referenced template cannot be
    /// loaded, or if its prices are malformed.
    pub fn load_order(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let file_path = self.base_path.join("orders").join(format!("{name}.yml"));
        let contents = fs::read_to_string(&file_path)?;
        let fixture: OrderFixture = serde_norway::from_str(&contents)?;

        for line in &fixture.lines {
            if !self.templates.contains_key(&line.template) {
                self.load_template(&line.template)?;
            }
        }

        self.prices = fixture.price_list()?;
        self.mode = fixture.mode;
        self.lines = fixture.lines;

        Ok(self)
    }

    /// Load an order and its templates from the default base path
    ///
    /// # Errors
    ///
    /// Returns an error if any of the fixture files cannot be loaded.
    pub fn from_order(name: &str) -> Result<Self, FixtureError> {
        let mut fixture = Self::new();

        fixture.load_order(name)?;

        Ok(fixture)
    }

    /// Get a template by its file name
    ///
    /// # Errors
    ///
    /// Returns [`FixtureError::TemplateNotFound`] if the template has not been
    /// loaded.
    pub fn template(&self, name: &str) -> Result<&ProductBomTemplate, FixtureError> {
        self.templates
            .get(name)
            .ok_or_else(|| FixtureError::TemplateNotFound(name.to_string()))
    }

    /// Order lines
    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }

    /// Resolution mode requested by the order
    pub fn mode(&self) -> ResolutionMode {
        self.mode
    }

    /// Unit prices, if the order has any
    pub fn prices(&self) -> Option<&PriceList<'static>> {
        self.prices.as_ref()
    }

    /// Each order line paired with its template
    ///
    /// # Errors
    ///
    /// Returns [`FixtureError::TemplateNotFound`] if a line references a
    /// template that has not been loaded.
    pub fn line_pairs(
        &self,
    ) -> Result<Vec<(&ProductBomTemplate, &DimensionRequest)>, FixtureError> {
        self.lines
            .iter()
            .map(|line| Ok((self.template(&line.template)?, &line.request)))
            .collect()
    }
}
