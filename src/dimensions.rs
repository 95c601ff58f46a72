//! Dimensions
//!
//! A [`DimensionRequest`] holds an order line exactly as it was received. It
//! must be turned into [`Dimensions`] by [`DimensionRequest::validate`] before
//! anything is resolved against it.

use rust_decimal::{
    Decimal,
    prelude::{FromPrimitive, ToPrimitive},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::formula::Variables;

/// Errors raised for malformed order lines.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Width is zero, negative, NaN or infinite.
    #[error("width must be a finite number greater than zero, got {0}")]
    InvalidWidth(f64),

    /// Height is zero, negative, NaN or infinite.
    #[error("height must be a finite number greater than zero, got {0}")]
    InvalidHeight(f64),

    /// Quantity is below one or not a whole number.
    #[error("quantity must be a positive whole number, got {0}")]
    InvalidQuantity(f64),

    /// Glass thickness is negative, NaN or infinite.
    #[error("glass thickness must be a finite, non-negative number, got {0}")]
    InvalidGlassThickness(f64),

    /// Dimensions are too large to calculate with.
    #[error("dimensions {width} x {height} are out of range")]
    OutOfRange {
        /// Requested width
        width: f64,

        /// Requested height
        height: f64,
    },
}

/// One order line as received from the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionRequest {
    /// Overall width in millimetres
    pub width_mm: f64,

    /// Overall height in millimetres
    pub height_mm: f64,

    /// Number of finished units
    pub quantity: f64,

    /// Glass thickness in millimetres
    #[serde(default)]
    pub glass_thickness_mm: f64,

    /// Glass type, e.g. "clear" or "low-e"
    #[serde(default)]
    pub glass_type: String,
}

impl DimensionRequest {
    /// Create a request with no glass specification.
    pub fn new(width_mm: f64, height_mm: f64, quantity: u32) -> Self {
        Self {
            width_mm,
            height_mm,
            quantity: f64::from(quantity),
            glass_thickness_mm: 0.0,
            glass_type: String::new(),
        }
    }

    /// Set the glass specification.
    #[must_use]
    pub fn with_glass(mut self, thickness_mm: f64, glass_type: impl Into<String>) -> Self {
        self.glass_thickness_mm = thickness_mm;
        self.glass_type = glass_type.into();
        self
    }

    /// Validate the request.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found, checking width, height,
    /// quantity and glass thickness in that order.
    pub fn validate(&self) -> Result<Dimensions, ValidationError> {
        let width =
            positive_decimal(self.width_mm).ok_or(ValidationError::InvalidWidth(self.width_mm))?;
        let height = positive_decimal(self.height_mm)
            .ok_or(ValidationError::InvalidHeight(self.height_mm))?;
        let quantity = whole_quantity(self.quantity)
            .ok_or(ValidationError::InvalidQuantity(self.quantity))?;

        let glass_thickness = Decimal::from_f64(self.glass_thickness_mm)
            .filter(|thickness| !thickness.is_sign_negative())
            .ok_or(ValidationError::InvalidGlassThickness(self.glass_thickness_mm))?;

        let variables = Variables::new(width, height).ok_or(ValidationError::OutOfRange {
            width: self.width_mm,
            height: self.height_mm,
        })?;

        Ok(Dimensions {
            width_mm: width,
            height_mm: height,
            quantity,
            glass: GlassSpec {
                thickness_mm: glass_thickness,
                glass_type: self.glass_type.clone(),
            },
            variables,
        })
    }
}

fn positive_decimal(value: f64) -> Option<Decimal> {
    if !value.is_finite() || value <= 0.0 {
        return None;
    }

    Decimal::from_f64(value)
        .map(|d| d.normalize())
        .filter(|d| d.is_sign_positive() && !d.is_zero())
}

fn whole_quantity(value: f64) -> Option<u32> {
    if !value.is_finite() || value < 1.0 || value.fract() != 0.0 {
        return None;
    }

    Decimal::from_f64(value).and_then(|d| d.to_u32())
}

/// Glass specification carried through to the resolved BOM.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GlassSpec {
    /// Thickness in millimetres
    pub thickness_mm: Decimal,

    /// Glass type as given on the order
    pub glass_type: String,
}

/// A validated order line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dimensions {
    width_mm: Decimal,
    height_mm: Decimal,
    quantity: u32,
    glass: GlassSpec,

    #[serde(skip)]
    variables: Variables,
}

impl Dimensions {
    /// Width in millimetres
    pub fn width_mm(&self) -> Decimal {
        self.width_mm
    }

    /// Height in millimetres
    pub fn height_mm(&self) -> Decimal {
        self.height_mm
    }

    /// Number of finished units
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Glass specification
    pub fn glass(&self) -> &GlassSpec {
        &self.glass
    }

    /// Formula bindings for these dimensions
    pub fn variables(&self) -> &Variables {
        &self.variables
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn valid_request_is_converted() -> TestResult {
        let dims = DimensionRequest::new(1200.0, 1500.0, 10)
            .with_glass(24.0, "low-e")
            .validate()?;

        assert_eq!(dims.width_mm(), Decimal::from(1200));
        assert_eq!(dims.height_mm(), Decimal::from(1500));
        assert_eq!(dims.quantity(), 10);
        assert_eq!(dims.glass().thickness_mm, Decimal::from(24));
        assert_eq!(dims.glass().glass_type, "low-e");

        Ok(())
    }

    #[test]
    fn dimensions_drop_trailing_zeros() -> TestResult {
        let dims = DimensionRequest::new(1200.0, 1499.5, 1).validate()?;

        assert_eq!(dims.width_mm().scale(), 0);
        assert_eq!(dims.width_mm().to_string(), "1200");
        assert_eq!(dims.height_mm().to_string(), "1499.5");

        Ok(())
    }

    #[test]
    fn zero_width_is_rejected() {
        let result = DimensionRequest::new(0.0, 1500.0, 1).validate();

        assert_eq!(result, Err(ValidationError::InvalidWidth(0.0)));
    }

    #[test]
    fn negative_height_is_rejected() {
        let result = DimensionRequest::new(1200.0, -5.0, 1).validate();

        assert_eq!(result, Err(ValidationError::InvalidHeight(-5.0)));
    }

    #[test]
    fn non_finite_width_is_rejected() {
        let result = DimensionRequest::new(f64::NAN, 1500.0, 1).validate();

        assert!(matches!(result, Err(ValidationError::InvalidWidth(_))));

        let result = DimensionRequest::new(f64::INFINITY, 1500.0, 1).validate();

        assert!(matches!(result, Err(ValidationError::InvalidWidth(_))));
    }

    #[test]
    fn zero_quantity_is_rejected() {
        let result = DimensionRequest::new(1200.0, 1500.0, 0).validate();

        assert_eq!(result, Err(ValidationError::InvalidQuantity(0.0)));
    }

    #[test]
    fn fractional_quantity_is_rejected() {
        let request = DimensionRequest {
            quantity: 2.5,
            ..DimensionRequest::new(1200.0, 1500.0, 1)
        };

        assert_eq!(request.validate(), Err(ValidationError::InvalidQuantity(2.5)));
    }

    #[test]
    fn negative_glass_thickness_is_rejected() {
        let result = DimensionRequest::new(1200.0, 1500.0, 1)
            .with_glass(-4.0, "clear")
            .validate();

        assert_eq!(result, Err(ValidationError::InvalidGlassThickness(-4.0)));
    }

    #[test]
    fn huge_dimensions_are_out_of_range() {
        let result = DimensionRequest::new(1e20, 1e20, 1).validate();

        assert!(matches!(result, Err(ValidationError::OutOfRange { .. })));
    }

    #[test]
    fn request_deserializes_from_json_numbers() -> TestResult {
        let request: DimensionRequest =
            serde_json::from_str(r#"{"width_mm": 1200, "height_mm": 1500, "quantity": 2.5}"#)?;

        assert!(matches!(
            request.validate(),
            Err(ValidationError::InvalidQuantity(q)) if q == 2.5
        ));

        Ok(())
    }
}
