//! Amount parsing and result formatting.

use super::error::ConversionError;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// A validated amount entered by the user.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Amount(f64);

impl Amount {
    pub fn value(&self) -> f64 {
        self.0
    }
}

/// Parses the raw amount text. Empty, non-numeric and non-finite input is rejected.
pub fn parse_amount(text: &str) -> Result<Amount, ConversionError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ConversionError::Validation(
            "Please enter a valid numeric amount.".to_string(),
        ));
    }

    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(Amount(value)),
        _ => Err(ConversionError::Validation(format!(
            "'{trimmed}' is not a valid numeric amount."
        ))),
    }
}

/// Formats `value` with exactly two fractional digits, rounding half away from zero.
pub fn format_two_decimals(value: f64) -> Option<String> {
    let mut decimal = Decimal::from_f64(value)?
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    decimal.rescale(2);
    Some(decimal.to_string())
}

/// Multiplies `amount` by `rate` and renders the two-decimal result.
pub fn convert_amount(amount: Amount, rate: f64) -> Option<String> {
    let product = amount.value() * rate;
    if !product.is_finite() {
        return None;
    }
    format_two_decimals(product)
}
