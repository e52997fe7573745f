//! In-memory converter state and the pure transitions applied to it.
//!
//! Every transition consumes the current state and returns the next one, so the
//! controller logic can be exercised without any user interface.

use super::currency::CurrencyCode;
use super::error::ConversionError;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConverterState {
    pub amount: String,
    pub currencies: Vec<CurrencyCode>,
    pub from: Option<CurrencyCode>,
    pub to: Option<CurrencyCode>,
    pub result: String,
    pub busy: bool,
}

/// Snapshot of the inputs needed for one conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionRequest {
    pub amount: String,
    pub from: CurrencyCode,
    pub to: CurrencyCode,
}

impl ConverterState {
    /// Replaces the currency list and resets the selection to `default_from` and the
    /// first other code. `to` stays unset when no other code exists.
    pub fn with_currencies(self, currencies: Vec<CurrencyCode>, default_from: &str) -> Self {
        let to = currencies.iter().find(|c| *c != default_from).cloned();
        ConverterState {
            currencies,
            from: Some(default_from.to_string()),
            to,
            ..self
        }
    }

    /// Replaces the currency list while keeping the current selection.
    pub fn with_refreshed_currencies(self, currencies: Vec<CurrencyCode>) -> Self {
        ConverterState { currencies, ..self }
    }

    pub fn with_amount(self, amount: &str) -> Self {
        ConverterState {
            amount: amount.to_string(),
            ..self
        }
    }

    pub fn with_result(self, result: &str) -> Self {
        ConverterState {
            result: result.to_string(),
            ..self
        }
    }

    pub fn with_busy(self, busy: bool) -> Self {
        ConverterState { busy, ..self }
    }

    pub fn select_from(self, code: &str) -> Result<Self, ConversionError> {
        let code = self.known_currency(code)?;
        Ok(ConverterState {
            from: Some(code),
            ..self
        })
    }

    pub fn select_to(self, code: &str) -> Result<Self, ConversionError> {
        let code = self.known_currency(code)?;
        Ok(ConverterState {
            to: Some(code),
            ..self
        })
    }

    pub fn swapped(self) -> Self {
        ConverterState {
            from: self.to.clone(),
            to: self.from.clone(),
            ..self
        }
    }

    /// Empties the amount and the displayed result. Currencies and selection are kept.
    pub fn cleared(self) -> Self {
        ConverterState {
            amount: String::new(),
            result: String::new(),
            ..self
        }
    }

    /// Builds the request for the current selection, checking both currencies belong
    /// to the loaded set.
    pub fn request(&self) -> Result<ConversionRequest, ConversionError> {
        let from = self
            .from
            .as_deref()
            .ok_or_else(|| {
                ConversionError::InvalidSelection("No source currency selected.".to_string())
            })?;
        let to = self
            .to
            .as_deref()
            .ok_or_else(|| {
                ConversionError::InvalidSelection("No target currency selected.".to_string())
            })?;

        Ok(ConversionRequest {
            amount: self.amount.clone(),
            from: self.known_currency(from)?,
            to: self.known_currency(to)?,
        })
    }

    fn known_currency(&self, code: &str) -> Result<CurrencyCode, ConversionError> {
        let code = code.trim().to_uppercase();
        if self.currencies.contains(&code) {
            Ok(code)
        } else {
            Err(ConversionError::InvalidSelection(format!(
                "Unknown currency: {code}"
            )))
        }
    }
}
