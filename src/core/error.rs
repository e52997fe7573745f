//! Error taxonomy for conversion operations.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConversionError {
    /// Bad input caught before any network call.
    #[error("Invalid Amount: {0}")]
    Validation(String),

    /// Currency selection outside the loaded set, or no selection at all.
    #[error("{0}")]
    InvalidSelection(String),

    #[error("Failed to fetch rates for {base}: {message}")]
    RateFetch { base: String, message: String },

    #[error("No rate for {to} in the {from} rate table")]
    MissingRate { from: String, to: String },

    /// The converted value cannot be represented with two decimals.
    #[error("Converting {from} to {to} gives a value out of range")]
    OutOfRange { from: String, to: String },

    #[error("Another operation is already in progress")]
    Busy,

    #[error("Storage error: {0}")]
    Storage(String),
}

impl ConversionError {
    pub fn rate_fetch(base: &str, message: impl Into<String>) -> Self {
        ConversionError::RateFetch {
            base: base.to_string(),
            message: message.into(),
        }
    }

    /// Storage failures are logged by the controller and never shown to the user.
    pub fn is_user_visible(&self) -> bool {
        !matches!(self, ConversionError::Storage(_))
    }

    /// Title used when the error is shown as a notification.
    pub fn title(&self) -> &'static str {
        match self {
            ConversionError::Validation(_) => "Invalid Amount",
            ConversionError::InvalidSelection(_) => "Invalid Currency",
            ConversionError::Busy => "Busy",
            _ => "Error",
        }
    }
}
