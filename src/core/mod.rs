//! Core conversion logic and the seams to its collaborators

pub mod amount;
pub mod config;
pub mod controller;
pub mod currency;
pub mod error;
pub mod log;
pub mod state;
pub mod store;

// Re-export main types for cleaner imports
pub use controller::ConversionController;
pub use currency::{CurrencyCode, RateSource, RateTable};
pub use error::ConversionError;
pub use state::{ConversionRequest, ConverterState};
pub use store::{LAST_RESULT_KEY, PersistenceStore};
