//! Persistence abstractions

use super::error::ConversionError;
use async_trait::async_trait;

/// Key under which the last conversion result is stored.
pub const LAST_RESULT_KEY: &str = "lastConversionAmount";

#[async_trait]
pub trait PersistenceStore: Send + Sync {
    async fn get_item(&self, key: &str) -> Result<Option<String>, ConversionError>;
    async fn set_item(&self, key: &str, value: &str) -> Result<(), ConversionError>;
}
