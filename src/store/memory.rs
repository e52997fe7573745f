use crate::core::error::ConversionError;
use crate::core::store::PersistenceStore;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// In-memory store. Values live as long as the process.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PersistenceStore for MemoryStore {
    async fn get_item(&self, key: &str) -> Result<Option<String>, ConversionError> {
        let items = self.inner.lock().await;
        let value = items.get(key).cloned();
        if value.is_some() {
            debug!("Store HIT for key: {}", key);
        } else {
            debug!("Store MISS for key: {}", key);
        }
        Ok(value)
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<(), ConversionError> {
        let mut items = self.inner.lock().await;
        debug!("Store PUT for key: {}", key);
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
