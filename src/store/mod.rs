pub mod disk;
pub mod memory;

use crate::core::config::AppConfig;
use crate::core::store::PersistenceStore;
use anyhow::Result;
use disk::DiskStore;
use memory::MemoryStore;
use std::sync::Arc;

/// Opens the store the application should use: the fjall store under the configured
/// data path, or an in-memory one for ephemeral runs.
pub fn open_store(config: &AppConfig, ephemeral: bool) -> Result<Arc<dyn PersistenceStore>> {
    if ephemeral {
        return Ok(Arc::new(MemoryStore::new()));
    }

    let path = config.data_path()?;
    Ok(Arc::new(DiskStore::open(&path)?))
}
