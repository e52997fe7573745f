use crate::core::error::ConversionError;
use crate::core::store::PersistenceStore;
use anyhow::{Context, Result};
use async_trait::async_trait;
use fjall::{Config, Keyspace, PartitionCreateOptions, PartitionHandle, PersistMode};
use std::path::Path;
use tracing::debug;

const PARTITION: &str = "settings";

/// fjall-backed store. Every write is synced so values survive a restart.
#[derive(Clone)]
pub struct DiskStore {
    keyspace: Keyspace,
    partition: PartitionHandle,
}

impl DiskStore {
    pub fn open(path: &Path) -> Result<Self> {
        std::fs::create_dir_all(path)
            .with_context(|| format!("Failed to create data directory: {}", path.display()))?;

        let keyspace = Config::new(path)
            .open()
            .with_context(|| format!("Failed to open store at {}", path.display()))?;
        let partition = keyspace
            .open_partition(PARTITION, PartitionCreateOptions::default())
            .context("Failed to open store partition")?;
        debug!("Opened disk store at {}", path.display());

        Ok(Self {
            keyspace,
            partition,
        })
    }
}

fn storage_error(e: impl std::fmt::Display) -> ConversionError {
    ConversionError::Storage(e.to_string())
}

#[async_trait]
impl PersistenceStore for DiskStore {
    async fn get_item(&self, key: &str) -> Result<Option<String>, ConversionError> {
        let Some(bytes) = self.partition.get(key).map_err(storage_error)? else {
            debug!("Store MISS for key: {}", key);
            return Ok(None);
        };
        debug!("Store HIT for key: {}", key);
        String::from_utf8(bytes.to_vec())
            .map(Some)
            .map_err(storage_error)
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<(), ConversionError> {
        self.partition.insert(key, value).map_err(storage_error)?;
        self.keyspace
            .persist(PersistMode::SyncAll)
            .map_err(storage_error)?;
        debug!("Store PUT for key: {}", key);
        Ok(())
    }
}
