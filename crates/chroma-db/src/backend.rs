//! Runtime store selection from configuration.

use chroma_core::config::{PersistenceConfig, StoreBackend};
use tracing::info;

use crate::dragonfly::DragonflyStore;
use crate::error::StoreError;
use crate::file::FileStore;
use crate::store::{KeyValueStore, MemoryStore};

/// The store picked by [`PersistenceConfig::backend`].
#[derive(Debug)]
pub enum SaveStore {
    /// In-process map.
    Memory(MemoryStore),
    /// Directory of JSON files.
    File(FileStore),
    /// `Dragonfly`/Redis.
    Dragonfly(DragonflyStore),
}

impl SaveStore {
    /// Open the configured store.
    pub async fn open(config: &PersistenceConfig) -> Result<Self, StoreError> {
        let store = match config.backend {
            StoreBackend::Memory => Self::Memory(MemoryStore::new()),
            StoreBackend::File => Self::File(FileStore::open(&config.save_dir).await?),
            StoreBackend::Dragonfly => Self::Dragonfly(
                DragonflyStore::connect(&config.redis_url, &config.key_prefix).await?,
            ),
        };
        info!(backend = store.name(), "Save store opened");
        Ok(store)
    }

    /// Backend name for logs.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Memory(_) => "memory",
            Self::File(_) => "file",
            Self::Dragonfly(_) => "dragonfly",
        }
    }
}

impl KeyValueStore for SaveStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match self {
            Self::Memory(store) => store.get(key).await,
            Self::File(store) => store.get(key).await,
            Self::Dragonfly(store) => store.get(key).await,
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        match self {
            Self::Memory(store) => store.set(key, value).await,
            Self::File(store) => store.set(key, value).await,
            Self::Dragonfly(store) => store.set(key, value).await,
        }
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        match self {
            Self::Memory(store) => store.remove(key).await,
            Self::File(store) => store.remove(key).await,
            Self::Dragonfly(store) => store.remove(key).await,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_backend_opens_without_io() {
        let config = PersistenceConfig {
            backend: StoreBackend::Memory,
            ..PersistenceConfig::default()
        };
        let store = SaveStore::open(&config).await.unwrap();
        assert_eq!(store.name(), "memory");
        store.set("lux", "{}").await.unwrap();
        assert!(store.get("lux").await.unwrap().is_some());
    }
}
