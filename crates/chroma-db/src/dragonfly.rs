//! `Dragonfly` (Redis-compatible) store.
//!
//! Every key is namespaced under a prefix so several saves can share one
//! instance.
//!
//! # Key Pattern
//!
//! | Pattern | Type | Description |
//! |---------|------|-------------|
//! | `{prefix}:{key}` | JSON string | One persisted record |

use fred::prelude::*;

use crate::error::StoreError;
use crate::store::KeyValueStore;

/// Connection handle to a `Dragonfly` instance.
#[derive(Clone)]
pub struct DragonflyStore {
    client: Client,
    prefix: String,
}

impl DragonflyStore {
    /// Connect to `Dragonfly` at `url` and namespace keys under `prefix`.
    ///
    /// The URL follows the Redis scheme: `redis://host:port` or
    /// `redis://host:port/db`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Config`] if the URL cannot be parsed.
    /// Returns [`StoreError::Dragonfly`] if the connection fails.
    pub async fn connect(url: &str, prefix: &str) -> Result<Self, StoreError> {
        let config = Config::from_url(url)
            .map_err(|e| StoreError::Config(format!("Invalid Dragonfly URL: {e}")))?;

        let client = Builder::from_config(config).build()?;
        client.init().await?;

        tracing::info!(prefix, "Connected to Dragonfly");
        Ok(Self {
            client,
            prefix: prefix.to_owned(),
        })
    }

    /// Full key for a record.
    pub fn namespaced(&self, key: &str) -> String {
        format!("{}:{key}", self.prefix)
    }

    /// Return a reference to the underlying [`Client`].
    pub const fn client(&self) -> &Client {
        &self.client
    }
}

impl std::fmt::Debug for DragonflyStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DragonflyStore")
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

impl KeyValueStore for DragonflyStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let value: Option<String> = self.client.get(self.namespaced(key)).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let _: () = self
            .client
            .set(self.namespaced(key), value, None, None, false)
            .await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        let _: u32 = self.client.del(self.namespaced(key)).await?;
        Ok(())
    }
}
