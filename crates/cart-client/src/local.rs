//! Guest cart persistence.
//!
//! [`LocalStorage`] is a string key/value store, the shape of a browser's
//! `localStorage`. [`LocalCart`] keeps the guest cart under one key as
//! `{ "version": 1, "items": [...] }`. Older clients wrote a bare array of
//! items; that form is still read and is rewritten in the versioned form on
//! first load.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use brana_core::CartLineItem;

use crate::error::ClientError;

/// Storage key holding the guest cart.
pub const CART_KEY: &str = "brana.cart";

/// Current envelope version.
const CART_FORMAT_VERSION: u32 = 1;

/// String key/value storage that outlives the process.
#[async_trait]
pub trait LocalStorage: Send + Sync {
    /// Read a value.
    async fn get(&self, key: &str) -> Result<Option<String>, ClientError>;

    /// Write a value, replacing any previous one.
    async fn set(&self, key: &str, value: &str) -> Result<(), ClientError>;

    /// Delete a value. Deleting a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<(), ClientError>;
}

/// In-process storage, for tests and headless use.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LocalStorage for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, ClientError> {
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), ClientError> {
        self.values
            .write()
            .await
            .insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), ClientError> {
        self.values.write().await.remove(key);
        Ok(())
    }
}

/// One file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Store values under `dir`, which is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, key: &str) -> PathBuf {
        let file: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{file}.json"))
    }
}

#[async_trait]
impl LocalStorage for FileStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, ClientError> {
        match tokio::fs::read_to_string(self.path(key)).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), ClientError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        // Write then rename so a crash never leaves half a cart behind.
        let path = self.path(key);
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, value).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), ClientError> {
        match tokio::fs::remove_file(self.path(key)).await {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    version: u32,
    items: Vec<CartLineItem>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StoredCart {
    Versioned(Envelope),
    Legacy(Vec<CartLineItem>),
}

/// The guest cart as kept in local storage.
#[derive(Clone)]
pub struct LocalCart {
    storage: Arc<dyn LocalStorage>,
}

impl LocalCart {
    #[must_use]
    pub fn new(storage: Arc<dyn LocalStorage>) -> Self {
        Self { storage }
    }

    /// Read the stored items.
    ///
    /// A legacy array is rewritten in the versioned form. Unreadable content
    /// is logged and treated as an empty cart rather than blocking the shopper.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage itself fails.
    pub async fn load(&self) -> Result<Vec<CartLineItem>, ClientError> {
        let Some(raw) = self.storage.get(CART_KEY).await? else {
            return Ok(Vec::new());
        };

        match serde_json::from_str::<StoredCart>(&raw) {
            Ok(StoredCart::Versioned(envelope)) if envelope.version == CART_FORMAT_VERSION => {
                Ok(envelope.items)
            }
            Ok(StoredCart::Versioned(envelope)) => {
                tracing::warn!(
                    version = envelope.version,
                    "Unknown local cart version, starting empty"
                );
                Ok(Vec::new())
            }
            Ok(StoredCart::Legacy(items)) => {
                tracing::debug!(count = items.len(), "Upgrading legacy local cart");
                self.save(&items).await?;
                Ok(items)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Discarding unreadable local cart");
                Ok(Vec::new())
            }
        }
    }

    /// Overwrite the stored items.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or the storage write fails.
    pub async fn save(&self, items: &[CartLineItem]) -> Result<(), ClientError> {
        let envelope = serde_json::json!({
            "version": CART_FORMAT_VERSION,
            "items": items,
        });
        self.storage
            .set(CART_KEY, &serde_json::to_string(&envelope)?)
            .await
    }

    /// Delete the stored cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage delete fails.
    pub async fn clear(&self) -> Result<(), ClientError> {
        self.storage.remove(CART_KEY).await
    }

    /// The raw stored value, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage read fails.
    pub async fn raw(&self) -> Result<Option<String>, ClientError> {
        self.storage.get(CART_KEY).await
    }
}
