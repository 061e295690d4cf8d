//! Key-value persistence seam.
//!
//! Engines only see `KvStore`: opaque JSON values under string keys, no
//! transactions and no locking. Every engine operation is a sequence of
//! independent read-modify-write round trips through this trait.

use std::collections::BTreeMap;

use rocket::futures::lock::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::PortalResult;

#[rocket::async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> PortalResult<Option<Value>>;
    async fn set(&self, key: &str, value: Value) -> PortalResult<()>;
    async fn delete(&self, key: &str) -> PortalResult<()>;
    /// Values of every key starting with `prefix`, in key order.
    async fn get_by_prefix(&self, prefix: &str) -> PortalResult<Vec<Value>>;
}

/// Typed access on top of any `KvStore`.
#[rocket::async_trait]
pub trait KvStoreExt: KvStore {
    async fn load<T: DeserializeOwned + Send>(&self, key: &str) -> PortalResult<Option<T>> {
        match self.get(key).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    async fn save<T: Serialize + Sync>(&self, key: &str, value: &T) -> PortalResult<()> {
        let value = serde_json::to_value(value)?;
        self.set(key, value).await
    }
}

impl<S: KvStore + ?Sized> KvStoreExt for S {}

/// In-process store backed by an ordered map.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[rocket::async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, key: &str) -> PortalResult<Option<Value>> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> PortalResult<()> {
        self.entries.lock().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> PortalResult<()> {
        self.entries.lock().await.remove(key);
        Ok(())
    }

    async fn get_by_prefix(&self, prefix: &str) -> PortalResult<Vec<Value>> {
        let entries = self.entries.lock().await;
        Ok(entries
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(_, v)| v.clone())
            .collect())
    }
}
