//! Collection ledger: per-user multiset of owned creature copies.
//!
//! Stored as one `collection_<user>` record mapping creature id to copy count.
//! A count never goes below zero and a count of zero is never stored.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::error::{PortalError, PortalResult};
use crate::store::{KvStore, KvStoreExt};

pub mod endpoints;

pub type Collection = BTreeMap<u32, u32>;

fn collection_key(user_id: &str) -> String {
    format!("collection_{user_id}")
}

#[derive(Clone)]
pub struct Ledger {
    store: Arc<dyn KvStore>,
}

impl Ledger {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Ledger { store }
    }

    pub async fn get_all(&self, user_id: &str) -> PortalResult<Collection> {
        Ok(self
            .store
            .load(&collection_key(user_id))
            .await?
            .unwrap_or_default())
    }

    async fn put_all(&self, user_id: &str, collection: &Collection) -> PortalResult<()> {
        self.store.save(&collection_key(user_id), collection).await
    }

    pub async fn count(&self, user_id: &str, creature_id: u32) -> PortalResult<u32> {
        Ok(self
            .get_all(user_id)
            .await?
            .get(&creature_id)
            .copied()
            .unwrap_or(0))
    }

    /// Number of distinct creatures owned.
    pub async fn unique_count(&self, user_id: &str) -> PortalResult<usize> {
        Ok(self.get_all(user_id).await?.len())
    }

    pub async fn increment(&self, user_id: &str, creature_id: u32, n: u32) -> PortalResult<u32> {
        let mut collection = self.get_all(user_id).await?;
        let count = collection.entry(creature_id).or_insert(0);
        *count += n;
        let count = *count;
        self.put_all(user_id, &collection).await?;
        Ok(count)
    }

    pub async fn decrement(&self, user_id: &str, creature_id: u32, n: u32) -> PortalResult<u32> {
        let mut collection = self.get_all(user_id).await?;
        let owned = collection.get(&creature_id).copied().unwrap_or(0);
        if owned < n {
            return Err(PortalError::NotOwned);
        }
        let left = owned - n;
        if left == 0 {
            collection.remove(&creature_id);
        } else {
            collection.insert(creature_id, left);
        }
        self.put_all(user_id, &collection).await?;
        Ok(left)
    }

    /// Adds one copy per id in `creature_ids` and returns the distinct ids the
    /// user did not own before this call.
    pub async fn add_all(&self, user_id: &str, creature_ids: &[u32]) -> PortalResult<Vec<u32>> {
        let mut collection = self.get_all(user_id).await?;
        let mut fresh = BTreeSet::new();
        for id in creature_ids {
            let count = collection.entry(*id).or_insert(0);
            if *count == 0 {
                fresh.insert(*id);
            }
            *count += 1;
        }
        self.put_all(user_id, &collection).await?;
        Ok(fresh.into_iter().collect())
    }

    /// Starter grant: one copy of each id.
    pub async fn seed(&self, user_id: &str, creature_ids: &[u32]) -> PortalResult<()> {
        let collection: Collection = creature_ids.iter().map(|id| (*id, 1)).collect();
        self.put_all(user_id, &collection).await
    }
}
