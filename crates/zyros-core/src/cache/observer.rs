//! Observer handles
//!
//! Holding a [`QueryObserver`] keeps its entry alive and makes invalidation
//! refetch it right away. Dropping the handle detaches it.

use super::query_cache::QueryCache;
use super::types::{QueryKey, QuerySnapshot};
use crate::error::{ZyrosError, ZyrosResult};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::watch;

/// Subscription to one query key
pub struct QueryObserver {
    cache: QueryCache,
    key: QueryKey,
    entry_id: u64,
    receiver: watch::Receiver<QuerySnapshot>,
}

impl QueryObserver {
    pub(crate) fn new(
        cache: QueryCache,
        key: QueryKey,
        entry_id: u64,
        receiver: watch::Receiver<QuerySnapshot>,
    ) -> Self {
        Self {
            cache,
            key,
            entry_id,
            receiver,
        }
    }

    pub fn key(&self) -> &QueryKey {
        &self.key
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> QuerySnapshot {
        self.receiver.borrow().clone()
    }

    /// Wait for the next published snapshot
    ///
    /// Fails with [`ZyrosError::Cancelled`] once the entry has been removed.
    pub async fn changed(&mut self) -> ZyrosResult<QuerySnapshot> {
        self.receiver
            .changed()
            .await
            .map_err(|_| ZyrosError::Cancelled)?;
        Ok(self.receiver.borrow_and_update().clone())
    }

    /// Wait until no fetch is running and return that snapshot
    pub async fn settled(&mut self) -> ZyrosResult<QuerySnapshot> {
        let snapshot = self
            .receiver
            .wait_for(|snapshot| !snapshot.is_fetching)
            .await
            .map_err(|_| ZyrosError::Cancelled)?;
        Ok(snapshot.clone())
    }

    /// Typed payload of the latest snapshot
    pub fn data_as<T: DeserializeOwned>(&self) -> ZyrosResult<Option<T>> {
        self.receiver.borrow().data_as()
    }

    /// Fetch now, ignoring freshness
    pub async fn refetch(&self) -> ZyrosResult<Value> {
        self.cache.refetch(&self.key).await
    }

    /// Detach explicitly
    pub fn unsubscribe(self) {}
}

impl Drop for QueryObserver {
    fn drop(&mut self) {
        self.cache.detach(&self.key, self.entry_id);
    }
}

impl std::fmt::Debug for QueryObserver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryObserver").field("key", &self.key).finish()
    }
}
