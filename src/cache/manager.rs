//! Forecast cache with single-flight population
//!
//! Provides a `ForecastCache` that hands out shared, immutable forecast
//! tables and makes sure at most one fetch per key is in flight at a time.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{debug, info};
use tokio::sync::OnceCell;

use crate::data::{CacheKey, FetchError, ForecastClient, ForecastRequest, ForecastTable};

/// Slot for one key; `OnceCell` serializes concurrent initializers
type Slot = Arc<OnceCell<Arc<ForecastTable>>>;

/// Memo of fetched forecast tables
///
/// The cache is owned by the application and passed to whoever needs to fetch.
/// A table is populated at most once per key until [`ForecastCache::invalidate`]
/// or [`ForecastCache::invalidate_key`] drops it. A failed population leaves
/// the key empty, so the next call retries.
#[derive(Debug, Default)]
pub struct ForecastCache {
    slots: Mutex<HashMap<CacheKey, Slot>>,
}

impl ForecastCache {
    /// Creates an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    fn slots(&self) -> MutexGuard<'_, HashMap<CacheKey, Slot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn slot(&self, key: &CacheKey) -> Slot {
        Arc::clone(self.slots().entry(key.clone()).or_default())
    }

    /// Returns the cached table for `key`, or runs `populate` to produce it
    ///
    /// Concurrent callers with the same key wait for the one in-flight
    /// `populate` instead of starting their own.
    ///
    /// # Arguments
    /// * `key` - Identity of the dataset
    /// * `populate` - Produces the table on a miss; not called on a hit
    ///
    /// # Returns
    /// * `Ok(Arc<ForecastTable>)` - The cached or freshly populated table
    /// * `Err(FetchError)` - If `populate` failed; nothing is cached
    pub async fn get_or_populate<F, Fut>(
        &self,
        key: &CacheKey,
        populate: F,
    ) -> Result<Arc<ForecastTable>, FetchError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<ForecastTable, FetchError>>,
    {
        let slot = self.slot(key);

        if let Some(table) = slot.get() {
            debug!("Forecast cache hit");
            return Ok(Arc::clone(table));
        }

        let populated = slot
            .get_or_try_init(|| async {
                debug!("Forecast cache miss, populating");
                populate().await.map(Arc::new)
            })
            .await;

        match populated {
            Ok(table) => Ok(Arc::clone(table)),
            Err(err) => {
                self.discard_empty_slot(key, &slot);
                Err(err)
            }
        }
    }

    /// Removes `slot` from the map if it is still the entry for `key`, holds
    /// no table, and no other caller is waiting on it
    fn discard_empty_slot(&self, key: &CacheKey, slot: &Slot) {
        let mut slots = self.slots();
        let removable = slots.get(key).is_some_and(|current| {
            // One reference in the map and one held by the caller
            Arc::ptr_eq(current, slot) && !current.initialized() && Arc::strong_count(slot) == 2
        });
        if removable {
            slots.remove(key);
        }
    }

    /// Fetches `request` through `client`, memoized by the request's cache key
    pub async fn fetch(
        &self,
        client: &ForecastClient,
        request: &ForecastRequest,
    ) -> Result<Arc<ForecastTable>, FetchError> {
        self.get_or_populate(&request.cache_key(), || client.fetch(request))
            .await
    }

    /// Drops every cached table; the next fetch of any key hits the network
    pub fn invalidate(&self) {
        let mut slots = self.slots();
        info!("Invalidating forecast cache ({} keys)", slots.len());
        slots.clear();
    }

    /// Drops the cached table for one key
    pub fn invalidate_key(&self, key: &CacheKey) {
        self.slots().remove(key);
    }

    /// Whether a table is currently cached for `key`
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.slots()
            .get(key)
            .is_some_and(|slot| slot.initialized())
    }

    /// Number of keys with a cached table
    pub fn len(&self) -> usize {
        self.slots()
            .values()
            .filter(|slot| slot.initialized())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
