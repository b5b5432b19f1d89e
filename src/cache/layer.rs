//! Cache layer that orchestrates caching logic with network fetching.

use serde::{de::DeserializeOwned, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::storage::CacheStorage;
use super::traits::CacheResult;

/// Typed front end over a [`CacheStorage`] backend.
///
/// Cloning is cheap; clones share the same backend.
#[derive(Clone)]
pub struct CacheLayer {
  storage: Arc<dyn CacheStorage>,
}

impl CacheLayer {
  /// Create a new cache layer with the given storage backend.
  pub fn new(storage: impl CacheStorage + 'static) -> Self {
    Self {
      storage: Arc::new(storage),
    }
  }

  /// Read a live entry. Presence check and value come from a single lookup.
  ///
  /// An entry that no longer deserializes as `T` counts as a miss.
  pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
    let value = self.storage.get(key)?;
    match serde_json::from_value(value) {
      Ok(data) => Some(data),
      Err(e) => {
        debug!(key, error = %e, "discarding unreadable cache entry");
        None
      }
    }
  }

  /// Store `data` under `key` for `ttl`.
  pub fn put<T: Serialize>(&self, key: &str, data: &T, ttl: Duration) {
    match serde_json::to_value(data) {
      Ok(value) => self.storage.put(key, value, ttl),
      Err(e) => warn!(key, error = %e, "failed to serialize value for cache"),
    }
  }

  /// Fetch with cache-first strategy.
  ///
  /// 1. Live entry - return it without calling `fetcher`
  /// 2. Otherwise call `fetcher`; on success store the result for `ttl`
  /// 3. Fetch errors are returned as-is and nothing is stored
  pub async fn fetch<T, E, F, Fut>(
    &self,
    key: &str,
    ttl: Duration,
    fetcher: F,
  ) -> Result<CacheResult<T>, E>
  where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
  {
    if let Some(data) = self.get(key) {
      return Ok(CacheResult::from_cache(data));
    }

    let data = fetcher().await?;
    self.put(key, &data, ttl);
    Ok(CacheResult::from_network(data))
  }
}
