//! Cache storage trait and in-memory implementation.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

/// A single stored value and the instant it stops being visible.
#[derive(Debug, Clone)]
struct CacheEntry {
  value: Value,
  expires_at: Instant,
}

impl CacheEntry {
  fn is_live(&self, now: Instant) -> bool {
    now < self.expires_at
  }
}

/// Trait for cache storage backends.
///
/// Values are stored as JSON so a single backend can hold every entity type.
pub trait CacheStorage: Send + Sync {
  /// Get the value stored under `key`, or `None` if it is missing or expired.
  fn get(&self, key: &str) -> Option<Value>;

  /// Store `value` under `key`, visible for `ttl` from now.
  fn put(&self, key: &str, value: Value, ttl: Duration);
}

/// Storage implementation that doesn't cache anything.
/// Used when caching is disabled - all operations are no-ops.
pub struct NoopStorage;

impl CacheStorage for NoopStorage {
  fn get(&self, _key: &str) -> Option<Value> {
    None // Always miss
  }

  fn put(&self, _key: &str, _value: Value, _ttl: Duration) {
    // Discard
  }
}

/// Process-local storage guarded by a mutex. Last write wins per key.
#[derive(Default)]
pub struct MemoryStorage {
  entries: Mutex<HashMap<String, CacheEntry>>,
}

impl MemoryStorage {
  pub fn new() -> Self {
    Self::default()
  }
}

impl CacheStorage for MemoryStorage {
  fn get(&self, key: &str) -> Option<Value> {
    // A panic elsewhere can't leave a half-written entry, so poisoning is ignored.
    let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
    entries
      .get(key)
      .filter(|entry| entry.is_live(Instant::now()))
      .map(|entry| entry.value.clone())
  }

  fn put(&self, key: &str, value: Value, ttl: Duration) {
    let expires_at = Instant::now() + ttl;
    let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
    entries.insert(key.to_string(), CacheEntry { value, expires_at });
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;
  use std::sync::Arc;

  #[tokio::test(start_paused = true)]
  async fn test_value_visible_until_ttl_elapses() {
    let storage = MemoryStorage::new();
    storage.put("projects", json!(["ABC"]), Duration::from_millis(1000));

    tokio::time::advance(Duration::from_millis(999)).await;
    assert_eq!(storage.get("projects"), Some(json!(["ABC"])));

    tokio::time::advance(Duration::from_millis(1)).await;
    assert_eq!(storage.get("projects"), None);
  }

  #[tokio::test(start_paused = true)]
  async fn test_put_overwrites_and_restarts_ttl() {
    let storage = MemoryStorage::new();
    storage.put("user|a@example.com", json!("old"), Duration::from_secs(10));

    tokio::time::advance(Duration::from_secs(8)).await;
    storage.put("user|a@example.com", json!("new"), Duration::from_secs(10));

    tokio::time::advance(Duration::from_secs(8)).await;
    assert_eq!(storage.get("user|a@example.com"), Some(json!("new")));
  }

  #[test]
  fn test_missing_key_is_absent() {
    let storage = MemoryStorage::new();
    assert_eq!(storage.get("nothing"), None);
  }

  #[test]
  fn test_noop_storage_always_misses() {
    let storage = NoopStorage;
    storage.put("projects", json!([]), Duration::from_secs(60));
    assert_eq!(storage.get("projects"), None);
  }

  #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
  async fn test_concurrent_writers_leave_one_whole_value() {
    let storage = Arc::new(MemoryStorage::new());
    let written: Vec<Value> = (0..8).map(|n| json!({ "writer": n, "keys": ["ABC", "XYZ"] })).collect();

    let tasks: Vec<_> = written
      .iter()
      .cloned()
      .map(|value| {
        let storage = Arc::clone(&storage);
        let written = written.clone();
        tokio::spawn(async move {
          for _ in 0..100 {
            storage.put("projects", value.clone(), Duration::from_secs(60));
            let seen = storage.get("projects").unwrap();
            assert!(written.contains(&seen), "unexpected value {}", seen);
            tokio::task::yield_now().await;
          }
        })
      })
      .collect();

    for task in tasks {
      task.await.unwrap();
    }

    let last = storage.get("projects").unwrap();
    assert!(written.contains(&last));
  }
}
