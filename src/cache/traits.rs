//! Core types for the caching system.

/// Result from a cache operation, including where the data came from.
#[derive(Debug, Clone)]
pub struct CacheResult<T> {
  /// The actual data
  pub data: T,
  /// Where the data came from
  pub source: CacheSource,
}

impl<T> CacheResult<T> {
  /// Create a new cache result from fresh network data.
  pub fn from_network(data: T) -> Self {
    Self {
      data,
      source: CacheSource::Network,
    }
  }

  /// Create a new cache result from a live cache entry.
  pub fn from_cache(data: T) -> Self {
    Self {
      data,
      source: CacheSource::Cache,
    }
  }
}

/// Indicates where cached data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSource {
  /// Fetched from the network because there was no live entry
  Network,
  /// Served from an entry that has not expired yet
  Cache,
}
