//! In-memory lookup cache with per-entry expiry.
//!
//! This module provides a Jira-agnostic caching mechanism that:
//! - Stores any serializable value under a string key
//! - Expires each entry lazily once its TTL has elapsed
//! - Offers a get-or-fetch helper so callers read the cache exactly once

mod layer;
mod storage;
mod traits;

pub use layer::CacheLayer;
pub use storage::{MemoryStorage, NoopStorage};
