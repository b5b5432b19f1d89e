//! Cache keys and lifetimes for Jira lookups.

use std::time::Duration;

/// Project list changes rarely; keep it for an hour.
pub const PROJECTS_TTL: Duration = Duration::from_millis(3_600_000);

/// User lookups are keyed by email and kept for a day.
pub const USER_TTL: Duration = Duration::from_millis(86_400_000);

/// Lookups that go through the cache.
#[derive(Clone, Debug)]
pub enum JiraCacheKey<'a> {
  /// Every project visible to the bot account
  Projects,
  /// First user matching a search query
  User { query: &'a str },
}

impl JiraCacheKey<'_> {
  pub fn cache_key(&self) -> String {
    match self {
      Self::Projects => "projects".to_string(),
      Self::User { query } => format!("user|{}", query),
    }
  }

  pub fn ttl(&self) -> Duration {
    match self {
      Self::Projects => PROJECTS_TTL,
      Self::User { .. } => USER_TTL,
    }
  }

  pub fn description(&self) -> String {
    match self {
      Self::Projects => "all projects".to_string(),
      Self::User { query } => format!("user {}", query),
    }
  }
}
