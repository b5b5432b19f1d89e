//! Cached Jira client that wraps a [`JiraApi`] with transparent caching.

use std::sync::Arc;
use tracing::debug;

use crate::cache::CacheLayer;
use crate::error::BotResult;

use super::cache::JiraCacheKey;
use super::client::JiraApi;
use super::types::{CreatedIssue, Issue, Project, SearchResults, User};

/// Jira client with transparent caching support.
///
/// The project list and user lookups are served from the cache while their
/// entries are live; everything else goes straight to Jira.
#[derive(Clone)]
pub struct CachedJiraClient {
  inner: Arc<dyn JiraApi>,
  cache: CacheLayer,
}

impl CachedJiraClient {
  /// Create a new cached Jira client.
  pub fn new(inner: Arc<dyn JiraApi>, cache: CacheLayer) -> Self {
    Self { inner, cache }
  }

  /// List all projects, cached for an hour.
  pub async fn list_projects(&self) -> BotResult<Vec<Project>> {
    let key = JiraCacheKey::Projects;

    let result = self
      .cache
      .fetch(&key.cache_key(), key.ttl(), || {
        let inner = Arc::clone(&self.inner);
        async move { inner.list_projects().await }
      })
      .await?;

    debug!(query = %key.description(), source = ?result.source, "resolved lookup");
    Ok(result.data)
  }

  /// Find the first user matching `query`, cached for a day.
  ///
  /// A search with no match resolves to `None` and is not cached, so the
  /// next lookup asks Jira again.
  pub async fn find_user(&self, query: &str) -> BotResult<Option<User>> {
    let key = JiraCacheKey::User { query };
    let cache_key = key.cache_key();

    if let Some(user) = self.cache.get::<User>(&cache_key) {
      debug!(query = %key.description(), "resolved lookup from cache");
      return Ok(Some(user));
    }

    let user = self.inner.search_users(query).await?;
    if let Some(user) = &user {
      self.cache.put(&cache_key, user, key.ttl());
    }

    Ok(user)
  }

  /// Create a task in `project_key` (not cached - write operation).
  pub async fn create_issue(
    &self,
    project_key: &str,
    summary: &str,
    description: &str,
  ) -> BotResult<CreatedIssue> {
    self
      .inner
      .create_issue(project_key, summary, description)
      .await
  }

  pub async fn set_reporter(&self, issue_key: &str, user_login: &str) -> BotResult<()> {
    self.inner.set_reporter(issue_key, user_login).await
  }

  pub async fn add_comment(&self, issue_key: &str, text: &str) -> BotResult<()> {
    self.inner.add_comment(issue_key, text).await
  }

  /// Get a single issue by key (not cached - status changes often).
  pub async fn find_issue(&self, issue_key: &str) -> BotResult<Issue> {
    self.inner.find_issue(issue_key).await
  }

  /// Run a JQL search returning at most `max_results` issues.
  pub async fn search(&self, jql: &str, max_results: u32) -> BotResult<SearchResults> {
    self.inner.search(jql, max_results).await
  }
}
