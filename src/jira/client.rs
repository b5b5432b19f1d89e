use async_trait::async_trait;
use color_eyre::{eyre::eyre, Result};
use serde_json::{json, Value};
use tracing::debug;
use url::form_urlencoded;

use crate::config::Config;
use crate::error::{BotError, BotResult};
use crate::jira::api_types::{
  ApiCreatedIssue, ApiIssue, ApiProject, ApiSearchResponse, ApiUser, ISSUE_FIELDS,
};
use crate::jira::types::{CreatedIssue, Issue, Project, SearchResults, User};

/// Issue type id for "Task" on a default Jira install
const TASK_ISSUE_TYPE_ID: &str = "3";

/// Label attached to every ticket the bot creates
const CREATED_LABEL: &str = "slack-created";

/// Remote operations the bot needs from Jira.
///
/// Implemented by [`JiraClient`] against the REST API, and by an in-memory
/// fake in tests.
#[async_trait]
pub trait JiraApi: Send + Sync {
  async fn list_projects(&self) -> BotResult<Vec<Project>>;

  /// First user matching `query`, or `None` if nobody matches.
  async fn search_users(&self, query: &str) -> BotResult<Option<User>>;

  async fn create_issue(
    &self,
    project_key: &str,
    summary: &str,
    description: &str,
  ) -> BotResult<CreatedIssue>;

  async fn set_reporter(&self, issue_key: &str, user_login: &str) -> BotResult<()>;

  async fn add_comment(&self, issue_key: &str, text: &str) -> BotResult<()>;

  async fn find_issue(&self, issue_key: &str) -> BotResult<Issue>;

  async fn search(&self, jql: &str, max_results: u32) -> BotResult<SearchResults>;
}

/// Jira API client wrapper
#[derive(Clone)]
pub struct JiraClient {
  client: gouqi::r#async::Jira,
}

impl JiraClient {
  pub fn new(config: &Config) -> Result<Self> {
    let password = Config::get_password()?;

    let credentials = gouqi::Credentials::Basic(config.jira.username.clone(), password);

    let client = gouqi::r#async::Jira::new(&config.jira.base_url(), credentials)
      .map_err(|e| eyre!("Failed to create Jira client: {}", e))?;

    Ok(Self { client })
  }
}

fn remote(context: &str, e: gouqi::Error) -> BotError {
  BotError::Remote(format!("{}: {}", context, e))
}

#[async_trait]
impl JiraApi for JiraClient {
  async fn list_projects(&self) -> BotResult<Vec<Project>> {
    let projects: Vec<ApiProject> = self
      .client
      .get("api", "/project")
      .await
      .map_err(|e| remote("Failed to list projects", e))?;

    Ok(projects.into_iter().map(Project::from).collect())
  }

  async fn search_users(&self, query: &str) -> BotResult<Option<User>> {
    let params: String = form_urlencoded::Serializer::new(String::new())
      .append_pair("username", query)
      .append_pair("startAt", "0")
      .append_pair("maxResults", "1")
      .append_pair("includeActive", "true")
      .append_pair("includeInactive", "true")
      .finish();
    let endpoint = format!("/user/search?{}", params);

    let users: Vec<ApiUser> = self
      .client
      .get("api", &endpoint)
      .await
      .map_err(|e| remote("Failed to search users", e))?;

    Ok(users.into_iter().next().map(User::from))
  }

  async fn create_issue(
    &self,
    project_key: &str,
    summary: &str,
    description: &str,
  ) -> BotResult<CreatedIssue> {
    let body = json!({
      "fields": {
        "project": { "key": project_key },
        "summary": summary,
        "description": description,
        "issuetype": { "id": TASK_ISSUE_TYPE_ID },
        "labels": [CREATED_LABEL]
      }
    });

    let created: ApiCreatedIssue = self
      .client
      .post("api", "/issue", body)
      .await
      .map_err(|e| {
        debug!(project = project_key, error = %e, "Jira rejected new issue");
        BotError::Creation
      })?;

    Ok(created.into())
  }

  async fn set_reporter(&self, issue_key: &str, user_login: &str) -> BotResult<()> {
    let endpoint = format!("/issue/{}", issue_key);
    let body = json!({
      "fields": {
        "reporter": { "name": user_login }
      }
    });

    self
      .client
      .put::<Value, _>("api", &endpoint, body)
      .await
      .map_err(|e| remote("Failed to set reporter", e))?;

    Ok(())
  }

  async fn add_comment(&self, issue_key: &str, text: &str) -> BotResult<()> {
    let endpoint = format!("/issue/{}/comment", issue_key);
    let body = json!({ "body": text });

    self
      .client
      .post::<Value, _>("api", &endpoint, body)
      .await
      .map_err(|e| remote("Failed to add comment", e))?;

    Ok(())
  }

  async fn find_issue(&self, issue_key: &str) -> BotResult<Issue> {
    let endpoint = format!("/issue/{}?fields={}", issue_key, ISSUE_FIELDS.join(","));

    let issue: ApiIssue = self
      .client
      .get("api", &endpoint)
      .await
      .map_err(|e| match e {
        gouqi::Error::NotFound => BotError::NotFound(format!("Issue {} does not exist.", issue_key)),
        e => remote(&format!("Failed to get issue {}", issue_key), e),
      })?;

    Ok(issue.into_issue())
  }

  async fn search(&self, jql: &str, max_results: u32) -> BotResult<SearchResults> {
    let body = json!({
      "jql": jql,
      "startAt": 0,
      "maxResults": max_results,
      "fields": ISSUE_FIELDS
    });

    let response: ApiSearchResponse = self
      .client
      .post("api", "/search", body)
      .await
      .map_err(|e| BotError::Query(e.to_string()))?;

    Ok(response.into())
  }
}
