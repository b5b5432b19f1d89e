//! In-memory [`JiraApi`] used by tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::{BotError, BotResult};
use crate::jira::client::JiraApi;
use crate::jira::types::{CreatedIssue, Issue, Project, SearchResults, Status, User};

#[derive(Default)]
struct Recorded {
  calls: HashMap<&'static str, usize>,
  created: Vec<(String, String, String)>,
  reporters: Vec<(String, String)>,
  comments: Vec<(String, String)>,
}

#[derive(Default)]
pub struct FakeJira {
  projects: Vec<Project>,
  users: Vec<User>,
  issues: Vec<Issue>,
  fail_projects: bool,
  fail_follow_ups: bool,
  fail_search: bool,
  recorded: Mutex<Recorded>,
}

pub fn issue(key: &str, summary: &str, status: &str) -> Issue {
  Issue {
    key: key.to_string(),
    summary: summary.to_string(),
    description: None,
    status: Status {
      name: status.to_string(),
      category: None,
    },
    reporter: None,
    assignee: None,
  }
}

impl FakeJira {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_project(mut self, key: &str, name: &str) -> Self {
    self.projects.push(Project {
      key: key.to_string(),
      name: name.to_string(),
    });
    self
  }

  pub fn with_user(mut self, name: &str, display_name: &str, email: &str) -> Self {
    self.users.push(User {
      name: name.to_string(),
      display_name: display_name.to_string(),
      email: Some(email.to_string()),
    });
    self
  }

  pub fn with_issue(mut self, issue: Issue) -> Self {
    self.issues.push(issue);
    self
  }

  pub fn failing_projects(mut self) -> Self {
    self.fail_projects = true;
    self
  }

  /// Make reporter assignment and commenting fail.
  pub fn failing_follow_ups(mut self) -> Self {
    self.fail_follow_ups = true;
    self
  }

  pub fn failing_search(mut self) -> Self {
    self.fail_search = true;
    self
  }

  pub fn calls(&self, name: &str) -> usize {
    let recorded = self.recorded.lock().unwrap();
    recorded.calls.get(name).copied().unwrap_or(0)
  }

  pub fn created(&self) -> Vec<(String, String, String)> {
    self.recorded.lock().unwrap().created.clone()
  }

  pub fn reporters(&self) -> Vec<(String, String)> {
    self.recorded.lock().unwrap().reporters.clone()
  }

  pub fn comments(&self) -> Vec<(String, String)> {
    self.recorded.lock().unwrap().comments.clone()
  }

  fn record(&self, name: &'static str) {
    *self.recorded.lock().unwrap().calls.entry(name).or_default() += 1;
  }
}

#[async_trait]
impl JiraApi for FakeJira {
  async fn list_projects(&self) -> BotResult<Vec<Project>> {
    self.record("list_projects");
    if self.fail_projects {
      return Err(BotError::Remote("connection refused".to_string()));
    }
    Ok(self.projects.clone())
  }

  async fn search_users(&self, query: &str) -> BotResult<Option<User>> {
    self.record("search_users");
    Ok(
      self
        .users
        .iter()
        .find(|u| u.email.as_deref() == Some(query) || u.name == query)
        .cloned(),
    )
  }

  async fn create_issue(
    &self,
    project_key: &str,
    summary: &str,
    description: &str,
  ) -> BotResult<CreatedIssue> {
    self.record("create_issue");
    if !self.projects.iter().any(|p| p.key == project_key) {
      return Err(BotError::Creation);
    }

    let mut recorded = self.recorded.lock().unwrap();
    recorded.created.push((
      project_key.to_string(),
      summary.to_string(),
      description.to_string(),
    ));
    let number = recorded.created.len();
    Ok(CreatedIssue {
      id: format!("1000{}", number),
      key: format!("{}-{}", project_key, number),
    })
  }

  async fn set_reporter(&self, issue_key: &str, user_login: &str) -> BotResult<()> {
    self.record("set_reporter");
    if self.fail_follow_ups {
      return Err(BotError::Remote("reporter is not editable".to_string()));
    }
    let mut recorded = self.recorded.lock().unwrap();
    recorded
      .reporters
      .push((issue_key.to_string(), user_login.to_string()));
    Ok(())
  }

  async fn add_comment(&self, issue_key: &str, text: &str) -> BotResult<()> {
    self.record("add_comment");
    if self.fail_follow_ups {
      return Err(BotError::Remote("comments are disabled".to_string()));
    }
    let mut recorded = self.recorded.lock().unwrap();
    recorded
      .comments
      .push((issue_key.to_string(), text.to_string()));
    Ok(())
  }

  async fn find_issue(&self, issue_key: &str) -> BotResult<Issue> {
    self.record("find_issue");
    self
      .issues
      .iter()
      .find(|i| i.key == issue_key)
      .cloned()
      .ok_or_else(|| BotError::NotFound(format!("Issue {} does not exist.", issue_key)))
  }

  async fn search(&self, jql: &str, max_results: u32) -> BotResult<SearchResults> {
    self.record("search");
    if self.fail_search {
      return Err(BotError::Query(format!("Error in the JQL Query: {}", jql)));
    }
    Ok(SearchResults {
      total: self.issues.len() as u64,
      issues: self
        .issues
        .iter()
        .take(max_results as usize)
        .cloned()
        .collect(),
    })
  }
}
