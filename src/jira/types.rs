use serde::{Deserialize, Serialize};

/// Project as listed by `projects`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
  pub key: String,
  pub name: String,
}

/// Jira account found by a user search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
  /// Login name, used when assigning the reporter
  pub name: String,
  pub display_name: String,
  pub email: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Status {
  pub name: String,
  /// Status category name ("To Do", "In Progress", "Done", ...)
  pub category: Option<String>,
}

/// Full issue details
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
  pub key: String,
  pub summary: String,
  pub description: Option<String>,
  pub status: Status,
  pub reporter: Option<String>,
  pub assignee: Option<String>,
}

/// Identity of a ticket Jira just created
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedIssue {
  pub id: String,
  pub key: String,
}

/// One page of a JQL search
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchResults {
  /// Number of matches on the server, not just the ones returned
  pub total: u64,
  pub issues: Vec<Issue>,
}
