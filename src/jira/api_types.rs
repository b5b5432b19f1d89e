//! Serde-deserializable types matching Jira API responses.
//!
//! These types are separate from domain types to allow clean deserialization
//! while keeping domain types focused on what the bot displays.

use serde::Deserialize;

use super::types::{CreatedIssue, Issue, Project, SearchResults, Status, User};

/// Fields requested for every issue the bot displays.
pub const ISSUE_FIELDS: &[&str] = &["summary", "status", "assignee", "reporter", "description"];

// ============================================================================
// Common nested field types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ApiStatusCategory {
  pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct ApiStatus {
  pub name: String,
  #[serde(rename = "statusCategory")]
  pub status_category: Option<ApiStatusCategory>,
}

#[derive(Debug, Deserialize)]
pub struct ApiUser {
  #[serde(default)]
  pub name: String,
  #[serde(rename = "displayName", default)]
  pub display_name: String,
  #[serde(rename = "emailAddress")]
  pub email_address: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ApiProject {
  pub key: String,
  #[serde(default)]
  pub name: String,
}

// ============================================================================
// Issue endpoints
// ============================================================================

#[derive(Debug, Deserialize, Default)]
pub struct ApiIssueFields {
  #[serde(default)]
  pub summary: String,
  pub status: Option<ApiStatus>,
  pub assignee: Option<ApiUser>,
  pub reporter: Option<ApiUser>,
  // Description is complex (can be string or ADF), handled separately
  pub description: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct ApiIssue {
  pub key: String,
  #[serde(default)]
  pub fields: ApiIssueFields,
}

#[derive(Debug, Deserialize)]
pub struct ApiCreatedIssue {
  #[serde(default)]
  pub id: String,
  pub key: String,
}

#[derive(Debug, Deserialize)]
pub struct ApiSearchResponse {
  #[serde(default)]
  pub total: u64,
  #[serde(default)]
  pub issues: Vec<ApiIssue>,
}

// ============================================================================
// Conversions to domain types
// ============================================================================

impl From<ApiProject> for Project {
  fn from(project: ApiProject) -> Self {
    Project {
      key: project.key,
      name: project.name,
    }
  }
}

impl From<ApiUser> for User {
  fn from(user: ApiUser) -> Self {
    User {
      name: user.name,
      display_name: user.display_name,
      email: user.email_address,
    }
  }
}

impl From<ApiStatus> for Status {
  fn from(status: ApiStatus) -> Self {
    Status {
      name: status.name,
      category: status.status_category.map(|c| c.name),
    }
  }
}

impl From<ApiCreatedIssue> for CreatedIssue {
  fn from(created: ApiCreatedIssue) -> Self {
    CreatedIssue {
      id: created.id,
      key: created.key,
    }
  }
}

impl From<ApiSearchResponse> for SearchResults {
  fn from(response: ApiSearchResponse) -> Self {
    SearchResults {
      total: response.total,
      issues: response.issues.into_iter().map(ApiIssue::into_issue).collect(),
    }
  }
}

impl ApiIssue {
  pub fn into_issue(self) -> Issue {
    let f = self.fields;
    Issue {
      key: self.key,
      summary: f.summary,
      description: f.description.as_ref().and_then(extract_description),
      status: f.status.map(Status::from).unwrap_or_default(),
      reporter: f.reporter.map(|u| u.display_name),
      assignee: f.assignee.map(|u| u.display_name),
    }
  }
}

// ============================================================================
// Helpers
// ============================================================================

/// Extract plain text description from Jira's ADF or plain text format
fn extract_description(value: &serde_json::Value) -> Option<String> {
  // If it's a string, return it directly (API v2)
  if let Some(s) = value.as_str() {
    return Some(s.to_string());
  }

  // If it's an ADF document (API v3), extract text content
  if let Some(content) = value.get("content").and_then(|v| v.as_array()) {
    let mut text = String::new();
    extract_adf_text(content, &mut text);
    let text = text.trim_end();
    if !text.is_empty() {
      return Some(text.to_string());
    }
  }

  None
}

/// Recursively extract text from ADF content
fn extract_adf_text(content: &[serde_json::Value], output: &mut String) {
  for node in content {
    let Some(node_type) = node.get("type").and_then(|v| v.as_str()) else {
      continue;
    };
    match node_type {
      "text" => {
        if let Some(text) = node.get("text").and_then(|v| v.as_str()) {
          output.push_str(text);
        }
      }
      "hardBreak" => output.push('\n'),
      _ => {
        if let Some(children) = node.get("content").and_then(|v| v.as_array()) {
          extract_adf_text(children, output);
        }
        if node_type == "paragraph" || node_type == "heading" {
          output.push('\n');
        }
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_issue_with_missing_people() {
    let issue: ApiIssue = serde_json::from_value(json!({
      "key": "ABC-1",
      "fields": {
        "summary": "Fix login",
        "status": { "name": "Code Review", "statusCategory": { "name": "In Progress" } },
        "assignee": null,
        "description": "Steps"
      }
    }))
    .unwrap();

    let issue = issue.into_issue();
    assert_eq!(issue.summary, "Fix login");
    assert_eq!(issue.status.name, "Code Review");
    assert_eq!(issue.status.category.as_deref(), Some("In Progress"));
    assert_eq!(issue.description.as_deref(), Some("Steps"));
    assert!(issue.assignee.is_none());
    assert!(issue.reporter.is_none());
  }

  #[test]
  fn test_adf_description_flattens_to_text() {
    let value = json!({
      "type": "doc",
      "content": [
        { "type": "paragraph", "content": [{ "type": "text", "text": "First" }] },
        { "type": "paragraph", "content": [
          { "type": "text", "text": "Second" },
          { "type": "hardBreak" },
          { "type": "text", "text": "line" }
        ] }
      ]
    });

    assert_eq!(
      extract_description(&value).as_deref(),
      Some("First\nSecond\nline")
    );
  }

  #[test]
  fn test_search_response_keeps_server_total() {
    let response: ApiSearchResponse = serde_json::from_value(json!({
      "total": 7,
      "issues": [{ "key": "ABC-1", "fields": { "summary": "One" } }]
    }))
    .unwrap();

    let results = SearchResults::from(response);
    assert_eq!(results.total, 7);
    assert_eq!(results.issues.len(), 1);
    assert_eq!(results.issues[0].status, Status::default());
  }

  #[test]
  fn test_user_search_result() {
    let users: Vec<ApiUser> = serde_json::from_value(json!([{
      "name": "jdoe",
      "displayName": "Jane Doe",
      "emailAddress": "jane@example.com"
    }]))
    .unwrap();

    let user = User::from(users.into_iter().next().unwrap());
    assert_eq!(user.name, "jdoe");
    assert_eq!(user.email.as_deref(), Some("jane@example.com"));
  }
}
