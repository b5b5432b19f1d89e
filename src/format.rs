//! Shapes Jira data into Slack messages and legacy attachments.

use serde::Serialize;
use url::form_urlencoded;

use crate::error::BotError;
use crate::jira::types::{Issue, Status};

/// Color of the card shown for a mentioned ticket
pub const TICKET_COLOR: &str = "#37465D";

pub const GREEN: &str = "#14892c";
pub const BLUE: &str = "#4a6785";
pub const YELLOW: &str = "#ffd351";
pub const GRAY: &str = "#cccccc";

const DONE: &[&str] = &["Done", "Resolved", "Reopened"];
const TODO: &[&str] = &["To Do", "Ready for Dev", "To Discuss", "Backlog"];
const ACTIVE: &[&str] = &[
  "In Progress",
  "In Review",
  "Code Review",
  "Testing",
  "Ready for Review",
];

/// One label/value pair inside an attachment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Field {
  pub title: String,
  pub value: String,
  pub short: bool,
}

/// Slack legacy attachment
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Attachment {
  pub fallback: String,
  pub color: String,
  pub title: String,
  pub title_link: String,
  #[serde(skip_serializing_if = "String::is_empty")]
  pub text: String,
  pub fields: Vec<Field>,
  pub mrkdwn_in: Vec<&'static str>,
}

impl Attachment {
  pub fn add_field(&mut self, title: &str, value: impl Into<String>, short: bool) {
    self.fields.push(Field {
      title: title.to_string(),
      value: value.into(),
      short,
    });
  }
}

/// What a handler hands back for delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
  Text(String),
  Attachments {
    text: String,
    attachments: Vec<Attachment>,
  },
}

impl Response {
  /// Visible message for a failed command.
  pub fn error(err: &BotError) -> Self {
    Response::Text(format!("Err: {}", err))
  }

  /// Top-level message text (also used as the notification fallback).
  pub fn text(&self) -> &str {
    match self {
      Response::Text(text) => text,
      Response::Attachments { text, .. } => text,
    }
  }

  pub fn attachments(&self) -> &[Attachment] {
    match self {
      Response::Text(_) => &[],
      Response::Attachments { attachments, .. } => attachments,
    }
  }
}

/// Color for a status: its category decides. The status name is only
/// consulted when the category is missing or one we don't know.
pub fn status_color(status: &Status) -> &'static str {
  status
    .category
    .as_deref()
    .and_then(color_for)
    .or_else(|| color_for(&status.name))
    .unwrap_or(GRAY)
}

/// Color for a single status or category name, if it is one we know.
pub fn color_for(name: &str) -> Option<&'static str> {
  if DONE.contains(&name) {
    Some(GREEN)
  } else if TODO.contains(&name) {
    Some(BLUE)
  } else if ACTIVE.contains(&name) {
    Some(YELLOW)
  } else {
    None
  }
}

/// `https://host[:port]/browse/KEY`
pub fn browse_link(base_url: &str, key: &str) -> String {
  format!("{}/browse/{}", base_url, key)
}

/// `https://host[:port]/issues/?jql=...`
pub fn search_link(base_url: &str, jql: &str) -> String {
  let encoded: String = form_urlencoded::byte_serialize(jql.as_bytes()).collect();
  format!("{}/issues/?jql={}", base_url, encoded)
}

fn add_people_and_status(attachment: &mut Attachment, issue: &Issue) {
  attachment.add_field(
    "Reporter",
    issue.reporter.as_deref().unwrap_or("_Unknown_"),
    true,
  );
  attachment.add_field(
    "Assignee",
    issue.assignee.as_deref().unwrap_or("_Unassigned_"),
    true,
  );
  attachment.add_field("Status", issue.status.name.as_str(), true);
}

/// Card for a ticket key mentioned in conversation.
pub fn ticket_attachment(issue: &Issue, base_url: &str) -> Attachment {
  let mut attachment = Attachment {
    fallback: format!(
      "{}: \"{}\" ({}).",
      issue.key, issue.summary, issue.status.name
    ),
    color: TICKET_COLOR.to_string(),
    title: format!("{}: {}", issue.key, issue.summary),
    title_link: browse_link(base_url, &issue.key),
    mrkdwn_in: vec!["fields"],
    ..Default::default()
  };
  add_people_and_status(&mut attachment, issue);
  attachment
}

/// Card for one row of a query result.
pub fn search_attachment(issue: &Issue, base_url: &str) -> Attachment {
  let mut attachment = Attachment {
    fallback: format!("{}: {}", issue.key, issue.summary),
    color: status_color(&issue.status).to_string(),
    title: issue.summary.clone(),
    title_link: browse_link(base_url, &issue.key),
    text: issue.description.clone().unwrap_or_default(),
    mrkdwn_in: vec!["fields", "text"],
    ..Default::default()
  };
  add_people_and_status(&mut attachment, issue);
  attachment
}
