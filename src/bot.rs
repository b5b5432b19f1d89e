//! Routes chat messages to Jira lookups and shapes the replies.

use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, info, warn};

use crate::commands::{self, Command, CommandKind};
use crate::config::JiraConfig;
use crate::error::{BotError, BotResult};
use crate::format::{browse_link, search_attachment, search_link, ticket_attachment, Response};
use crate::jira::CachedJiraClient;
use crate::slack::{InboundMessage, Sender};

/// A ticket key standing on its own, e.g. `ABC-123`. Digits and word
/// boundaries are ASCII only.
static TICKET_KEY: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"(?-u:\b)([A-Z]+-[0-9]+)(?-u:\b)").expect("ticket key pattern compiles")
});

/// Most issues a `query` will render
const MAX_QUERY_RESULTS: u32 = 5;

/// Separates summary from description in `create`. Slack delivers `=>` escaped.
const DESCRIPTION_SEPARATORS: &[&str] = &["=&gt;", "=>"];

pub struct JiraBot {
  jira: CachedJiraClient,
  base_url: String,
  host: String,
  prefix: String,
}

impl JiraBot {
  pub fn new(jira: CachedJiraClient, config: &JiraConfig, prefix: &str) -> Self {
    Self {
      jira,
      base_url: config.base_url(),
      host: config.host.clone(),
      prefix: prefix.to_string(),
    }
  }

  /// Handle one inbound message.
  ///
  /// Returns `None` when the message is neither a command nor mentions a
  /// ticket, in which case nothing should be posted.
  pub async fn handle(&self, message: &InboundMessage) -> Option<BotResult<Response>> {
    if let Some((command, args)) = commands::parse(&message.text, &self.prefix) {
      debug!(command = command.name, args = args.len(), "dispatching command");
      return Some(self.dispatch(command, &args, &message.sender).await);
    }

    let key = self.mentioned_ticket(&message.text)?;
    debug!(key = %key, "ticket mentioned");
    Some(self.catch_all(&key).await)
  }

  pub async fn dispatch(
    &self,
    command: &Command,
    args: &[&str],
    sender: &Sender,
  ) -> BotResult<Response> {
    match command.kind {
      CommandKind::Projects => self.projects().await,
      CommandKind::Project => self.project(command, args).await,
      CommandKind::Create => self.create(command, args, sender).await,
      CommandKind::Query => self.query(command, args).await,
      CommandKind::Help => Ok(Response::Text(commands::help_text(&self.prefix))),
    }
  }

  /// First ticket key in `text`, unless the text already links to our Jira.
  pub fn mentioned_ticket(&self, text: &str) -> Option<String> {
    if text.contains(&self.host) {
      return None;
    }
    TICKET_KEY
      .captures(text)
      .map(|captures| captures[1].to_uppercase())
  }

  async fn projects(&self) -> BotResult<Response> {
    let projects = self.jira.list_projects().await?;
    let keys: Vec<&str> = projects.iter().map(|p| p.key.as_str()).collect();

    Ok(Response::Text(format!("JIRA Projects keys: {}", keys.join(", "))))
  }

  async fn project(&self, command: &Command, args: &[&str]) -> BotResult<Response> {
    let key = *args.first().ok_or(BotError::Usage(command.usage))?;
    let projects = self.jira.list_projects().await?;

    projects
      .iter()
      .find(|p| p.key == key)
      .map(|p| Response::Text(format!("{} is the key for {}", p.key, p.name)))
      .ok_or_else(|| BotError::NotFound("No such project key found.".to_string()))
  }

  async fn create(&self, command: &Command, args: &[&str], sender: &Sender) -> BotResult<Response> {
    let (key, params) = args.split_first().ok_or(BotError::Usage(command.usage))?;
    let (summary, description) = split_summary(params);
    if summary.is_empty() {
      return Err(BotError::Usage(command.usage));
    }

    let created = self.jira.create_issue(key, &summary, &description).await?;
    info!(issue = %created.key, id = %created.id, sender = %sender.real_name, "ticket created");

    self.spawn_follow_ups(&created.key, sender);

    Ok(Response::Text(format!(
      "Ticket created! Visit {} to view or edit the ticket.",
      browse_link(&self.base_url, &created.key)
    )))
  }

  /// Attribute a new ticket to its sender. Runs detached; failures are logged
  /// and never reach the channel.
  fn spawn_follow_ups(&self, issue_key: &str, sender: &Sender) {
    match sender.email.clone() {
      Some(email) => {
        let jira = self.jira.clone();
        let key = issue_key.to_string();
        tokio::spawn(async move {
          match jira.find_user(&email).await {
            Ok(Some(user)) => {
              if let Err(e) = jira.set_reporter(&key, &user.name).await {
                warn!(issue = %key, user = %user.name, error = %e, "failed to set reporter");
              }
            }
            Ok(None) => debug!(issue = %key, email = %email, "no Jira user for sender"),
            Err(e) => warn!(issue = %key, error = %e, "failed to look up sender in Jira"),
          }
        });
      }
      // Slack only shares emails with the users:read.email scope
      None => debug!(
        issue = %issue_key,
        sender = %sender.real_name,
        "sender has no email in their Slack profile, leaving reporter unchanged"
      ),
    }

    let jira = self.jira.clone();
    let key = issue_key.to_string();
    let comment = format!("Issue created via Slack JiraBot by {}.", sender.real_name);
    tokio::spawn(async move {
      if let Err(e) = jira.add_comment(&key, &comment).await {
        warn!(issue = %key, error = %e, "failed to add attribution comment");
      }
    });
  }

  async fn query(&self, command: &Command, args: &[&str]) -> BotResult<Response> {
    if args.is_empty() {
      return Err(BotError::Usage(command.usage));
    }
    let jql = unescape_slack(&args.join(" "));

    let results = self.jira.search(&jql, MAX_QUERY_RESULTS).await?;
    if results.total == 0 || results.issues.is_empty() {
      return Ok(Response::Text("No records found.".to_string()));
    }

    let mut text = format!(
      "Found {} {} matching <{}|your query>.",
      results.total,
      if results.total == 1 { "issue" } else { "issues" },
      search_link(&self.base_url, &jql)
    );
    if results.total > u64::from(MAX_QUERY_RESULTS) {
      text.push_str(&format!(" I'll only display the first {}.", MAX_QUERY_RESULTS));
    }

    let attachments = results
      .issues
      .iter()
      .take(MAX_QUERY_RESULTS as usize)
      .map(|issue| search_attachment(issue, &self.base_url))
      .collect();

    Ok(Response::Attachments { text, attachments })
  }

  async fn catch_all(&self, key: &str) -> BotResult<Response> {
    let issue = self.jira.find_issue(key).await?;

    Ok(Response::Attachments {
      text: String::new(),
      attachments: vec![ticket_attachment(&issue, &self.base_url)],
    })
  }
}

/// Split `create` arguments into summary and description on the first
/// separator token. Without a separator everything is summary.
pub fn split_summary(params: &[&str]) -> (String, String) {
  let (summary, description) = match params
    .iter()
    .position(|token| DESCRIPTION_SEPARATORS.contains(token))
  {
    Some(index) => (&params[..index], &params[index + 1..]),
    None => (params, &[][..]),
  };

  (
    unescape_slack(&summary.join(" ")),
    unescape_slack(&description.join(" ")),
  )
}

/// Undo the HTML escaping Slack applies to `&`, `<` and `>` in message text.
fn unescape_slack(text: &str) -> String {
  text
    .replace("&lt;", "<")
    .replace("&gt;", ">")
    .replace("&amp;", "&")
}
