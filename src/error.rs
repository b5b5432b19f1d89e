use thiserror::Error;

/// Failures that end a single bot command. The `Display` text is what the
/// channel sees.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BotError {
  /// Transport or authentication failure against Jira
  #[error("Jira request failed: {0}")]
  Remote(String),
  /// A key or lookup that should have resolved to something didn't
  #[error("{0}")]
  NotFound(String),
  /// Jira rejected the new ticket
  #[error("Unable to create ticket - did you specify a valid project key?")]
  Creation,
  /// Malformed JQL, or the search request itself failed
  #[error("Invalid query: {0}")]
  Query(String),
  /// The command was called with missing arguments
  #[error("Usage: `{0}`")]
  Usage(&'static str),
}

pub type BotResult<T> = std::result::Result<T, BotError>;
