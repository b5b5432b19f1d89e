//! Slack payloads the bot reads and writes.

use serde::{Deserialize, Serialize};

use crate::format::{Attachment, Response};

/// Who sent a message, as shown in their Slack profile
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sender {
  pub real_name: String,
  pub email: Option<String>,
}

/// A plain user message as it comes off the socket, before the sender's
/// profile is looked up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelMessage {
  pub channel: String,
  pub user: String,
  pub text: String,
}

impl ChannelMessage {
  pub fn with_sender(self, sender: Sender) -> InboundMessage {
    InboundMessage {
      channel: self.channel,
      user: self.user,
      text: self.text,
      sender,
    }
  }
}

/// A channel message addressed to the bot or mentioning a ticket
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
  pub channel: String,
  pub user: String,
  pub text: String,
  pub sender: Sender,
}

// ============================================================================
// Socket Mode
// ============================================================================

/// Socket Mode envelope received over the WebSocket connection.
#[derive(Debug, Deserialize)]
pub struct SocketModeEnvelope {
  pub envelope_id: String,
  #[serde(rename = "type")]
  pub envelope_type: String,
  #[serde(default)]
  pub payload: serde_json::Value,
}

// ============================================================================
// Web API responses
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ApiAuthTestResponse {
  pub ok: bool,
  pub user_id: Option<String>,
  pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ApiOpenSocketResponse {
  pub ok: bool,
  pub url: Option<String>,
  pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ApiPostMessageResponse {
  pub ok: bool,
  pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ApiProfile {
  #[serde(default)]
  pub real_name: String,
  pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ApiUser {
  #[serde(default)]
  pub name: String,
  pub profile: ApiProfile,
}

#[derive(Debug, Deserialize)]
pub struct ApiUsersInfoResponse {
  pub ok: bool,
  pub user: Option<ApiUser>,
  pub error: Option<String>,
}

impl From<ApiUser> for Sender {
  fn from(user: ApiUser) -> Self {
    let real_name = if user.profile.real_name.is_empty() {
      user.name
    } else {
      user.profile.real_name
    };
    Sender {
      real_name,
      email: user.profile.email.filter(|e| !e.is_empty()),
    }
  }
}

// ============================================================================
// Web API requests
// ============================================================================

/// Body of `chat.postMessage`
#[derive(Debug, Serialize)]
pub struct PostMessage<'a> {
  pub channel: &'a str,
  pub text: &'a str,
  #[serde(skip_serializing_if = "no_attachments")]
  pub attachments: &'a [Attachment],
}

fn no_attachments(attachments: &&[Attachment]) -> bool {
  attachments.is_empty()
}

impl<'a> PostMessage<'a> {
  pub fn new(channel: &'a str, response: &'a Response) -> Self {
    Self {
      channel,
      text: response.text(),
      attachments: response.attachments(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_sender_prefers_real_name() {
    let user: ApiUser = serde_json::from_value(json!({
      "name": "jdoe",
      "profile": { "real_name": "Jane Doe", "email": "jane@example.com" }
    }))
    .unwrap();

    let sender = Sender::from(user);
    assert_eq!(sender.real_name, "Jane Doe");
    assert_eq!(sender.email.as_deref(), Some("jane@example.com"));
  }

  #[test]
  fn test_sender_without_profile_name_or_email() {
    let user: ApiUser = serde_json::from_value(json!({
      "name": "jdoe",
      "profile": { "real_name": "", "email": "" }
    }))
    .unwrap();

    let sender = Sender::from(user);
    assert_eq!(sender.real_name, "jdoe");
    assert_eq!(sender.email, None);
  }

  #[test]
  fn test_plain_text_message_omits_attachments() {
    let response = Response::Text("hello".to_string());
    let body = serde_json::to_value(PostMessage::new("C1", &response)).unwrap();

    assert_eq!(body, json!({ "channel": "C1", "text": "hello" }));
  }
}
