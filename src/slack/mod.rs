//! Slack transport: Socket Mode for inbound events, Web API for replies.

mod api;
mod socket;
mod types;

pub use api::SlackClient;
pub use socket::SocketModeListener;
pub use types::{ChannelMessage, InboundMessage, Sender};

use async_trait::async_trait;
use color_eyre::Result;
use tracing::warn;

use crate::format::Response;

/// Outbound half of the chat connection.
#[async_trait]
pub trait ChatTransport: Send + Sync {
  /// Post `response` to `channel`.
  async fn send(&self, channel: &str, response: &Response) -> Result<()>;
}

/// Web API lookups the listener and the message handlers depend on.
#[async_trait]
pub trait SlackApi: Send + Sync {
  /// Fresh Socket Mode WebSocket URL.
  async fn open_socket_url(&self) -> Result<String>;

  /// Display name and email for a Slack user id.
  async fn sender(&self, user_id: &str) -> Result<Sender>;
}

/// Look up who sent a message. Falls back to the raw user id with no email.
pub async fn resolve_sender(api: &dyn SlackApi, user_id: &str) -> Sender {
  match api.sender(user_id).await {
    Ok(sender) => sender,
    Err(e) => {
      warn!(user = user_id, error = %e, "could not resolve sender profile");
      Sender {
        real_name: user_id.to_string(),
        email: None,
      }
    }
  }
}
