//! Socket Mode listener: keeps a WebSocket open to Slack and forwards channel
//! messages to the event loop.

use color_eyre::{eyre::eyre, Result};
use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message as WsMsg;
use tracing::{debug, info, warn};

use crate::event::Event;

use super::types::{ChannelMessage, SocketModeEnvelope};
use super::SlackApi;

/// Consecutive failed connection attempts before the listener gives up
const MAX_CONSECUTIVE_FAILURES: u32 = 5;

/// Why a single connection ended
enum Disconnect {
  /// Slack closed or asked us to reconnect
  Reconnect,
  /// Nobody is reading events any more
  Shutdown,
}

pub struct SocketModeListener {
  api: Arc<dyn SlackApi>,
  bot_user_id: String,
  reconnect_delay: Duration,
}

impl SocketModeListener {
  pub fn new(api: Arc<dyn SlackApi>, bot_user_id: String) -> Self {
    Self {
      api,
      bot_user_id,
      reconnect_delay: Duration::from_secs(2),
    }
  }

  /// Run until the event receiver is dropped or Slack keeps refusing us.
  pub async fn run(self, tx: mpsc::UnboundedSender<Event>) {
    let mut failures = 0;

    loop {
      match self.listen(&tx).await {
        Ok(Disconnect::Shutdown) => return,
        Ok(Disconnect::Reconnect) => {
          failures = 0;
          info!("Socket Mode connection closed, reconnecting");
        }
        Err(e) => {
          failures += 1;
          warn!(attempt = failures, error = %e, "Socket Mode connection failed");
          if failures >= MAX_CONSECUTIVE_FAILURES {
            let _ = tx.send(Event::Error(format!(
              "giving up after {} failed connection attempts: {}",
              failures, e
            )));
            return;
          }
        }
      }

      if tx.is_closed() {
        return;
      }
      tokio::time::sleep(self.reconnect_delay).await;
    }
  }

  /// Read one connection until it closes.
  ///
  /// Nothing in here waits on anything but the socket itself, so every
  /// envelope is acknowledged as soon as it is read. Sender lookups happen
  /// later, on the task that handles the message.
  async fn listen(&self, tx: &mpsc::UnboundedSender<Event>) -> Result<Disconnect> {
    let url = self.api.open_socket_url().await?;
    let (ws_stream, _) = tokio_tungstenite::connect_async(url.as_str())
      .await
      .map_err(|e| eyre!("Failed to open Socket Mode connection: {}", e))?;
    let (mut write, mut read) = ws_stream.split();
    info!("Socket Mode connected");

    while let Some(frame) = read.next().await {
      let frame = frame.map_err(|e| eyre!("Socket Mode read failed: {}", e))?;

      match frame {
        WsMsg::Text(text) => {
          let raw: Value = match serde_json::from_str(text.as_str()) {
            Ok(v) => v,
            Err(e) => {
              warn!(error = %e, "unparseable Socket Mode frame");
              continue;
            }
          };

          match raw.get("type").and_then(Value::as_str) {
            Some("hello") => {
              debug!("Socket Mode hello received");
              continue;
            }
            Some("disconnect") => {
              let reason = raw.get("reason").and_then(Value::as_str).unwrap_or("unknown");
              info!(reason, "Slack requested disconnect");
              return Ok(Disconnect::Reconnect);
            }
            _ => {}
          }

          let envelope: SocketModeEnvelope = match serde_json::from_value(raw) {
            Ok(e) => e,
            Err(e) => {
              warn!(error = %e, "Socket Mode envelope parse error");
              continue;
            }
          };

          // Slack redelivers anything not acknowledged within 3 seconds
          let ack = json!({ "envelope_id": envelope.envelope_id });
          write
            .send(WsMsg::Text(ack.to_string().into()))
            .await
            .map_err(|e| eyre!("Failed to acknowledge envelope: {}", e))?;

          if envelope.envelope_type != "events_api" {
            continue;
          }
          let Some(message) = extract_message(&envelope.payload, &self.bot_user_id) else {
            continue;
          };

          if tx.send(Event::Message(message)).is_err() {
            return Ok(Disconnect::Shutdown);
          }
        }
        WsMsg::Ping(data) => {
          let _ = write.send(WsMsg::Pong(data)).await;
        }
        WsMsg::Close(_) => return Ok(Disconnect::Reconnect),
        _ => {}
      }
    }

    Ok(Disconnect::Reconnect)
  }
}

/// Pull a plain user message out of an `events_api` payload.
///
/// Edits, joins, bot posts and the bot's own messages are skipped.
fn extract_message(payload: &Value, bot_user_id: &str) -> Option<ChannelMessage> {
  let event = payload.get("event")?;
  if event.get("type").and_then(Value::as_str) != Some("message") {
    return None;
  }
  if event.get("subtype").is_some() || event.get("bot_id").is_some() {
    return None;
  }

  let field = |name: &str| {
    event
      .get(name)
      .and_then(Value::as_str)
      .filter(|v| !v.is_empty())
      .map(String::from)
  };
  let user = field("user")?;
  if user == bot_user_id {
    return None;
  }

  Some(ChannelMessage {
    user,
    channel: field("channel")?,
    text: field("text")?,
  })
}
