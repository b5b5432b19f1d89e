use tokio::sync::mpsc;

use crate::slack::ChannelMessage;

/// Application events
#[derive(Debug)]
pub enum Event {
  /// A channel message the bot can see
  Message(ChannelMessage),
  /// The listener stopped and will not produce more messages
  Error(String),
}

/// Event queue fed by the Slack listener
pub struct EventHandler {
  tx: mpsc::UnboundedSender<Event>,
  rx: mpsc::UnboundedReceiver<Event>,
}

impl EventHandler {
  pub fn new() -> Self {
    let (tx, rx) = mpsc::unbounded_channel();
    Self { tx, rx }
  }

  /// Handle for producers to push events
  pub fn sender(&self) -> mpsc::UnboundedSender<Event> {
    self.tx.clone()
  }

  /// Receive the next event
  pub async fn next(&mut self) -> Option<Event> {
    self.rx.recv().await
  }
}

impl Default for EventHandler {
  fn default() -> Self {
    Self::new()
  }
}
