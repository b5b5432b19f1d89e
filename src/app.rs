use crate::bot::JiraBot;
use crate::event::{Event, EventHandler};
use crate::format::Response;
use crate::slack::{resolve_sender, ChannelMessage, ChatTransport, InboundMessage, SlackApi};
use color_eyre::{eyre::eyre, Result};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Main application state
pub struct App {
  bot: Arc<JiraBot>,
  transport: Arc<dyn ChatTransport>,
  directory: Arc<dyn SlackApi>,
}

impl App {
  pub fn new(bot: JiraBot, transport: Arc<dyn ChatTransport>, directory: Arc<dyn SlackApi>) -> Self {
    Self {
      bot: Arc::new(bot),
      transport,
      directory,
    }
  }

  /// Handle events until ctrl-c or the listener gives up.
  pub async fn run(&self, mut events: EventHandler) -> Result<()> {
    loop {
      tokio::select! {
        event = events.next() => match event {
          Some(Event::Message(message)) => self.spawn_handler(message),
          Some(Event::Error(msg)) => return Err(eyre!("Slack listener stopped: {}", msg)),
          None => return Ok(()),
        },
        _ = tokio::signal::ctrl_c() => {
          info!("shutting down");
          return Ok(());
        }
      }
    }
  }

  /// Each message is handled on its own task so a slow profile lookup or
  /// Jira call never holds up the next message.
  fn spawn_handler(&self, message: ChannelMessage) {
    let bot = Arc::clone(&self.bot);
    let transport = Arc::clone(&self.transport);
    let directory = Arc::clone(&self.directory);

    tokio::spawn(async move {
      let sender = resolve_sender(directory.as_ref(), &message.user).await;
      let message = message.with_sender(sender);
      handle_message(&bot, transport.as_ref(), &message).await;
    });
  }
}

/// Run one message through the bot and post whatever it produces.
pub async fn handle_message(bot: &JiraBot, transport: &dyn ChatTransport, message: &InboundMessage) {
  let Some(outcome) = bot.handle(message).await else {
    return;
  };

  let response = match outcome {
    Ok(response) => response,
    Err(e) => {
      warn!(channel = %message.channel, user = %message.user, error = %e, "command failed");
      Response::error(&e)
    }
  };

  if let Err(e) = transport.send(&message.channel, &response).await {
    error!(channel = %message.channel, error = %e, "failed to deliver response");
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::{CacheLayer, MemoryStorage};
  use crate::config::JiraConfig;
  use crate::jira::fake::FakeJira;
  use crate::jira::CachedJiraClient;
  use crate::slack::fake::FakeSlack;
  use crate::slack::Sender;
  use async_trait::async_trait;
  use std::sync::Mutex;

  #[derive(Default)]
  struct RecordingTransport {
    sent: Mutex<Vec<(String, Response)>>,
  }

  #[async_trait]
  impl ChatTransport for RecordingTransport {
    async fn send(&self, channel: &str, response: &Response) -> Result<()> {
      self
        .sent
        .lock()
        .unwrap()
        .push((channel.to_string(), response.clone()));
      Ok(())
    }
  }

  fn bot(fake: FakeJira) -> JiraBot {
    shared_bot(Arc::new(fake))
  }

  fn shared_bot(fake: Arc<FakeJira>) -> JiraBot {
    let jira = CachedJiraClient::new(fake, CacheLayer::new(MemoryStorage::new()));
    let config = JiraConfig {
      host: "jira.example.com".to_string(),
      port: 443,
      username: "bot".to_string(),
    };
    JiraBot::new(jira, &config, ".")
  }

  fn message(text: &str) -> InboundMessage {
    InboundMessage {
      channel: "C42".to_string(),
      user: "U1".to_string(),
      text: text.to_string(),
      sender: Sender::default(),
    }
  }

  #[tokio::test]
  async fn test_success_is_posted_to_origin_channel() {
    let bot = bot(FakeJira::new().with_project("ABC", "Alphabet"));
    let transport = RecordingTransport::default();

    handle_message(&bot, &transport, &message(".projects")).await;

    let sent = transport.sent.lock().unwrap();
    assert_eq!(
      *sent,
      vec![(
        "C42".to_string(),
        Response::Text("JIRA Projects keys: ABC".to_string())
      )]
    );
  }

  #[tokio::test]
  async fn test_failure_is_posted_as_error_message() {
    let bot = bot(FakeJira::new());
    let transport = RecordingTransport::default();

    handle_message(&bot, &transport, &message(".project NOPE")).await;

    let sent = transport.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].1.text(), "Err: No such project key found.");
  }

  #[tokio::test]
  async fn test_chatter_posts_nothing() {
    let bot = bot(FakeJira::new());
    let transport = RecordingTransport::default();

    handle_message(&bot, &transport, &message("lunch?")).await;

    assert!(transport.sent.lock().unwrap().is_empty());
  }

  #[tokio::test]
  async fn test_listener_error_stops_run() {
    let app = App::new(
      bot(FakeJira::new()),
      Arc::new(RecordingTransport::default()),
      Arc::new(FakeSlack::new()),
    );
    let events = EventHandler::new();
    events
      .sender()
      .send(Event::Error("invalid_auth".to_string()))
      .unwrap();

    let err = app.run(events).await.unwrap_err();
    assert!(err.to_string().contains("invalid_auth"));
  }

  #[tokio::test]
  async fn test_sender_is_resolved_on_the_handler_task() {
    let fake = Arc::new(
      FakeJira::new()
        .with_project("ABC", "Alphabet")
        .with_user("jdoe", "Jane Doe", "jane@example.com"),
    );
    let transport = Arc::new(RecordingTransport::default());
    let slack = FakeSlack::new().with_sender("U1", "Jane Doe", "jane@example.com");
    let app = App::new(shared_bot(fake.clone()), transport.clone(), Arc::new(slack));

    let events = EventHandler::new();
    let tx = events.sender();
    tx.send(Event::Message(ChannelMessage {
      channel: "C42".to_string(),
      user: "U1".to_string(),
      text: ".create ABC Fix login".to_string(),
    }))
    .unwrap();
    tx.send(Event::Error("stop".to_string())).unwrap();
    assert!(app.run(events).await.is_err());

    for _ in 0..200 {
      if !transport.sent.lock().unwrap().is_empty()
        && fake.reporters().len() == 1
        && fake.comments().len() == 1
      {
        break;
      }
      tokio::task::yield_now().await;
    }

    assert_eq!(transport.sent.lock().unwrap()[0].0, "C42");
    assert_eq!(fake.reporters(), vec![("ABC-1".to_string(), "jdoe".to_string())]);
    assert_eq!(
      fake.comments(),
      vec![(
        "ABC-1".to_string(),
        "Issue created via Slack JiraBot by Jane Doe.".to_string()
      )]
    );
  }
}
