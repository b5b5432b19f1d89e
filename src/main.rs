mod app;
mod bot;
mod cache;
mod commands;
mod config;
mod error;
mod event;
mod format;
mod jira;
mod slack;

use clap::Parser;
use color_eyre::{eyre::eyre, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::cache::{CacheLayer, MemoryStorage, NoopStorage};
use crate::jira::{CachedJiraClient, JiraClient};
use crate::slack::{SlackClient, SocketModeListener};

#[derive(Parser, Debug)]
#[command(name = "jirabot")]
#[command(about = "A Slack bot that looks up and creates Jira tickets")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/jirabot/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Write logs to this file instead of stderr
  #[arg(long)]
  log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  // Keep the guard alive so buffered log lines are flushed on exit
  let _log_guard = init_tracing(args.log_file.as_deref())?;

  // Load configuration
  let config = config::Config::load(args.config.as_deref())?;
  info!(host = %config.jira.host, port = config.jira.port, "starting jirabot");

  let cache = if config.cache.enabled {
    CacheLayer::new(MemoryStorage::new())
  } else {
    CacheLayer::new(NoopStorage)
  };

  let jira = CachedJiraClient::new(Arc::new(JiraClient::new(&config)?), cache.clone());
  let bot = bot::JiraBot::new(jira, &config.jira, &config.slack.command_prefix);

  let slack = Arc::new(SlackClient::new(
    config::Config::get_bot_token()?,
    config::Config::get_app_token()?,
    cache,
  )?);
  let bot_user_id = slack.bot_user_id().await?;
  info!(bot_user_id = %bot_user_id, "authenticated with Slack");

  let events = event::EventHandler::new();
  let listener = SocketModeListener::new(slack.clone(), bot_user_id);
  tokio::spawn(listener.run(events.sender()));

  let app = app::App::new(bot, slack.clone(), slack);
  app.run(events).await
}

fn init_tracing(log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("jirabot=info"));

  let Some(path) = log_file else {
    tracing_subscriber::fmt().with_env_filter(filter).init();
    return Ok(None);
  };

  let file_name = path
    .file_name()
    .ok_or_else(|| eyre!("Invalid log file path: {}", path.display()))?;
  let dir = path
    .parent()
    .filter(|p| !p.as_os_str().is_empty())
    .unwrap_or_else(|| Path::new("."));

  let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(writer)
    .with_ansi(false)
    .init();

  Ok(Some(guard))
}
