//! Slack Web API client used for identity lookups and replies.

use async_trait::async_trait;
use color_eyre::{eyre::eyre, Result};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

use crate::cache::CacheLayer;
use crate::format::Response;

use super::types::{
  ApiAuthTestResponse, ApiOpenSocketResponse, ApiPostMessageResponse, ApiUsersInfoResponse,
  PostMessage, Sender,
};
use super::{ChatTransport, SlackApi};

const API_BASE: &str = "https://slack.com/api";

/// Profiles change rarely; look each sender up at most once a day.
const PROFILE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Clone)]
pub struct SlackClient {
  http: reqwest::Client,
  bot_token: String,
  app_token: String,
  profiles: CacheLayer,
}

impl SlackClient {
  pub fn new(bot_token: String, app_token: String, profiles: CacheLayer) -> Result<Self> {
    let http = reqwest::Client::builder()
      .user_agent(concat!("jirabot/", env!("CARGO_PKG_VERSION")))
      .timeout(Duration::from_secs(30))
      .build()
      .map_err(|e| eyre!("Failed to create Slack HTTP client: {}", e))?;

    Ok(Self {
      http,
      bot_token: bot_token.trim().to_string(),
      app_token: app_token.trim().to_string(),
      profiles,
    })
  }

  /// User id of the bot itself, so its own messages can be ignored.
  pub async fn bot_user_id(&self) -> Result<String> {
    let response: ApiAuthTestResponse = self
      .call(self.http.post(format!("{}/auth.test", API_BASE)).bearer_auth(&self.bot_token))
      .await?;

    if !response.ok {
      return Err(eyre!("Slack auth.test failed: {}", api_error(response.error)));
    }

    response
      .user_id
      .filter(|id| !id.is_empty())
      .ok_or_else(|| eyre!("Slack auth.test did not return a user id"))
  }

  async fn fetch_sender(&self, user_id: &str) -> Result<Sender> {
    let response: ApiUsersInfoResponse = self
      .call(
        self
          .http
          .get(format!("{}/users.info", API_BASE))
          .bearer_auth(&self.bot_token)
          .query(&[("user", user_id)]),
      )
      .await?;

    if !response.ok {
      return Err(eyre!(
        "Slack users.info failed for {}: {}",
        user_id,
        api_error(response.error)
      ));
    }

    response
      .user
      .map(Sender::from)
      .ok_or_else(|| eyre!("Slack users.info returned no user for {}", user_id))
  }

  async fn call<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> Result<T> {
    let response = request
      .send()
      .await
      .map_err(|e| eyre!("Slack request failed: {}", e))?;

    let status = response.status();
    if !status.is_success() {
      return Err(eyre!("Slack responded with HTTP {}", status));
    }

    response
      .json()
      .await
      .map_err(|e| eyre!("Failed to parse Slack response: {}", e))
  }
}

fn api_error(error: Option<String>) -> String {
  error.unwrap_or_else(|| "unknown error".to_string())
}

#[async_trait]
impl ChatTransport for SlackClient {
  async fn send(&self, channel: &str, response: &Response) -> Result<()> {
    let body = PostMessage::new(channel, response);

    let response: ApiPostMessageResponse = self
      .call(
        self
          .http
          .post(format!("{}/chat.postMessage", API_BASE))
          .bearer_auth(&self.bot_token)
          .json(&body),
      )
      .await?;

    if !response.ok {
      return Err(eyre!(
        "Slack chat.postMessage failed: {}",
        api_error(response.error)
      ));
    }

    Ok(())
  }
}

#[async_trait]
impl SlackApi for SlackClient {
  async fn open_socket_url(&self) -> Result<String> {
    let response: ApiOpenSocketResponse = self
      .call(
        self
          .http
          .post(format!("{}/apps.connections.open", API_BASE))
          .bearer_auth(&self.app_token),
      )
      .await?;

    if !response.ok {
      return Err(eyre!(
        "Slack apps.connections.open failed: {}",
        api_error(response.error)
      ));
    }

    response
      .url
      .ok_or_else(|| eyre!("Slack apps.connections.open returned no URL"))
  }

  /// Profiles are cached for a day.
  async fn sender(&self, user_id: &str) -> Result<Sender> {
    let result = self
      .profiles
      .fetch(&format!("slack_user|{}", user_id), PROFILE_TTL, move || {
        self.fetch_sender(user_id)
      })
      .await?;

    debug!(user = user_id, source = ?result.source, "resolved sender");
    Ok(result.data)
  }
}
