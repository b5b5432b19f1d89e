use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  pub jira: JiraConfig,
  #[serde(default)]
  pub slack: SlackConfig,
  #[serde(default)]
  pub cache: CacheConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JiraConfig {
  /// Bare host name, e.g. `jira.example.com`
  #[serde(deserialize_with = "deserialize_host")]
  pub host: String,
  #[serde(default = "default_port")]
  pub port: u16,
  pub username: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SlackConfig {
  /// Text that marks a message as a bot command (".projects")
  #[serde(default = "default_prefix")]
  pub command_prefix: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
  /// Set to false to hit Jira for every project and user lookup
  #[serde(default = "default_true")]
  pub enabled: bool,
}

fn default_port() -> u16 {
  443
}

fn default_prefix() -> String {
  ".".to_string()
}

fn default_true() -> bool {
  true
}

impl Default for SlackConfig {
  fn default() -> Self {
    Self {
      command_prefix: default_prefix(),
    }
  }
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self { enabled: true }
  }
}

/// Accept `https://jira.example.com/` as well as `jira.example.com`.
fn normalize_host(raw: &str) -> String {
  let host = raw.trim();
  let host = host
    .strip_prefix("https://")
    .or_else(|| host.strip_prefix("http://"))
    .unwrap_or(host);
  host.trim_end_matches('/').to_string()
}

fn deserialize_host<'de, D>(deserializer: D) -> Result<String, D::Error>
where
  D: serde::Deserializer<'de>,
{
  let raw = String::deserialize(deserializer)?;
  Ok(normalize_host(&raw))
}

impl JiraConfig {
  /// `https://host`, with `:port` only when it isn't 443
  pub fn base_url(&self) -> String {
    if self.port == 443 {
      format!("https://{}", self.host)
    } else {
      format!("https://{}:{}", self.host, self.port)
    }
  }
}

impl Config {
  /// Load configuration.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./jirabot.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/jirabot/config.yaml
  /// 4. JIRA_HOST / JIRA_PORT / JIRA_USER environment variables
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    let config = match path {
      Some(p) => Self::load_from_path(&p)?,
      None => Self::from_env(|name| std::env::var(name).ok())?,
    };
    config.validate()?;

    Ok(config)
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("jirabot.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("jirabot").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn parse(contents: &str) -> Result<Self, serde_yaml::Error> {
    serde_yaml::from_str(contents)
  }

  /// Build a config from environment variables, for deployments without a file.
  fn from_env(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
    let host = var("JIRA_HOST").ok_or_else(|| {
      eyre!(
        "No configuration file found and JIRA_HOST is not set. Create ~/.config/jirabot/config.yaml\n\
                 or set JIRA_HOST, JIRA_PORT and JIRA_USER."
      )
    })?;

    let port = match var("JIRA_PORT").filter(|p| !p.trim().is_empty()) {
      Some(p) => p
        .trim()
        .parse()
        .map_err(|e| eyre!("Invalid JIRA_PORT {:?}: {}", p, e))?,
      None => default_port(),
    };

    Ok(Config {
      jira: JiraConfig {
        host: normalize_host(&host),
        port,
        username: var("JIRA_USER").unwrap_or_default(),
      },
      slack: SlackConfig::default(),
      cache: CacheConfig::default(),
    })
  }

  fn validate(&self) -> Result<()> {
    if self.jira.host.is_empty() {
      return Err(eyre!("jira.host must not be empty"));
    }
    if self.jira.username.is_empty() {
      return Err(eyre!("jira.username must not be empty"));
    }
    if self.slack.command_prefix.trim().is_empty() {
      return Err(eyre!("slack.command_prefix must not be empty"));
    }
    Ok(())
  }

  /// Get the Jira password from environment variables.
  ///
  /// Checks JIRABOT_JIRA_PASSWORD first, then JIRA_PASS as fallback.
  pub fn get_password() -> Result<String> {
    std::env::var("JIRABOT_JIRA_PASSWORD")
      .or_else(|_| std::env::var("JIRA_PASS"))
      .map_err(|_| {
        eyre!("Jira password not found. Set JIRABOT_JIRA_PASSWORD or JIRA_PASS environment variable.")
      })
  }

  /// Get the Slack bot token (xoxb-...) from SLACK_API_TOKEN.
  pub fn get_bot_token() -> Result<String> {
    std::env::var("SLACK_API_TOKEN")
      .map_err(|_| eyre!("Slack bot token not found. Set SLACK_API_TOKEN environment variable."))
  }

  /// Get the Slack app-level token (xapp-...) used for Socket Mode.
  pub fn get_app_token() -> Result<String> {
    std::env::var("SLACK_APP_TOKEN")
      .map_err(|_| eyre!("Slack app token not found. Set SLACK_APP_TOKEN environment variable."))
  }
}
