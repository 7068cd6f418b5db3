// ABOUTME: Configuration parsing from TOML file with environment variable overrides
// ABOUTME: Secrets are redacted from Debug output; all sections have defaults

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::commands::RegistrationPolicy;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub bot: BotConfig,
    #[serde(default)]
    pub presence: PresenceConfig,
    #[serde(default)]
    pub commands: CommandsConfig,
    #[serde(default)]
    pub stats: StatsConfig,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct BotConfig {
    /// Gateway authentication token
    #[serde(default)]
    pub token: String,
    /// Token of the designated test identity; when it matches `token`,
    /// public stats are not pushed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_token: Option<String>,
    /// How long to wait for the ready-signal before giving up
    #[serde(default = "default_ready_timeout_secs")]
    pub ready_timeout_secs: u64,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            test_token: None,
            ready_timeout_secs: default_ready_timeout_secs(),
        }
    }
}

// Custom Debug impl to redact sensitive fields
impl fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BotConfig")
            .field("token", &"[REDACTED]")
            .field("test_token", &self.test_token.as_ref().map(|_| "[REDACTED]"))
            .field("ready_timeout_secs", &self.ready_timeout_secs)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresenceConfig {
    /// Status strings cycled by the presence rotator
    #[serde(default = "default_statuses")]
    pub statuses: Vec<String>,
    #[serde(default = "default_presence_interval_secs")]
    pub interval_secs: u64,
    #[serde(default = "default_presence_delay_secs")]
    pub initial_delay_secs: u64,
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            statuses: default_statuses(),
            interval_secs: default_presence_interval_secs(),
            initial_delay_secs: default_presence_delay_secs(),
        }
    }
}

impl PresenceConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn initial_delay(&self) -> Duration {
        Duration::from_secs(self.initial_delay_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CommandsConfig {
    /// What to do when a command fails local validation at registration time
    #[serde(default)]
    pub registration: RegistrationPolicy,
}

#[derive(Clone, Serialize, Deserialize, Default)]
pub struct StatsConfig {
    /// Bot-listing endpoint receiving the server count; unset disables pushes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

// Custom Debug impl to redact the API key
impl fmt::Debug for StatsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatsConfig")
            .field("url", &self.url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

fn default_ready_timeout_secs() -> u64 {
    60
}

fn default_presence_interval_secs() -> u64 {
    16
}

fn default_presence_delay_secs() -> u64 {
    1
}

fn default_statuses() -> Vec<String> {
    vec![
        "/help | Commands!".to_string(),
        "/roll | Feeling lucky?".to_string(),
        "/ping | Still alive".to_string(),
        "/help | New ideas!".to_string(),
    ]
}

impl Config {
    /// Candidate config file, if one exists.
    ///
    /// Checks `CHIRP_CONFIG_PATH` first (useful for testing and deployment),
    /// then `./config.toml`.
    fn find_config_file() -> Option<PathBuf> {
        if let Ok(env_path) = std::env::var("CHIRP_CONFIG_PATH") {
            let path = PathBuf::from(&env_path);
            if path.exists() {
                return Some(path);
            }
        }
        let local = PathBuf::from("config.toml");
        if local.exists() {
            return Some(local);
        }
        None
    }

    /// Load configuration from config.toml with environment variable overrides.
    pub fn load() -> Result<Self> {
        let mut config = if let Some(path) = Self::find_config_file() {
            tracing::info!(path = %path.display(), "Loading configuration from file");
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            toml::from_str(&raw).with_context(|| format!("invalid TOML in {}", path.display()))?
        } else {
            tracing::info!("No config file found, using environment variables and defaults");
            Config::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("CHIRP_TOKEN") {
            self.bot.token = val;
        }
        if let Ok(val) = std::env::var("CHIRP_TEST_TOKEN") {
            self.bot.test_token = Some(val);
        }
        if let Ok(val) = std::env::var("CHIRP_READY_TIMEOUT_SECS") {
            match val.parse() {
                Ok(secs) => self.bot.ready_timeout_secs = secs,
                Err(_) => tracing::warn!(value = %val, "Ignoring invalid CHIRP_READY_TIMEOUT_SECS"),
            }
        }
        if let Ok(val) = std::env::var("CHIRP_REGISTRATION") {
            match val.parse() {
                Ok(policy) => self.commands.registration = policy,
                Err(e) => tracing::warn!(error = %e, "Ignoring invalid CHIRP_REGISTRATION"),
            }
        }
        if let Ok(val) = std::env::var("STATS_URL") {
            self.stats.url = Some(val);
        }
        if let Ok(val) = std::env::var("STATS_API_KEY") {
            self.stats.api_key = Some(val);
        }
    }

    /// Whether the designated test identity is in use.
    pub fn is_test_identity(&self) -> bool {
        matches!(&self.bot.test_token, Some(t) if !t.is_empty() && *t == self.bot.token)
    }

    pub fn ready_timeout(&self) -> Duration {
        Duration::from_secs(self.bot.ready_timeout_secs)
    }
}
