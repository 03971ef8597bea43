mod channels;
mod defaults;


pub use channels::*;

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::ChorusError;
use defaults::*;

/// Environment variable that overrides `channel.telegram.bot_token`.
pub const BOT_TOKEN_ENV: &str = "BOT_TOKEN";

/// Top-level Chorus configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub chorus: ChorusConfig,
    #[serde(default)]
    pub echo: EchoConfig,
    #[serde(default)]
    pub channel: ChannelConfig,
}

/// General process settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChorusConfig {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Directory for `chorus.log`. Empty = stdout only.
    #[serde(default)]
    pub log_dir: String,
}

impl Default for ChorusConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            log_level: default_log_level(),
            log_dir: String::new(),
        }
    }
}

/// Burst detection settings. Read once at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EchoConfig {
    /// Distinct senders needed before the bot echoes.
    #[serde(default = "default_trigger_count")]
    pub trigger_count: usize,
    /// Window, anchored at the first sighting, in which senders are counted.
    #[serde(default = "default_time_window_secs")]
    pub time_window_secs: u64,
}

impl Default for EchoConfig {
    fn default() -> Self {
        Self {
            trigger_count: default_trigger_count(),
            time_window_secs: default_time_window_secs(),
        }
    }
}

impl EchoConfig {
    pub fn time_window(&self) -> Duration {
        Duration::from_secs(self.time_window_secs)
    }
}

impl Config {
    /// Replace the Telegram token with `token` when it is non-empty.
    ///
    /// Creates an enabled Telegram section if the file had none, so a bare
    /// `BOT_TOKEN=... chorus start` works without any config file.
    pub fn apply_token_override(&mut self, token: Option<String>) {
        let Some(token) = token.filter(|t| !t.trim().is_empty()) else {
            return;
        };
        match self.channel.telegram.as_mut() {
            Some(tg) => tg.bot_token = token,
            None => {
                self.channel.telegram = Some(TelegramConfig {
                    enabled: true,
                    bot_token: token,
                    allowed_chats: Vec::new(),
                });
            }
        }
    }

    /// Reject configurations the bot cannot meaningfully run with.
    pub fn validate(&self) -> Result<(), ChorusError> {
        if self.echo.trigger_count == 0 {
            return Err(ChorusError::Config(
                "echo.trigger_count must be at least 1".into(),
            ));
        }
        if self.echo.time_window_secs == 0 {
            return Err(ChorusError::Config(
                "echo.time_window_secs must be at least 1".into(),
            ));
        }
        match self.channel.telegram {
            Some(ref tg) if tg.enabled => {
                if tg.bot_token.trim().is_empty() {
                    return Err(ChorusError::Config(format!(
                        "Telegram is enabled but bot_token is empty. \
                         Set it in the config file or the {BOT_TOKEN_ENV} env var."
                    )));
                }
            }
            _ => {
                return Err(ChorusError::Config(format!(
                    "No channels enabled. Configure [channel.telegram] or set {BOT_TOKEN_ENV}."
                )));
            }
        }
        Ok(())
    }
}

/// Where a loaded configuration came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    /// Parsed from the given file.
    File,
    /// The file did not exist; built-in defaults were used.
    Defaults,
}

/// Load configuration from a TOML file.
///
/// Falls back to defaults if the file does not exist, reported through the
/// returned [`ConfigSource`] so the caller can log it once logging is up.
/// `BOT_TOKEN` from the environment is applied on top. The result is not
/// validated.
pub fn load(path: &str) -> Result<(Config, ConfigSource), ChorusError> {
    let (mut config, source) = parse_file(Path::new(path))?;
    config.apply_token_override(std::env::var(BOT_TOKEN_ENV).ok());
    Ok((config, source))
}

fn parse_file(path: &Path) -> Result<(Config, ConfigSource), ChorusError> {
    if !path.exists() {
        return Ok((Config::default(), ConfigSource::Defaults));
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| ChorusError::Config(format!("failed to read {}: {}", path.display(), e)))?;

    let config = toml::from_str(&content)
        .map_err(|e| ChorusError::Config(format!("failed to parse config: {}", e)))?;
    Ok((config, ConfigSource::File))
}
