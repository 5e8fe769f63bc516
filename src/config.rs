//! Startup configuration read from the environment (and `.env`, loaded by `main`).

use std::env;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crate::responder::DEFAULT_PERSONA;
use crate::utils::openai_client::{CompletionSettings, OpenAiClient};

/// Errors that stop the bot before it connects to Discord.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing {var} (or {alias}). Add it to the environment or a .env file.")]
    Missing {
        var: &'static str,
        alias: &'static str,
    },

    #[error("Invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// Everything the bot needs to start.
#[derive(Debug, Clone)]
pub struct Config {
    pub discord_token: String,
    pub openai_api_key: String,
    pub base_url: Url,
    pub timeout: Duration,
    pub persona: String,
    pub completion: CompletionSettings,
}

impl Config {
    /// Reads the configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Reads the configuration through `lookup`. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let discord_token = get("DISCORD_TOKEN")
            .or_else(|| get("TOKEN"))
            .ok_or(ConfigError::Missing {
                var: "DISCORD_TOKEN",
                alias: "TOKEN",
            })?;

        let openai_api_key = get("OPENAI_API_KEY")
            .or_else(|| get("OPENAI_KEY"))
            .ok_or(ConfigError::Missing {
                var: "OPENAI_API_KEY",
                alias: "OPENAI_KEY",
            })?;

        let model = get("OPENAI_MODEL").unwrap_or_else(|| {
            debug!(
                "OPENAI_MODEL not set, using '{}'",
                CompletionSettings::DEFAULT_MODEL
            );
            CompletionSettings::DEFAULT_MODEL.to_string()
        });

        let base_url = get("OPENAI_BASE_URL")
            .unwrap_or_else(|| OpenAiClient::DEFAULT_BASE_URL.to_string());
        let base_url = Url::parse(&base_url).map_err(|e| ConfigError::Invalid {
            var: "OPENAI_BASE_URL",
            reason: e.to_string(),
        })?;

        let timeout = match get("OPENAI_TIMEOUT_SECS") {
            Some(raw) => match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(ConfigError::Invalid {
                        var: "OPENAI_TIMEOUT_SECS",
                        reason: format!("expected a positive number of seconds, got '{raw}'"),
                    });
                }
            },
            None => OpenAiClient::DEFAULT_TIMEOUT,
        };

        let persona = get("SCRUMBOT_PERSONA").unwrap_or_else(|| DEFAULT_PERSONA.to_string());
        if persona != DEFAULT_PERSONA {
            warn!("Using persona override from SCRUMBOT_PERSONA");
        }

        Ok(Self {
            discord_token,
            openai_api_key,
            base_url,
            timeout,
            persona,
            completion: CompletionSettings::with_model(model),
        })
    }
}
