//! Runtime configuration from the environment

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

const DEFAULT_STORE_PATH: &str = "user_data.json";
const DEFAULT_API_BASE: &str = "https://api.telegram.org";
const DEFAULT_POLL_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("INTAKE_BOT_TOKEN is not set")]
    MissingToken,
}

/// Bot configuration
#[derive(Clone)]
pub struct BotConfig {
    pub token: String,
    /// Location of the record table
    pub store_path: PathBuf,
    pub api_base: String,
    /// Long-poll wait passed to `getUpdates`
    pub poll_timeout_secs: u64,
}

impl BotConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let token = lookup("INTAKE_BOT_TOKEN")
            .filter(|t| !t.trim().is_empty())
            .ok_or(ConfigError::MissingToken)?;

        Ok(Self {
            token,
            store_path: lookup("INTAKE_STORE_PATH")
                .map_or_else(|| PathBuf::from(DEFAULT_STORE_PATH), PathBuf::from),
            api_base: lookup("INTAKE_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            poll_timeout_secs: lookup("INTAKE_POLL_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_POLL_TIMEOUT_SECS),
        })
    }
}

// Keep the token out of logs
impl fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BotConfig")
            .field("token", &"<redacted>")
            .field("store_path", &self.store_path)
            .field("api_base", &self.api_base)
            .field("poll_timeout_secs", &self.poll_timeout_secs)
            .finish()
    }
}
