//! Game configuration: hearts, advance delays and webhook settings

use serde::{Deserialize, Serialize};

pub const DEFAULT_WEBHOOK_URL: &str = "http://localhost:5678/webhook/sql-quest";
pub const WEBHOOK_URL_ENV: &str = "SQLQUEST_WEBHOOK_URL";
pub const NEXT_LEVEL_WEBHOOK_URL_ENV: &str = "SQLQUEST_NEXT_LEVEL_WEBHOOK_URL";

/// Tunables shared by level sessions and webhook callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub max_hearts: u32,
    /// Delay before moving on after a correct answer
    pub correct_advance_ms: u64,
    /// Delay before moving on once the answer has been revealed
    pub out_of_hearts_advance_ms: u64,
    /// Receives uploaded document text
    pub webhook_url: String,
    /// Serves questions for levels two and three
    pub next_level_webhook_url: String,
    pub upload_timeout_ms: u64,
    pub next_level_timeout_ms: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            max_hearts: 2,
            correct_advance_ms: 1000,
            out_of_hearts_advance_ms: 2000,
            webhook_url: DEFAULT_WEBHOOK_URL.to_string(),
            next_level_webhook_url: DEFAULT_WEBHOOK_URL.to_string(),
            upload_timeout_ms: 60_000,
            next_level_timeout_ms: 30_000,
        }
    }
}

impl GameConfig {
    /// Parse a JSON config; absent fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self, String> {
        let config: GameConfig = serde_json::from_str(json)
            .map_err(|e| format!("Failed to parse game config: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults with webhook URLs taken from the environment when set
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = GameConfig::default();
        if let Some(url) = lookup(WEBHOOK_URL_ENV).filter(|u| !u.trim().is_empty()) {
            config.next_level_webhook_url = url.clone();
            config.webhook_url = url;
        }
        if let Some(url) = lookup(NEXT_LEVEL_WEBHOOK_URL_ENV).filter(|u| !u.trim().is_empty()) {
            config.next_level_webhook_url = url;
        }
        config
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.max_hearts == 0 {
            return Err("max_hearts must be at least 1".to_string());
        }
        Ok(())
    }
}
