use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CadernetaError, Result};

/// Top-level configuration for Caderneta.
///
/// Loaded from `~/.caderneta/config.toml` by default. Every section falls
/// back to its defaults when absent from the file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CadernetaConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub chat: ChatConfig,
}

impl CadernetaConfig {
    /// Read and validate a TOML config file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: CadernetaConfig = toml::from_str(&content)?;
        config.validate()?;
        debug!(path = %path.display(), "Config parsed");
        Ok(config)
    }

    /// Reject values the interpreter cannot run with.
    pub fn validate(&self) -> Result<()> {
        let chat = &self.chat;
        if chat.max_message_length == 0 {
            return Err(CadernetaError::Config(
                "chat.max_message_length must be at least 1".into(),
            ));
        }
        if chat.context_ttl_minutes == 0 {
            return Err(CadernetaError::Config(
                "chat.context_ttl_minutes must be at least 1".into(),
            ));
        }
        if chat.fallback_candidates == 0 {
            return Err(CadernetaError::Config(
                "chat.fallback_candidates must be at least 1".into(),
            ));
        }
        if self.general.port == 0 {
            return Err(CadernetaError::Config("general.port must not be 0".into()));
        }
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
    /// HTTP port for `caderneta serve`.
    pub port: u16,
    /// JSON file holding the product catalog snapshot.
    pub catalog_path: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            port: 3040,
            catalog_path: "~/.caderneta/catalog.json".to_string(),
        }
    }
}

/// Conversational interpreter settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Whether the interpreter accepts turns at all.
    pub enabled: bool,
    /// Minutes a pending question stays answerable before it is discarded.
    pub context_ttl_minutes: u32,
    /// Maximum accepted message length, in characters.
    pub max_message_length: usize,
    /// Catalog items offered when the text names no known product noun.
    pub fallback_candidates: usize,
    /// Months ahead used for a scheduled payment with no explicit date.
    pub default_scheduled_horizon_months: u32,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            context_ttl_minutes: 10,
            max_message_length: 2000,
            fallback_candidates: 5,
            default_scheduled_horizon_months: 1,
        }
    }
}
