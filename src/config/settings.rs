//! User settings for fintrack
//!
//! A single configuration-driven initialization path: the store backend,
//! the text-generation service (including its key) and the default currency
//! all come from here, optionally overridden by environment variables.

use serde::{Deserialize, Serialize};

use super::paths::FinancePaths;
use crate::error::FinanceError;
use crate::models::{Currency, UserId};

/// Overrides `store_backend` when set
pub const BACKEND_ENV: &str = "FINTRACK_BACKEND";

/// Overrides `ai.api_key` when set
pub const AI_KEY_ENV: &str = "FINTRACK_AI_KEY";

/// Log filter directives for the binary (default `warn`)
pub const LOG_ENV: &str = "FINTRACK_LOG";

/// Which record store implementation to open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// One JSON file per table (default)
    #[default]
    Json,
    /// Embedded SQLite database
    Sqlite,
}

impl StoreBackend {
    /// Parse a backend name (case-insensitive)
    pub fn parse(s: &str) -> Result<Self, FinanceError> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "sqlite" => Ok(Self::Sqlite),
            other => Err(FinanceError::Config(format!(
                "Unknown store backend '{}'. Use 'json' or 'sqlite'",
                other
            ))),
        }
    }
}

impl std::fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json => write!(f, "json"),
            Self::Sqlite => write!(f, "sqlite"),
        }
    }
}

/// Wire format spoken by the text-generation service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AiProvider {
    /// Local Ollama chat endpoint
    #[default]
    Ollama,
    /// Anthropic messages API
    Anthropic,
}

impl std::fmt::Display for AiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ollama => write!(f, "ollama"),
            Self::Anthropic => write!(f, "anthropic"),
        }
    }
}

/// Text-generation service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiSettings {
    #[serde(default)]
    pub provider: AiProvider,

    #[serde(default = "default_ai_url")]
    pub url: String,

    #[serde(default = "default_ai_model")]
    pub model: String,

    /// Only used when `FINTRACK_AI_KEY` is not set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_ai_timeout")]
    pub timeout_secs: u64,
}

fn default_ai_url() -> String {
    "http://localhost:11434/api/chat".to_string()
}

fn default_ai_model() -> String {
    "llama3".to_string()
}

fn default_ai_timeout() -> u64 {
    60
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            provider: AiProvider::default(),
            url: default_ai_url(),
            model: default_ai_model(),
            api_key: None,
            timeout_secs: default_ai_timeout(),
        }
    }
}

/// User settings for fintrack
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Record store backend
    #[serde(default)]
    pub store_backend: StoreBackend,

    /// The single user every record is scoped to
    #[serde(default)]
    pub user_id: UserId,

    /// Default currency for new users and formatting
    #[serde(default)]
    pub currency: Currency,

    /// Date format preference (strftime format)
    #[serde(default = "default_date_format")]
    pub date_format: String,

    /// Text-generation service
    #[serde(default)]
    pub ai: AiSettings,
}

fn default_schema_version() -> u32 {
    1
}

fn default_date_format() -> String {
    "%Y-%m-%d".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            store_backend: StoreBackend::default(),
            user_id: UserId::default(),
            currency: Currency::default(),
            date_format: default_date_format(),
            ai: AiSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings from disk, or create default settings if file doesn't exist
    pub fn load_or_create(paths: &FinancePaths) -> Result<Self, FinanceError> {
        let settings_path = paths.settings_file();

        if settings_path.exists() {
            let contents = std::fs::read_to_string(&settings_path).map_err(|e| {
                FinanceError::Io(format!("Failed to read settings file: {}", e))
            })?;

            let settings: Settings = serde_json::from_str(&contents).map_err(|e| {
                FinanceError::Config(format!("Failed to parse settings file: {}", e))
            })?;

            Ok(settings)
        } else {
            // Don't save yet - let caller decide when to persist
            Ok(Settings::default())
        }
    }

    /// Apply environment overrides on top of the loaded settings
    pub fn apply_env(mut self) -> Result<Self, FinanceError> {
        if let Ok(backend) = std::env::var(BACKEND_ENV) {
            self.store_backend = StoreBackend::parse(&backend)?;
        }
        Ok(self)
    }

    /// The key for the text-generation service, environment first
    pub fn ai_api_key(&self) -> Option<String> {
        std::env::var(AI_KEY_ENV)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| self.ai.api_key.clone())
    }

    /// Currency symbol used when formatting money
    pub fn currency_symbol(&self) -> &'static str {
        self.currency.symbol()
    }

    /// Save settings to disk
    pub fn save(&self, paths: &FinancePaths) -> Result<(), FinanceError> {
        paths.ensure_directories()?;

        let settings_path = paths.settings_file();
        let contents = serde_json::to_string_pretty(self).map_err(|e| {
            FinanceError::Config(format!("Failed to serialize settings: {}", e))
        })?;

        std::fs::write(&settings_path, contents).map_err(|e| {
            FinanceError::Io(format!("Failed to write settings file: {}", e))
        })?;

        Ok(())
    }
}
