//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use support_chat_core::CompletionSettings;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub log_level: Level,
    pub data_dir: PathBuf,
    /// When set, collections are stored in Postgres instead of `data_dir`.
    pub database_url: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub completion_base_url: String,
    pub completion_model: String,
    pub completion_max_tokens: u32,
    /// `None` waits on the completion service indefinitely.
    pub completion_timeout: Option<Duration>,
    pub allowed_origin: String,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // --- Load Server and Storage Settings ---
        let bind_address_str = lookup("BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let data_dir = lookup("DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./data"));
        let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());

        // --- Load Completion Settings ---
        let anthropic_api_key = lookup("ANTHROPIC_API_KEY").filter(|key| !key.trim().is_empty());
        let completion_base_url = lookup("COMPLETION_BASE_URL")
            .unwrap_or_else(|| "https://api.anthropic.com".to_string())
            .trim_end_matches('/')
            .to_string();

        let defaults = CompletionSettings::default();
        let completion_model = lookup("COMPLETION_MODEL").unwrap_or(defaults.model);
        let completion_max_tokens = match lookup("COMPLETION_MAX_TOKENS") {
            Some(raw) => raw.parse::<u32>().map_err(|e| {
                ConfigError::InvalidValue("COMPLETION_MAX_TOKENS".to_string(), e.to_string())
            })?,
            None => defaults.max_tokens,
        };
        let completion_timeout = match lookup("COMPLETION_TIMEOUT_SECS") {
            Some(raw) => {
                let secs = raw.parse::<u64>().map_err(|e| {
                    ConfigError::InvalidValue("COMPLETION_TIMEOUT_SECS".to_string(), e.to_string())
                })?;
                Some(Duration::from_secs(secs))
            }
            None => None,
        };

        let allowed_origin =
            lookup("ALLOWED_ORIGIN").unwrap_or_else(|| "http://localhost:3000".to_string());

        Ok(Self {
            bind_address,
            log_level,
            data_dir,
            database_url,
            anthropic_api_key,
            completion_base_url,
            completion_model,
            completion_max_tokens,
            completion_timeout,
            allowed_origin,
        })
    }

    pub fn completion_settings(&self) -> CompletionSettings {
        CompletionSettings {
            model: self.completion_model.clone(),
            max_tokens: self.completion_max_tokens,
        }
    }
}
