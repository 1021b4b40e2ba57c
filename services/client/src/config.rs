//! services/client/src/config.rs
//!
//! Defines the client's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::path::PathBuf;
use std::time::Duration;
use storybook_core::GenerationOptions;
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
    pub api_url: String,
    pub health_url: String,
    pub data_dir: PathBuf,
    pub log_level: Level,
    pub health_timeout: Duration,
    pub request_timeout: Duration,
    pub illustration_concurrency: usize,
    pub illustration_attempts: u32,
    pub target_age: String,
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

    /// Builds the configuration from any key lookup, applying defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        // --- Backend Endpoints ---
        let api_url = var_or("STORYBOOK_API_URL", "http://localhost:8000/api");
        let health_url = var_or("STORYBOOK_HEALTH_URL", "http://localhost:8000/health");
        for (key, url) in [("STORYBOOK_API_URL", &api_url), ("STORYBOOK_HEALTH_URL", &health_url)] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::InvalidValue(
                    key.to_string(),
                    format!("'{}' is not an http(s) URL", url),
                ));
            }
        }

        let data_dir = PathBuf::from(var_or("STORYBOOK_DATA_DIR", "./.storybook"));

        let log_level_str = var_or("RUST_LOG", "INFO");
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Workflow Settings ---
        let health_timeout = Duration::from_millis(parse_number(&lookup, "HEALTH_TIMEOUT_MS", 3000)?);
        let request_timeout = Duration::from_secs(parse_number(&lookup, "REQUEST_TIMEOUT_SECS", 120)?);
        let illustration_concurrency = parse_number(&lookup, "ILLUSTRATION_CONCURRENCY", 1)?;
        let illustration_attempts = parse_number(&lookup, "ILLUSTRATION_ATTEMPTS", 1)?;
        if illustration_concurrency == 0 {
            return Err(ConfigError::InvalidValue(
                "ILLUSTRATION_CONCURRENCY".to_string(),
                "must be at least 1".to_string(),
            ));
        }
        if illustration_attempts == 0 {
            return Err(ConfigError::InvalidValue(
                "ILLUSTRATION_ATTEMPTS".to_string(),
                "must be at least 1".to_string(),
            ));
        }
        let target_age = var_or("TARGET_AGE", "children");

        Ok(Self {
            api_url,
            health_url,
            data_dir,
            log_level,
            health_timeout,
            request_timeout,
            illustration_concurrency: illustration_concurrency as usize,
            illustration_attempts: illustration_attempts as u32,
            target_age,
        })
    }

    pub fn generation_options(&self) -> GenerationOptions {
        GenerationOptions {
            health_timeout: self.health_timeout,
            illustration_concurrency: self.illustration_concurrency,
            illustration_attempts: self.illustration_attempts,
            target_age: self.target_age.clone(),
        }
    }
}

fn parse_number<F>(lookup: &F, key: &str, default: u64) -> Result<u64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse::<u64>().map_err(|_| {
            ConfigError::InvalidValue(key.to_string(), format!("'{}' is not a number", raw))
        }),
    }
}
