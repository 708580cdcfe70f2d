use clap::Parser;
use thiserror::Error;

use crate::llm::DEFAULT_MODEL;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("GEMINI_API_KEY is not set")]
    MissingApiKey,
}

/// Service settings, read from flags or the environment.
#[derive(Debug, Clone, Parser)]
#[command(name = "patient-sim-service", version, about)]
pub struct Config {
    /// Gemini API key
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    #[arg(long, env = "PORT", default_value_t = 5000)]
    pub port: u16,

    /// Model used for both role-play and evaluation
    #[arg(long, env = "GEMINI_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,

    /// `json` or `pretty`
    #[arg(long, env = "LOG_FORMAT", default_value = "json")]
    pub log_format: String,
}

impl Config {
    /// The API key, which must be present and non-blank before anything is served.
    pub fn api_key(&self) -> Result<&str, ConfigError> {
        match self.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => Ok(key),
            _ => Err(ConfigError::MissingApiKey),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
