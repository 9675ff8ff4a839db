//! Server configuration loaded from `BINGO_*` environment variables.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::info;

use crate::game::DrawEngine;
use crate::room::models::DEFAULT_DRAW_INTERVAL_SECS;
use crate::suggestion::{LlmSuggestionConfig, LlmSuggestionSource, SuggestionError};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_SUGGESTION_TIMEOUT_MS: u64 = 5000;
const DEFAULT_SUGGESTION_MODEL: &str = "gpt-4o-mini";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value:?} ({reason})")]
    InvalidValue {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("Failed to set up suggestion source: {0}")]
    Suggestion(#[from] SuggestionError),
}

/// Complete server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Rooms are persisted here when set; memory only otherwise
    pub snapshot_path: Option<PathBuf>,
    /// Present only when a suggestion endpoint is configured
    pub suggestion: Option<LlmSuggestionConfig>,
    /// Upper bound on waiting for a suggestion before falling back to random
    pub suggestion_timeout: Duration,
    pub autodraw_interval_secs: u32,
}

impl ServerConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load configuration through `lookup`, which returns a variable's value if set
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind_addr = match non_empty(&lookup, "BINGO_BIND_ADDR") {
            Some(value) => parse_value("BINGO_BIND_ADDR", value)?,
            None => parse_value("BINGO_BIND_ADDR", DEFAULT_BIND_ADDR.to_string())?,
        };

        let snapshot_path = non_empty(&lookup, "BINGO_SNAPSHOT_PATH").map(PathBuf::from);

        let suggestion_timeout_ms = match non_empty(&lookup, "BINGO_SUGGESTION_TIMEOUT_MS") {
            Some(value) => parse_value("BINGO_SUGGESTION_TIMEOUT_MS", value)?,
            None => DEFAULT_SUGGESTION_TIMEOUT_MS,
        };
        if suggestion_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                var: "BINGO_SUGGESTION_TIMEOUT_MS",
                value: "0".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        let suggestion_timeout = Duration::from_millis(suggestion_timeout_ms);

        let suggestion = non_empty(&lookup, "BINGO_SUGGESTION_URL").map(|base_url| {
            LlmSuggestionConfig {
                base_url,
                model: non_empty(&lookup, "BINGO_SUGGESTION_MODEL")
                    .unwrap_or_else(|| DEFAULT_SUGGESTION_MODEL.to_string()),
                api_key: non_empty(&lookup, "BINGO_SUGGESTION_API_KEY"),
                request_timeout: suggestion_timeout,
            }
        });

        let autodraw_interval_secs = match non_empty(&lookup, "BINGO_AUTODRAW_INTERVAL_SECS") {
            Some(value) => parse_value("BINGO_AUTODRAW_INTERVAL_SECS", value)?,
            None => DEFAULT_DRAW_INTERVAL_SECS,
        };
        if autodraw_interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                var: "BINGO_AUTODRAW_INTERVAL_SECS",
                value: "0".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }

        Ok(Self {
            bind_addr,
            snapshot_path,
            suggestion,
            suggestion_timeout,
            autodraw_interval_secs,
        })
    }

    /// Builds the draw engine: model-backed when a suggestion endpoint is
    /// configured, plain random otherwise
    pub fn draw_engine(&self) -> Result<DrawEngine, ConfigError> {
        match &self.suggestion {
            Some(suggestion) => {
                info!(
                    base_url = %suggestion.base_url,
                    model = %suggestion.model,
                    timeout_ms = self.suggestion_timeout.as_millis() as u64,
                    "Using LLM suggestion source"
                );
                let source = LlmSuggestionSource::new(suggestion.clone())?;
                Ok(DrawEngine::with_suggestion_source(Arc::new(source))
                    .with_suggestion_timeout(self.suggestion_timeout))
            }
            None => {
                info!("No suggestion source configured, drawing at random");
                Ok(DrawEngine::random())
            }
        }
    }
}

fn non_empty<F>(lookup: &F, var: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(var)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_value<T>(var: &'static str, value: String) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        var,
        reason: e.to_string(),
        value,
    })
}
