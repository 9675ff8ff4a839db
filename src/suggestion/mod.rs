// Suggestion sources for the draw engine
//
// A suggestion source proposes the next number to draw. Its answer is never
// trusted: the draw engine re-validates every suggestion and falls back to a
// uniform random pick when the source fails, times out, or answers nonsense.

pub use llm::{LlmSuggestionConfig, LlmSuggestionSource};

mod llm;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

/// Context handed to a suggestion source
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionRequest {
    pub drawn_numbers: Vec<u8>,
    pub available_numbers: Vec<u8>,
}

#[derive(Debug, Error)]
pub enum SuggestionError {
    #[error("Suggestion source unavailable: {0}")]
    Unavailable(String),

    #[error("Suggestion source timed out")]
    Timeout,

    #[error("Suggestion source returned an invalid response: {0}")]
    InvalidResponse(String),
}

#[async_trait]
pub trait SuggestionSource: Send + Sync {
    /// Propose the next number. Any integer may come back; callers validate it.
    async fn suggest(&self, request: &SuggestionRequest) -> Result<i64, SuggestionError>;

    /// Get a human-readable name for this source (for logging/debugging)
    fn name(&self) -> &'static str;
}
