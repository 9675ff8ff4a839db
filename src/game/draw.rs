use std::sync::Arc;
use std::time::Duration;

use rand::seq::IndexedRandom;
use tokio::time::timeout;
use tracing::{debug, warn};

use super::card::POOL_SIZE;
use super::errors::GameError;
use crate::suggestion::{SuggestionError, SuggestionRequest, SuggestionSource};

const DEFAULT_SUGGESTION_TIMEOUT: Duration = Duration::from_secs(5);

/// Picks the next number to draw. Selection only: persisting the number is the caller's job.
#[derive(Clone)]
pub struct DrawEngine {
    suggestion_source: Option<Arc<dyn SuggestionSource>>,
    suggestion_timeout: Duration,
}

impl Default for DrawEngine {
    fn default() -> Self {
        Self::random()
    }
}

impl DrawEngine {
    /// Engine that always draws uniformly at random
    pub fn random() -> Self {
        Self {
            suggestion_source: None,
            suggestion_timeout: DEFAULT_SUGGESTION_TIMEOUT,
        }
    }

    /// Engine that asks `source` first and falls back to random
    pub fn with_suggestion_source(source: Arc<dyn SuggestionSource>) -> Self {
        Self {
            suggestion_source: Some(source),
            suggestion_timeout: DEFAULT_SUGGESTION_TIMEOUT,
        }
    }

    /// Set the hard bound on how long the suggestion source may take
    pub fn with_suggestion_timeout(mut self, suggestion_timeout: Duration) -> Self {
        self.suggestion_timeout = suggestion_timeout;
        self
    }

    pub fn has_suggestion_source(&self) -> bool {
        self.suggestion_source.is_some()
    }

    /// Selects a number in 1..=75 that is not in `drawn_numbers`
    pub async fn draw_next(&self, drawn_numbers: &[u8]) -> Result<u8, GameError> {
        if drawn_numbers.len() >= POOL_SIZE as usize {
            return Err(GameError::ExhaustedPool);
        }

        let available = available_numbers(drawn_numbers);
        if available.is_empty() {
            return Err(GameError::ExhaustedPool);
        }

        if let Some(source) = &self.suggestion_source {
            match self.ask(source.as_ref(), drawn_numbers, &available).await {
                Ok(number) => {
                    debug!(number, source = source.name(), "Using suggested number");
                    return Ok(number);
                }
                Err(e) => {
                    warn!(
                        source = source.name(),
                        error = %e,
                        "Suggestion rejected, falling back to random draw"
                    );
                }
            }
        }

        draw_random(&available).ok_or(GameError::ExhaustedPool)
    }

    async fn ask(
        &self,
        source: &dyn SuggestionSource,
        drawn_numbers: &[u8],
        available: &[u8],
    ) -> Result<u8, SuggestionError> {
        let request = SuggestionRequest {
            drawn_numbers: drawn_numbers.to_vec(),
            available_numbers: available.to_vec(),
        };

        let suggested = timeout(self.suggestion_timeout, source.suggest(&request))
            .await
            .map_err(|_| SuggestionError::Timeout)??;

        validate_suggestion(suggested, drawn_numbers).ok_or_else(|| {
            SuggestionError::InvalidResponse(format!("{} is not an available number", suggested))
        })
    }
}

/// Numbers in the pool that have not been drawn yet, ascending
pub fn available_numbers(drawn_numbers: &[u8]) -> Vec<u8> {
    (1..=POOL_SIZE)
        .filter(|n| !drawn_numbers.contains(n))
        .collect()
}

/// A suggestion is usable iff it is in the pool and not drawn yet
fn validate_suggestion(suggested: i64, drawn_numbers: &[u8]) -> Option<u8> {
    let number = u8::try_from(suggested).ok()?;
    if (1..=POOL_SIZE).contains(&number) && !drawn_numbers.contains(&number) {
        Some(number)
    } else {
        None
    }
}

fn draw_random(available: &[u8]) -> Option<u8> {
    available.choose(&mut rand::rng()).copied()
}
