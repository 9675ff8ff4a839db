use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use super::{SuggestionError, SuggestionRequest, SuggestionSource};

/// Connection settings for an OpenAI-compatible chat-completions endpoint
#[derive(Debug, Clone)]
pub struct LlmSuggestionConfig {
    /// Base URL, e.g. `https://api.openai.com/v1`
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    /// Transport-level timeout; the draw engine applies its own bound on top
    pub request_timeout: Duration,
}

/// Asks a language model to act as the bingo caller
pub struct LlmSuggestionSource {
    config: LlmSuggestionConfig,
    http_client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

impl LlmSuggestionSource {
    pub fn new(config: LlmSuggestionConfig) -> Result<Self, SuggestionError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| SuggestionError::Unavailable(format!("Failed to build client: {}", e)))?;

        Ok(Self {
            config,
            http_client,
        })
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }
}

/// Prompt sent to the model. The full drawn/available context is included so
/// the model can only pick a legal number if it follows instructions.
pub(crate) fn build_prompt(request: &SuggestionRequest) -> String {
    format!(
        "You are a bingo caller for a 75-ball bingo game. You need to select a single, new, unique number.\n\
         The numbers that have already been drawn are: [{}].\n\
         The numbers that are still available to be drawn are: [{}].\n\
         Please select one number from the list of available numbers.\n\
         Your response must be a single number only.",
        join_numbers(&request.drawn_numbers),
        join_numbers(&request.available_numbers),
    )
}

fn join_numbers(numbers: &[u8]) -> String {
    numbers
        .iter()
        .map(|n| n.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Reads the leading integer of a model reply, ignoring surrounding whitespace
pub(crate) fn parse_suggestion(text: &str) -> Result<i64, SuggestionError> {
    let trimmed = text.trim();
    let digits_end = trimmed
        .char_indices()
        .find(|(i, c)| !(c.is_ascii_digit() || (*i == 0 && (*c == '-' || *c == '+'))))
        .map(|(i, _)| i)
        .unwrap_or(trimmed.len());

    trimmed[..digits_end]
        .parse::<i64>()
        .map_err(|_| SuggestionError::InvalidResponse(format!("not a number: {:?}", text)))
}

#[async_trait]
impl SuggestionSource for LlmSuggestionSource {
    #[instrument(skip(self, request), fields(drawn = request.drawn_numbers.len()))]
    async fn suggest(&self, request: &SuggestionRequest) -> Result<i64, SuggestionError> {
        let body = ChatCompletionRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: build_prompt(request),
            }],
            temperature: 1.0,
        };

        let mut http_request = self.http_client.post(self.completions_url()).json(&body);
        if let Some(api_key) = &self.config.api_key {
            http_request = http_request.bearer_auth(api_key);
        }

        let response = http_request.send().await.map_err(|e| {
            if e.is_timeout() {
                SuggestionError::Timeout
            } else {
                SuggestionError::Unavailable(e.to_string())
            }
        })?;

        if !response.status().is_success() {
            let status = response.status();
            warn!(status = %status, "Suggestion endpoint returned an error status");
            return Err(SuggestionError::Unavailable(format!(
                "endpoint returned {}",
                status
            )));
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| SuggestionError::InvalidResponse(e.to_string()))?;

        let reply = completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| SuggestionError::InvalidResponse("no choices".to_string()))?;

        debug!(reply = %reply, "Suggestion endpoint replied");

        parse_suggestion(&reply)
    }

    fn name(&self) -> &'static str {
        "LlmSuggestionSource"
    }
}
