use std::collections::VecDeque;
use std::time::Duration;

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::ai::RemoteProvider;
use crate::config::Config;
use crate::error::{ChatError, Result};

const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Client for the Google Gemini `generateContent` API.
/// Plays the role of a chat session: instruction and generation settings are fixed
/// at creation, and the conversation grows with every successful turn.
pub struct GeminiClient {
    http_client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    system_instruction: String,
    temperature: f32,
    max_tokens: u32,
    history_limit: usize,
    conversation_history: VecDeque<Content>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thought: Option<bool>,
}

impl Part {
    fn text(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
            thought: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    fn new(role: &str, text: &str) -> Self {
        Self {
            role: Some(role.to_string()),
            parts: vec![Part::text(text)],
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f32,
    pub max_output_tokens: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub system_instruction: Content,
    pub contents: Vec<Content>,
    pub generation_config: GenerationConfig,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<Content>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    pub prompt_token_count: Option<u32>,
    pub candidates_token_count: Option<u32>,
    pub total_token_count: Option<u32>,
}

impl GenerateContentResponse {
    /// Text of the first candidate, thought parts excluded. Empty when there is none.
    pub fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter(|p| p.thought != Some(true))
                    .filter_map(|p| p.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

impl GeminiClient {
    /// Creates the session. Fails when the key is missing or the HTTP client cannot be built.
    pub fn new(config: &Config) -> Result<Self> {
        let api_key = config
            .gemini_api_key
            .clone()
            .filter(|key| !key.is_empty() && key != "not-configured")
            .ok_or_else(|| ChatError::ProviderUnavailable("no Gemini API key".to_string()))?;

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs.max(1)))
            .build()
            .map_err(|e| ChatError::ProviderUnavailable(format!("HTTP client: {e}")))?;

        Ok(Self {
            http_client,
            api_key,
            base_url: BASE_URL.to_string(),
            model: config.gemini_model.clone(),
            system_instruction: config.system_prompt.clone(),
            temperature: config.gemini_temperature,
            max_tokens: config.gemini_max_tokens,
            history_limit: config.history_limit,
            conversation_history: VecDeque::with_capacity(config.history_limit + 2),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Request body for `message` on top of the current conversation
    pub fn build_request(&self, message: &str) -> GenerateContentRequest {
        let mut contents: Vec<Content> = self.conversation_history.iter().cloned().collect();
        contents.push(Content::new("user", message));

        GenerateContentRequest {
            system_instruction: Content {
                role: None,
                parts: vec![Part::text(&self.system_instruction)],
            },
            contents,
            generation_config: GenerationConfig {
                temperature: self.temperature,
                max_output_tokens: self.max_tokens,
            },
        }
    }

    /// Sends a message and returns the model's text
    pub async fn get_response(&mut self, user_input: &str) -> anyhow::Result<String> {
        let request = self.build_request(user_input);
        let url = format!(
            "{}/models/{}:generateContent",
            self.base_url,
            urlencoding::encode(&self.model)
        );

        let response = self
            .http_client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .context("Gemini request failed")?;

        let status = response.status();
        let body = response.text().await.context("failed to read Gemini response")?;

        if !status.is_success() {
            log::error!("Gemini API error ({}): {}", status, body);
            return Err(anyhow!("Gemini API error: {}", status));
        }

        let parsed: GenerateContentResponse =
            serde_json::from_str(&body).context("unexpected Gemini response body")?;

        if let Some(usage) = &parsed.usage_metadata {
            log::debug!(
                "Gemini usage: prompt={:?} output={:?} total={:?}",
                usage.prompt_token_count,
                usage.candidates_token_count,
                usage.total_token_count
            );
        }
        if let Some(reason) = parsed.candidates.first().and_then(|c| c.finish_reason.as_deref()) {
            log::debug!("Gemini finish reason: {}", reason);
        }

        let text = parsed.text();
        if !text.is_empty() {
            self.record_turn(user_input, &text);
        }
        Ok(text)
    }

    fn record_turn(&mut self, user_input: &str, reply: &str) {
        self.conversation_history.push_back(Content::new("user", user_input));
        self.conversation_history.push_back(Content::new("model", reply));

        // turns are stored in pairs, so drop whole pairs
        while self.conversation_history.len() > self.history_limit {
            self.conversation_history.pop_front();
            self.conversation_history.pop_front();
        }
    }

    pub fn clear_history(&mut self) {
        self.conversation_history.clear();
    }

    pub fn history_len(&self) -> usize {
        self.conversation_history.len()
    }
}

#[async_trait]
impl RemoteProvider for GeminiClient {
    fn name(&self) -> &str {
        "Gemini"
    }

    async fn send_message(&mut self, message: &str) -> Result<String> {
        Ok(self.get_response(message).await?)
    }

    fn reset(&mut self) {
        self.clear_history();
    }
}
