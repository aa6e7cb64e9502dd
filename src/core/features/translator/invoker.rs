//! Translation invoker
//!
//! Sends one text to an OpenAI-compatible chat completion endpoint and returns
//! the model's answer. Any provider speaking that wire format works; DeepSeek
//! gets its recommended sampling parameters.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::languages::{detect_language, language_name};
use crate::shared::error::{AppError, AppResult};
use crate::shared::settings::{Provider, TranslationConfig};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[async_trait]
pub trait TranslationInvoker: Send + Sync {
    async fn translate(&self, text: &str, config: &TranslationConfig) -> AppResult<String>;
}

// -- Strict Serde Structs for the chat completion API --

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

pub fn system_prompt(source_language: &str, target_language: &str) -> String {
    let source = language_name(source_language);
    let target = language_name(target_language);
    format!(
        "You are a concise translator from {source} to {target}. Follow these rules strictly:
1. Keep translations CONCISE - aim for similar length as source text
2. Use minimal words while preserving full meaning
3. For UI/UX text:
   - Use standard UI terms
   - Prefer shorter alternatives
   - Example: \"点击确认\" -> \"Confirm\" (not \"Click to confirm\")
4. Formatting rules:
   - Keep exact spacing/breaks
   - Preserve all special characters
   - Maintain numbers and units as is
5. Output must be:
   - {target} only
   - Similar length to source
   - No explanations
   - No source language characters"
    )
}

pub fn build_request(text: &str, config: &TranslationConfig) -> ChatCompletionRequest {
    let source_language = detect_language(text);
    let mut request = ChatCompletionRequest {
        model: config.model_name.clone(),
        messages: vec![
            ChatMessage {
                role: "system".to_string(),
                content: system_prompt(source_language, &config.target_language),
            },
            ChatMessage {
                role: "user".to_string(),
                content: text.to_string(),
            },
        ],
        temperature: None,
        max_tokens: None,
        top_p: None,
        stream: None,
    };

    if config.provider == Provider::DeepSeek {
        request.temperature = Some(0.3);
        request.max_tokens = Some(2000);
        request.top_p = Some(0.95);
        request.stream = Some(false);
    }

    request
}

/// Pull `choices[0].message.content` out of a response body, trimmed
pub fn parse_completion(body: &str) -> AppResult<String> {
    let response: ChatCompletionResponse = serde_json::from_str(body).map_err(|e| {
        tracing::error!("[Translator] Unparseable API response: {}", e);
        AppError::TranslationApi("Invalid API response format".to_string())
    })?;

    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .and_then(|message| message.content)
        .map(|content| content.trim().to_string())
        .ok_or_else(|| {
            tracing::error!("[Translator] API response has no message content");
            AppError::TranslationApi("Invalid API response format".to_string())
        })
}

/// HTTP client for chat completion endpoints
pub struct ChatCompletionClient {
    http: Client,
}

impl ChatCompletionClient {
    pub fn new() -> AppResult<Self> {
        let http = Client::builder()
            .user_agent("layer-translator/translator")
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AppError::Network(e.to_string()))?;

        Ok(Self { http })
    }
}

#[async_trait]
impl TranslationInvoker for ChatCompletionClient {
    async fn translate(&self, text: &str, config: &TranslationConfig) -> AppResult<String> {
        let request = build_request(text, config);
        tracing::debug!(
            provider = %config.provider,
            model = %config.model_name,
            endpoint = %config.api_endpoint,
            target = %config.target_language,
            "[Translator] Sending request"
        );

        let response = self
            .http
            .post(&config.api_endpoint)
            .bearer_auth(&config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("[Translator] Request failed: {}", e);
                if e.is_connect() || e.is_timeout() {
                    AppError::Network(format!(
                        "Failed to connect to {} API. Please check your network connection and API endpoint.",
                        config.provider
                    ))
                } else {
                    AppError::from(e)
                }
            })?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            tracing::error!("[Translator] API error response ({}): {}", status, body);
            return Err(AppError::TranslationApi(format!("Translation API error: {}", status)));
        }

        parse_completion(&body)
    }
}
