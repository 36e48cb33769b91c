// ABOUTME: Groq LLM provider implementation over the OpenAI-compatible API
// ABOUTME: Backs the analysis and narration calls with Llama models on Groq's LPU inference
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Comanda

//! # Groq Provider
//!
//! Implementation of the [`LlmProvider`] trait for Groq's LPU-accelerated
//! inference. Set the `GROQ_API_KEY` environment variable with a key from
//! <https://console.groq.com/keys>.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument, warn};

use super::{ChatMessage, ChatRequest, ChatResponse, LlmProvider, TokenUsage};
use crate::errors::AppError;

/// Environment variable for Groq API key
const GROQ_API_KEY_ENV: &str = "GROQ_API_KEY";

/// Default model to use
const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";

/// Base URL for the Groq API (OpenAI-compatible)
const API_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Groq API request structure (OpenAI-compatible)
#[derive(Debug, Serialize)]
struct GroqRequest {
    model: String,
    messages: Vec<GroqMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

/// Message structure for the Groq API
#[derive(Debug, Clone, Serialize, Deserialize)]
struct GroqMessage {
    role: String,
    content: String,
}

impl From<&ChatMessage> for GroqMessage {
    fn from(msg: &ChatMessage) -> Self {
        Self {
            role: msg.role.as_str().to_owned(),
            content: msg.content.clone(),
        }
    }
}

/// Groq API response structure
#[derive(Debug, Deserialize)]
struct GroqResponse {
    choices: Vec<GroqChoice>,
    #[serde(default)]
    usage: Option<GroqUsage>,
    model: String,
}

#[derive(Debug, Deserialize)]
struct GroqChoice {
    message: GroqResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GroqResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GroqUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

/// Groq API error response
#[derive(Debug, Deserialize)]
struct GroqErrorResponse {
    error: GroqErrorDetail,
}

#[derive(Debug, Deserialize)]
struct GroqErrorDetail {
    message: String,
    #[serde(rename = "type")]
    error_type: Option<String>,
}

/// Groq LLM provider using LPU-accelerated inference
pub struct GroqProvider {
    client: Client,
    api_key: String,
}

impl GroqProvider {
    /// Create a new Groq provider with the given API key
    #[must_use]
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
        }
    }

    /// Create a Groq provider from the environment
    ///
    /// # Errors
    ///
    /// Returns an error if `GROQ_API_KEY` is not set.
    pub fn from_env() -> Result<Self, AppError> {
        let api_key = std::env::var(GROQ_API_KEY_ENV).map_err(|_| {
            AppError::config(format!(
                "Missing {GROQ_API_KEY_ENV} environment variable. Get your API key from https://console.groq.com/keys"
            ))
        })?;

        Ok(Self::new(api_key))
    }

    fn api_url(endpoint: &str) -> String {
        format!("{API_BASE_URL}/{endpoint}")
    }

    fn convert_messages(messages: &[ChatMessage]) -> Vec<GroqMessage> {
        messages.iter().map(GroqMessage::from).collect()
    }

    /// Parse error response from the Groq API
    fn parse_error_response(status: reqwest::StatusCode, body: &str) -> AppError {
        if let Ok(error_response) = serde_json::from_str::<GroqErrorResponse>(body) {
            let error_type = error_response
                .error
                .error_type
                .unwrap_or_else(|| "unknown".to_owned());

            AppError::external_service(
                "Groq",
                format!(
                    "{} ({}): {}",
                    error_type, status, error_response.error.message
                ),
            )
        } else {
            AppError::external_service(
                "Groq",
                format!(
                    "API error ({}): {}",
                    status,
                    body.chars().take(200).collect::<String>()
                ),
            )
        }
    }
}

#[async_trait]
impl LlmProvider for GroqProvider {
    fn name(&self) -> &'static str {
        "groq"
    }

    fn display_name(&self) -> &'static str {
        "Groq (Llama)"
    }

    fn default_model(&self) -> &str {
        DEFAULT_MODEL
    }

    #[instrument(skip(self, request), fields(model = %request.model.as_deref().unwrap_or(DEFAULT_MODEL)))]
    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, AppError> {
        let model = request.model.as_deref().unwrap_or(DEFAULT_MODEL);

        debug!("Sending chat completion request to Groq");

        let groq_request = GroqRequest {
            model: model.to_owned(),
            messages: Self::convert_messages(&request.messages),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let response = self
            .client
            .post(Self::api_url("chat/completions"))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&groq_request)
            .send()
            .await
            .map_err(|e| {
                error!("Failed to send request to Groq API: {}", e);
                AppError::external_service("Groq", format!("Failed to connect: {e}"))
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            error!("Failed to read Groq API response: {}", e);
            AppError::external_service("Groq", format!("Failed to read response: {e}"))
        })?;

        if !status.is_success() {
            return Err(Self::parse_error_response(status, &body));
        }

        let groq_response: GroqResponse = serde_json::from_str(&body).map_err(|e| {
            error!("Failed to parse Groq API response: {}", e);
            AppError::external_service("Groq", format!("Failed to parse response: {e}"))
        })?;

        let choice = groq_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AppError::external_service("Groq", "API returned no choices"))?;

        let content = choice.message.content.unwrap_or_default();

        debug!(
            "Received response from Groq: {} chars, finish_reason: {:?}",
            content.len(),
            choice.finish_reason
        );

        Ok(ChatResponse {
            content,
            model: groq_response.model,
            usage: groq_response.usage.map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            }),
            finish_reason: choice.finish_reason,
        })
    }

    #[instrument(skip(self))]
    async fn health_check(&self) -> Result<bool, AppError> {
        let response = self
            .client
            .get(Self::api_url("models"))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await
            .map_err(|e| {
                error!("Groq health check failed: {}", e);
                AppError::external_service("Groq", format!("Health check failed: {e}"))
            })?;

        let healthy = response.status().is_success();
        if !healthy {
            warn!(
                "Groq API health check failed with status: {}",
                response.status()
            );
        }

        Ok(healthy)
    }
}
