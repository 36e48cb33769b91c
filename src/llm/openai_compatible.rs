// ABOUTME: Provider for any OpenAI-compatible local endpoint (Ollama, vLLM, LocalAI)
// ABOUTME: Lets the analytics pipeline run fully on-box without a cloud API key
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Comanda

//! # OpenAI-Compatible Provider
//!
//! Generic [`LlmProvider`] for servers speaking the OpenAI chat-completions
//! wire format. Used for local deployments where the back-office must not
//! send operator conversations off-box.
//!
//! ## Configuration
//!
//! - `LOCAL_LLM_BASE_URL`: endpoint (default: Ollama at `localhost:11434`)
//! - `LOCAL_LLM_MODEL`: model name (default: `qwen2.5:14b-instruct`)
//! - `LOCAL_LLM_API_KEY`: optional bearer token

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

use super::{ChatMessage, ChatRequest, ChatResponse, LlmProvider, TokenUsage};
use crate::errors::AppError;

/// Default base URL (Ollama's OpenAI-compatible endpoint)
const DEFAULT_BASE_URL: &str = "http://localhost:11434/v1";

/// Default model
const DEFAULT_MODEL: &str = "qwen2.5:14b-instruct";

/// Configuration for an OpenAI-compatible provider
#[derive(Debug, Clone)]
pub struct OpenAiCompatibleConfig {
    /// API base URL, without trailing slash
    pub base_url: String,
    /// Optional bearer token
    pub api_key: Option<String>,
    /// Default model name
    pub default_model: String,
}

impl Default for OpenAiCompatibleConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            api_key: None,
            default_model: DEFAULT_MODEL.to_owned(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ApiRequest {
    model: String,
    messages: Vec<ApiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    choices: Vec<ApiChoice>,
    #[serde(default)]
    usage: Option<ApiUsage>,
    #[serde(default)]
    model: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

/// Provider for OpenAI-compatible chat endpoints
pub struct OpenAiCompatibleProvider {
    client: Client,
    config: OpenAiCompatibleConfig,
}

impl OpenAiCompatibleProvider {
    /// Create a provider from an explicit configuration
    #[must_use]
    pub fn new(config: OpenAiCompatibleConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// Create a provider from `LOCAL_LLM_*` environment variables
    #[must_use]
    pub fn from_env() -> Self {
        let config = OpenAiCompatibleConfig {
            base_url: std::env::var("LOCAL_LLM_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_owned()),
            api_key: std::env::var("LOCAL_LLM_API_KEY").ok(),
            default_model: std::env::var("LOCAL_LLM_MODEL")
                .unwrap_or_else(|_| DEFAULT_MODEL.to_owned()),
        };
        Self::new(config)
    }

    fn api_url(&self, endpoint: &str) -> String {
        format!("{}/{endpoint}", self.config.base_url.trim_end_matches('/'))
    }

    fn request_builder(&self, url: String) -> reqwest::RequestBuilder {
        let mut builder = self.client.post(url).header("Content-Type", "application/json");
        if let Some(key) = &self.config.api_key {
            builder = builder.header("Authorization", format!("Bearer {key}"));
        }
        builder
    }
}

#[async_trait]
impl LlmProvider for OpenAiCompatibleProvider {
    fn name(&self) -> &'static str {
        "local"
    }

    fn display_name(&self) -> &'static str {
        "Local LLM (OpenAI-compatible)"
    }

    fn default_model(&self) -> &str {
        &self.config.default_model
    }

    #[instrument(skip(self, request), fields(model = %request.model.as_deref().unwrap_or(&self.config.default_model)))]
    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, AppError> {
        let model = request
            .model
            .as_deref()
            .unwrap_or(&self.config.default_model);

        debug!("Sending chat completion request to local endpoint");

        let api_request = ApiRequest {
            model: model.to_owned(),
            messages: request
                .messages
                .iter()
                .map(|m| ApiMessage {
                    role: m.role.as_str().to_owned(),
                    content: m.content.clone(),
                })
                .collect(),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let response = self
            .request_builder(self.api_url("chat/completions"))
            .json(&api_request)
            .send()
            .await
            .map_err(|e| {
                error!("Failed to reach local LLM endpoint: {}", e);
                AppError::external_service("Local LLM", format!("Failed to connect: {e}"))
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            AppError::external_service("Local LLM", format!("Failed to read response: {e}"))
        })?;

        if !status.is_success() {
            return Err(AppError::external_service(
                "Local LLM",
                format!(
                    "API error ({}): {}",
                    status,
                    body.chars().take(200).collect::<String>()
                ),
            ));
        }

        let api_response: ApiResponse = serde_json::from_str(&body).map_err(|e| {
            AppError::external_service("Local LLM", format!("Failed to parse response: {e}"))
        })?;

        let choice = api_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AppError::external_service("Local LLM", "API returned no choices"))?;

        Ok(ChatResponse {
            content: choice.message.content.unwrap_or_default(),
            model: api_response.model.unwrap_or_else(|| model.to_owned()),
            usage: api_response.usage.map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            }),
            finish_reason: choice.finish_reason,
        })
    }

    #[instrument(skip(self))]
    async fn health_check(&self) -> Result<bool, AppError> {
        let mut builder = self.client.get(self.api_url("models"));
        if let Some(key) = &self.config.api_key {
            builder = builder.header("Authorization", format!("Bearer {key}"));
        }

        let response = builder.send().await.map_err(|e| {
            AppError::external_service("Local LLM", format!("Health check failed: {e}"))
        })?;

        Ok(response.status().is_success())
    }
}
