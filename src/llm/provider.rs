// ABOUTME: Unified LLM provider selector for runtime provider switching
// ABOUTME: Abstracts over Groq and local OpenAI-compatible providers via environment configuration
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Comanda

//! # LLM Provider Selector
//!
//! Unified interface over the configured provider. Set the
//! `COMANDA_LLM_PROVIDER` environment variable:
//! - `groq` (default): Groq cloud inference (requires `GROQ_API_KEY`)
//! - `local`/`ollama`/`vllm`/`localai`: OpenAI-compatible local endpoint

use std::fmt;

use async_trait::async_trait;
use tracing::info;

use super::{ChatRequest, ChatResponse, GroqProvider, LlmProvider, OpenAiCompatibleProvider};
use crate::config::LlmProviderType;
use crate::errors::AppError;

/// Unified chat provider that wraps Groq or a local LLM
pub enum ChatProvider {
    /// Groq provider for fast, cost-effective inference
    Groq(GroqProvider),
    /// Local LLM provider via OpenAI-compatible API
    Local(OpenAiCompatibleProvider),
}

impl ChatProvider {
    /// Create a provider from environment configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the required API key environment variable is
    /// missing for the selected provider.
    pub fn from_env() -> Result<Self, AppError> {
        let provider_type = LlmProviderType::from_env();

        info!(
            "Initializing LLM provider: {} (set {} to change)",
            provider_type,
            LlmProviderType::ENV_VAR
        );

        match provider_type {
            LlmProviderType::Groq => Self::groq(),
            LlmProviderType::Local => Ok(Self::local()),
        }
    }

    /// Create a Groq provider explicitly
    ///
    /// # Errors
    ///
    /// Returns an error if `GROQ_API_KEY` is not set.
    pub fn groq() -> Result<Self, AppError> {
        Ok(Self::Groq(GroqProvider::from_env()?))
    }

    /// Create a local LLM provider explicitly
    #[must_use]
    pub fn local() -> Self {
        Self::Local(OpenAiCompatibleProvider::from_env())
    }
}

impl fmt::Debug for ChatProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Groq(_) => f.debug_tuple("ChatProvider::Groq").finish(),
            Self::Local(_) => f.debug_tuple("ChatProvider::Local").finish(),
        }
    }
}

#[async_trait]
impl LlmProvider for ChatProvider {
    fn name(&self) -> &'static str {
        match self {
            Self::Groq(p) => p.name(),
            Self::Local(p) => p.name(),
        }
    }

    fn display_name(&self) -> &'static str {
        match self {
            Self::Groq(p) => p.display_name(),
            Self::Local(p) => p.display_name(),
        }
    }

    fn default_model(&self) -> &str {
        match self {
            Self::Groq(p) => p.default_model(),
            Self::Local(p) => p.default_model(),
        }
    }

    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, AppError> {
        match self {
            Self::Groq(p) => p.complete(request).await,
            Self::Local(p) => p.complete(request).await,
        }
    }

    async fn health_check(&self) -> Result<bool, AppError> {
        match self {
            Self::Groq(p) => p.health_check().await,
            Self::Local(p) => p.health_check().await,
        }
    }
}
