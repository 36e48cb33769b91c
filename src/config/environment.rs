// ABOUTME: Environment configuration management for deployment-specific settings
// ABOUTME: Handles environment variables, runtime defaults, and per-request deadlines
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Comanda

//! Environment-based configuration management for production deployment

use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;

/// Default HTTP port when `COMANDA_HTTP_PORT` is unset
const DEFAULT_HTTP_PORT: u16 = 8081;

/// Default wall-clock budget for each language-model call, in seconds
const DEFAULT_MODEL_TIMEOUT_SECS: u64 = 30;

/// Default wall-clock budget for each database execution attempt, in seconds
const DEFAULT_QUERY_TIMEOUT_SECS: u64 = 10;

/// Which LLM provider backs the analysis and narration calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProviderType {
    /// Groq cloud inference (requires `GROQ_API_KEY`)
    #[default]
    Groq,
    /// Any OpenAI-compatible local endpoint (Ollama, vLLM, `LocalAI`)
    Local,
}

impl LlmProviderType {
    /// Environment variable that selects the provider
    pub const ENV_VAR: &'static str = "COMANDA_LLM_PROVIDER";

    /// Read the provider selection from the environment
    #[must_use]
    pub fn from_env() -> Self {
        match env::var(Self::ENV_VAR).as_deref() {
            Ok("local" | "ollama" | "vllm" | "localai") => Self::Local,
            _ => Self::Groq,
        }
    }
}

impl fmt::Display for LlmProviderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Groq => write!(f, "groq"),
            Self::Local => write!(f, "local"),
        }
    }
}

/// Server configuration loaded from the environment
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP port the axum server binds to
    pub http_port: u16,
    /// PostgreSQL connection string
    pub database_url: String,
    /// Which provider backs the two model calls
    pub llm_provider: LlmProviderType,
    /// Deadline applied to each model call
    pub model_timeout_secs: u64,
    /// Deadline applied to each query execution attempt
    pub query_timeout_secs: u64,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// `DATABASE_URL` is required; everything else has production defaults.
    ///
    /// # Errors
    ///
    /// Returns a config error if `DATABASE_URL` is unset or a numeric
    /// variable fails to parse.
    pub fn from_env() -> AppResult<Self> {
        let http_port = match env::var("COMANDA_HTTP_PORT") {
            Ok(value) => value.parse::<u16>().map_err(|e| {
                AppError::config(format!("COMANDA_HTTP_PORT is not a valid port: {e}"))
            })?,
            Err(_) => DEFAULT_HTTP_PORT,
        };

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| AppError::config("DATABASE_URL environment variable is required"))?;

        let model_timeout_secs = parse_secs("COMANDA_MODEL_TIMEOUT_SECS", DEFAULT_MODEL_TIMEOUT_SECS)?;
        let query_timeout_secs = parse_secs("COMANDA_QUERY_TIMEOUT_SECS", DEFAULT_QUERY_TIMEOUT_SECS)?;

        Ok(Self {
            http_port,
            database_url,
            llm_provider: LlmProviderType::from_env(),
            model_timeout_secs,
            query_timeout_secs,
        })
    }

    /// One-line summary for startup logging, without secrets
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "port={} provider={} model_timeout={}s query_timeout={}s",
            self.http_port, self.llm_provider, self.model_timeout_secs, self.query_timeout_secs
        )
    }
}

fn parse_secs(var: &str, default: u64) -> AppResult<u64> {
    match env::var(var) {
        Ok(value) => value
            .parse::<u64>()
            .map_err(|e| AppError::config(format!("{var} is not a valid duration: {e}"))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use serial_test::serial;

    fn clear_env() {
        for var in [
            "COMANDA_HTTP_PORT",
            "DATABASE_URL",
            "COMANDA_LLM_PROVIDER",
            "COMANDA_MODEL_TIMEOUT_SECS",
            "COMANDA_QUERY_TIMEOUT_SECS",
        ] {
            env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn test_requires_database_url() {
        clear_env();
        assert!(ServerConfig::from_env().is_err());
    }

    #[test]
    #[serial]
    fn test_defaults_applied() {
        clear_env();
        env::set_var("DATABASE_URL", "postgres://localhost/comanda");
        let config = ServerConfig::from_env().unwrap();
        assert_eq!(config.http_port, DEFAULT_HTTP_PORT);
        assert_eq!(config.llm_provider, LlmProviderType::Groq);
        assert_eq!(config.model_timeout_secs, DEFAULT_MODEL_TIMEOUT_SECS);
        assert_eq!(config.query_timeout_secs, DEFAULT_QUERY_TIMEOUT_SECS);
        clear_env();
    }

    #[test]
    #[serial]
    fn test_local_provider_aliases() {
        clear_env();
        env::set_var("DATABASE_URL", "postgres://localhost/comanda");
        env::set_var("COMANDA_LLM_PROVIDER", "ollama");
        let config = ServerConfig::from_env().unwrap();
        assert_eq!(config.llm_provider, LlmProviderType::Local);
        clear_env();
    }

    #[test]
    #[serial]
    fn test_invalid_port_rejected() {
        clear_env();
        env::set_var("DATABASE_URL", "postgres://localhost/comanda");
        env::set_var("COMANDA_HTTP_PORT", "not-a-port");
        assert!(ServerConfig::from_env().is_err());
        clear_env();
    }
}
