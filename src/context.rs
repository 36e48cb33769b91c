// ABOUTME: Shared server state handed to every route handler
// ABOUTME: Owns the config, the pool, the provider, and the assembled pipeline
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Comanda

//! Shared server resources, created once at startup and cloned behind an
//! `Arc` into each route struct.

use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;

use crate::analytics::{AnalyticsPipeline, PostgresFailureClassifier};
use crate::config::ServerConfig;
use crate::database::PgQueryExecutor;
use crate::llm::{ChatProvider, LlmProvider};

/// Everything a handler needs, wired once at startup
pub struct ServerResources {
    /// Loaded environment configuration
    pub config: ServerConfig,
    /// Database pool, shared with the pipeline's executor
    pub pool: PgPool,
    /// Selected LLM provider
    pub provider: Arc<ChatProvider>,
    /// The assembled analytics pipeline
    pub pipeline: AnalyticsPipeline,
}

impl ServerResources {
    /// Assemble the pipeline and bundle the shared state
    #[must_use]
    pub fn new(config: ServerConfig, pool: PgPool, provider: Arc<ChatProvider>) -> Self {
        let pipeline = AnalyticsPipeline::new(
            Arc::clone(&provider) as Arc<dyn LlmProvider>,
            Arc::new(PgQueryExecutor::new(pool.clone())),
            Arc::new(PostgresFailureClassifier),
            Duration::from_secs(config.model_timeout_secs),
            Duration::from_secs(config.query_timeout_secs),
        );
        Self {
            config,
            pool,
            provider,
            pipeline,
        }
    }
}
