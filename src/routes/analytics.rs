// ABOUTME: The single analytics endpoint turning operator questions into answers
// ABOUTME: Request/response envelopes and per-request elapsed-time accounting
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Comanda

//! # Analytics Endpoint
//!
//! `POST /api/analytics/ask` takes the raw conversation and returns either a
//! prose answer with execution metadata or the standard error envelope. The
//! handler owns nothing but timing; all behavior lives in the pipeline.

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument};

use crate::analytics::RawMessage;
use crate::context::ServerResources;
use crate::errors::AppError;

/// Request body: the raw conversation as sent by the back-office UI
#[derive(Debug, Deserialize)]
pub struct AskRequest {
    /// Chat history, newest last; lenient entries, dropped when malformed
    #[serde(default)]
    pub messages: Vec<RawMessage>,
}

/// Execution metadata attached to every successful answer
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AskMeta {
    /// Wall-clock time spent on the whole request
    pub elapsed_ms: u64,
    /// Whether a database query backed the answer
    pub used_sql: bool,
    /// Rows behind the answer, query path only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_count: Option<usize>,
}

/// Successful response envelope
#[derive(Debug, Serialize, Deserialize)]
pub struct AskResponse {
    /// Operator-facing prose answer
    pub message: String,
    /// Execution metadata
    pub meta: AskMeta,
}

/// Route registration for the analytics endpoint
pub struct AnalyticsRoutes;

impl AnalyticsRoutes {
    /// Build the analytics router over the shared resources
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/analytics/ask", post(Self::ask))
            .with_state(resources)
    }

    #[instrument(skip_all)]
    async fn ask(
        State(resources): State<Arc<ServerResources>>,
        Json(request): Json<AskRequest>,
    ) -> Result<Json<AskResponse>, AppError> {
        let started = Instant::now();
        let answer = resources.pipeline.answer(&request.messages).await?;
        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        info!(
            elapsed_ms,
            used_sql = answer.used_sql,
            row_count = answer.row_count.unwrap_or(0),
            "pergunta respondida"
        );

        Ok(Json(AskResponse {
            message: answer.message,
            meta: AskMeta {
                elapsed_ms,
                used_sql: answer.used_sql,
                row_count: answer.row_count,
            },
        }))
    }
}
