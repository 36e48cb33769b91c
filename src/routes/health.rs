// ABOUTME: Health probe reporting database and model-provider reachability
// ABOUTME: Cheap SELECT 1 plus the provider's own health check
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Comanda

//! `GET /api/health`: readiness probe for deployment checks.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::warn;

use crate::context::ServerResources;
use crate::llm::LlmProvider;

/// Route registration for the health probe
pub struct HealthRoutes;

impl HealthRoutes {
    /// Build the health router over the shared resources
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/health", get(Self::health))
            .with_state(resources)
    }

    async fn health(State(resources): State<Arc<ServerResources>>) -> Json<Value> {
        let database = sqlx::query("SELECT 1")
            .fetch_one(&resources.pool)
            .await
            .is_ok();
        let model = match resources.provider.health_check().await {
            Ok(healthy) => healthy,
            Err(error) => {
                warn!(%error, "health check do provedor falhou");
                false
            }
        };

        Json(json!({
            "status": if database && model { "ok" } else { "degraded" },
            "database": database,
            "model": model,
            "provider": resources.provider.name(),
        }))
    }
}
