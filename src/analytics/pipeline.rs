// ABOUTME: Sequential per-request orchestration of the analytics pipeline
// ABOUTME: Normalize, analyze, validate, execute with retry, format, narrate
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Comanda

//! # Analytics Pipeline Orchestration
//!
//! One [`AnalyticsPipeline::answer`] call per HTTP request, strictly
//! sequential, nothing cached between requests. The analysis call decides
//! between a direct answer and a database query; a query flows through static
//! validation, the read-only gate, bounded-retry execution, formatting, and a
//! final narration call that only ever sees the formatted preview.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use super::action::{parse_action, ActionDecision};
use super::conversation::{normalize_conversation, RawMessage};
use super::executor::{FailureClassifier, QueryExecutor, RetryOrchestrator};
use super::{formatter, validator};
use crate::catalog::CATALOG;
use crate::errors::{AppError, AppResult};
use crate::llm::{prompts, ChatMessage, ChatRequest, ChatResponse, LlmProvider};

const NARRATION_SYSTEM: &str =
    "Você é o assistente do restaurante. Responda em português, de forma curta e cordial.";

/// Build the rejection error for a query with no usable correction
///
/// Errors and warnings both land in `details`; the suggested rewrite, when
/// one exists, travels as the `hint`.
fn validation_failure(report: validator::ValidationReport) -> AppError {
    let mut details = report.errors.join("; ");
    for warning in &report.warnings {
        if !details.is_empty() {
            details.push_str("; ");
        }
        details.push_str(warning);
    }
    let mut error = AppError::query_validation(details);
    if let Some(corrected) = report.corrected_sql {
        error = error.with_hint(format!("consulta sugerida: {corrected}"));
    }
    error
}

/// Final pipeline output for one request
#[derive(Debug, Clone)]
pub struct AnalyticsAnswer {
    /// Operator-facing prose answer
    pub message: String,
    /// Whether a database query was executed
    pub used_sql: bool,
    /// Rows behind the answer, query path only
    pub row_count: Option<usize>,
}

/// Per-request pipeline over a provider, an executor, and a classifier
pub struct AnalyticsPipeline {
    provider: Arc<dyn LlmProvider>,
    orchestrator: RetryOrchestrator,
    model_timeout: Duration,
}

impl AnalyticsPipeline {
    /// Assemble the pipeline from its collaborators
    #[must_use]
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        executor: Arc<dyn QueryExecutor>,
        classifier: Arc<dyn FailureClassifier>,
        model_timeout: Duration,
        query_timeout: Duration,
    ) -> Self {
        Self {
            provider,
            orchestrator: RetryOrchestrator::new(executor, classifier, query_timeout),
            model_timeout,
        }
    }

    async fn complete_with_deadline(
        &self,
        request: &ChatRequest,
        call: &str,
    ) -> AppResult<ChatResponse> {
        tokio::time::timeout(self.model_timeout, self.provider.complete(request))
            .await
            .map_err(|_| {
                AppError::timeout(format!(
                    "a chamada de {call} excedeu o limite de {}s",
                    self.model_timeout.as_secs()
                ))
            })?
    }

    /// Answer one operator conversation
    ///
    /// # Errors
    ///
    /// Propagates every pipeline failure class: input shape, model output,
    /// validation, guard rejection, execution, and timeouts.
    #[instrument(skip_all, fields(provider = self.provider.name()))]
    pub async fn answer(&self, raw: &[RawMessage]) -> AppResult<AnalyticsAnswer> {
        let history = normalize_conversation(raw)?;
        let question = history
            .last()
            .map(|m| m.content.clone())
            .unwrap_or_default();

        let mut messages = vec![ChatMessage::system(prompts::analysis_prompt(&CATALOG))];
        messages.extend(history);
        let request = ChatRequest::new(messages).with_temperature(0.1);
        let analysis = self.complete_with_deadline(&request, "análise").await?;

        let (sql, reason) = match parse_action(&analysis.content)? {
            ActionDecision::Respond { message } => {
                debug!("resposta direta, sem consulta");
                return Ok(AnalyticsAnswer {
                    message,
                    used_sql: false,
                    row_count: None,
                });
            }
            ActionDecision::Query { sql, reason } => (sql, reason),
        };
        debug!(reason = reason.as_deref().unwrap_or("-"), "consulta proposta");

        let report = validator::validate(&sql);
        for warning in &report.warnings {
            warn!(detail = %warning, "achado de validação");
        }
        let preferred = report.preferred_sql(&sql).to_owned();
        if !report.is_valid && !validator::validate(&preferred).is_valid {
            return Err(validation_failure(report));
        }

        let success = self.orchestrator.run(&sql, &preferred).await?;
        let formatted = formatter::format_rows(success.rows, &success.executed_sql);
        let row_count = formatted.rows.len();

        let narration = ChatRequest::new(vec![
            ChatMessage::system(NARRATION_SYSTEM),
            ChatMessage::user(prompts::narration_prompt(&question, &formatted.preview)),
        ])
        .with_temperature(0.4);
        let narrated = self.complete_with_deadline(&narration, "narração").await?;

        Ok(AnalyticsAnswer {
            message: narrated.content.trim().to_owned(),
            used_sql: true,
            row_count: Some(row_count),
        })
    }
}
