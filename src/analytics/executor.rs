// ABOUTME: Execution retry orchestrator with classified failures and a single bounded retry
// ABOUTME: Executor and classifier are strategy traits so the policy is testable without a database
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Comanda

//! # Execution Retry Orchestrator
//!
//! Runs a guarded query and, when it fails, consults a [`FailureClassifier`]
//! for a corrective action. At most one retry happens per request: a retried
//! failure is exhaustion, never a second correction. Identifier-quoting
//! corrections rewrite the text that just failed; date-function corrections
//! re-derive from the model's original text so the rewrite sees the
//! uncorrected function call. Every candidate passes the read-only gate
//! before touching the database.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::{corrections, guard, validator};
use crate::errors::{AppError, AppResult};

/// One result row as a column-name-to-JSON-value map, insertion-ordered
pub type RowMap = serde_json::Map<String, Value>;

/// Driver-level failure, reduced to what classification needs
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct DriverError {
    /// Engine error code (SQLSTATE for PostgreSQL), when the driver has one
    pub code: Option<String>,
    /// Raw driver message; logged, never returned to the operator
    pub message: String,
}

/// Executes one read-only statement against the analytics store
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Run the statement and decode every row into a [`RowMap`]
    async fn execute(&self, sql: &str) -> Result<Vec<RowMap>, DriverError>;
}

/// Corrective action derived from a classified execution failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorrectiveAction {
    /// Undefined column: re-quote known CamelCase identifiers and retry
    QuoteIdentifiers,
    /// Undefined date function: re-apply the dialect rewrite table and retry
    RewriteDateFunction,
    /// Undefined function outside the date table: fail without retry
    UnknownFunction,
}

/// Maps a driver failure to a corrective action, engine-specific
pub trait FailureClassifier: Send + Sync {
    /// Classify the failure; `None` means unclassified
    fn classify(&self, error: &DriverError) -> Option<CorrectiveAction>;
}

/// Classifier for PostgreSQL SQLSTATE codes and message shapes
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresFailureClassifier;

impl PostgresFailureClassifier {
    fn failed_function_name(message: &str) -> Option<String> {
        // "function year(timestamp) does not exist"
        let rest = message.split("function ").nth(1)?;
        let name: String = rest
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric() || *c == '_')
            .collect();
        (!name.is_empty()).then_some(name)
    }
}

impl FailureClassifier for PostgresFailureClassifier {
    fn classify(&self, error: &DriverError) -> Option<CorrectiveAction> {
        let code = error.code.as_deref();
        let message = error.message.to_lowercase();

        if code == Some("42703")
            || (message.contains("column") && message.contains("does not exist"))
        {
            return Some(CorrectiveAction::QuoteIdentifiers);
        }

        if code == Some("42883")
            || (message.contains("function") && message.contains("does not exist"))
        {
            return Some(match Self::failed_function_name(&message) {
                Some(name) if corrections::is_date_function(&name) => {
                    CorrectiveAction::RewriteDateFunction
                }
                _ => CorrectiveAction::UnknownFunction,
            });
        }

        None
    }
}

/// Successful execution, including what actually ran
#[derive(Debug, Clone)]
pub struct ExecutionSuccess {
    /// Decoded result rows
    pub rows: Vec<RowMap>,
    /// The statement that produced the rows, post-guard, post-correction
    pub executed_sql: String,
    /// Attempts spent (1 or 2)
    pub attempts: u32,
}

/// Runs queries with classified-failure retry, at most one retry per request
pub struct RetryOrchestrator {
    executor: Arc<dyn QueryExecutor>,
    classifier: Arc<dyn FailureClassifier>,
    query_timeout: Duration,
}

impl RetryOrchestrator {
    /// Build an orchestrator over the given executor and classifier
    #[must_use]
    pub fn new(
        executor: Arc<dyn QueryExecutor>,
        classifier: Arc<dyn FailureClassifier>,
        query_timeout: Duration,
    ) -> Self {
        Self {
            executor,
            classifier,
            query_timeout,
        }
    }

    async fn attempt(&self, sql: &str) -> AppResult<Result<Vec<RowMap>, DriverError>> {
        debug!(sql_len = sql.len(), "executando consulta");
        tokio::time::timeout(self.query_timeout, self.executor.execute(sql))
            .await
            .map_err(|_| {
                AppError::timeout(format!(
                    "a consulta excedeu o limite de {}s",
                    self.query_timeout.as_secs()
                ))
            })
    }

    /// Execute with bounded retry
    ///
    /// `original_sql` is the model's text before any correction; `preferred_sql`
    /// is the validator's preferred candidate. Date-function retries re-derive
    /// from `original_sql`, quoting retries rewrite the text that failed.
    ///
    /// # Errors
    ///
    /// Propagates guard rejections, timeouts, classified failures whose retry
    /// also failed (exhaustion), unknown-function failures (no retry), and
    /// unclassified database failures.
    pub async fn run(&self, original_sql: &str, preferred_sql: &str) -> AppResult<ExecutionSuccess> {
        let guarded = guard::enforce_read_only(preferred_sql)?;

        let first_failure = match self.attempt(&guarded).await? {
            Ok(rows) => {
                info!(rows = rows.len(), "consulta executada na primeira tentativa");
                return Ok(ExecutionSuccess {
                    rows,
                    executed_sql: guarded,
                    attempts: 1,
                });
            }
            Err(failure) => failure,
        };

        let action = self.classifier.classify(&first_failure);
        warn!(
            code = first_failure.code.as_deref().unwrap_or("-"),
            message = %first_failure.message,
            action = ?action,
            "falha na execução da consulta"
        );

        let retry_sql = match action {
            Some(CorrectiveAction::QuoteIdentifiers) => {
                let (rewritten, touched) = validator::quote_known_tables(&guarded);
                if touched.is_empty() {
                    return Err(AppError::query_execution(
                        "coluna ou tabela inexistente na consulta gerada",
                    )
                    .with_hint(
                        "nomes em CamelCase precisam de aspas duplas no PostgreSQL",
                    )
                    .with_source(first_failure));
                }
                rewritten
            }
            Some(CorrectiveAction::RewriteDateFunction) => {
                let (rewritten, fired) = corrections::apply_all(original_sql);
                if fired.is_empty() {
                    return Err(AppError::query_execution(
                        "função de data incompatível sem reescrita conhecida",
                    )
                    .with_source(first_failure));
                }
                guard::enforce_read_only(&rewritten)?
            }
            Some(CorrectiveAction::UnknownFunction) => {
                return Err(AppError::query_execution(
                    "a consulta usa uma função que não existe no banco de dados",
                )
                .with_hint("reformule a pergunta; a função usada não tem correção automática")
                .with_source(first_failure));
            }
            None => {
                return Err(AppError::database(
                    "a consulta falhou por um motivo não classificado",
                )
                .with_source(first_failure));
            }
        };

        info!("repetindo consulta após correção automática");
        match self.attempt(&retry_sql).await? {
            Ok(rows) => {
                info!(rows = rows.len(), "consulta executada após correção");
                Ok(ExecutionSuccess {
                    rows,
                    executed_sql: retry_sql,
                    attempts: 2,
                })
            }
            Err(second_failure) => {
                warn!(
                    code = second_failure.code.as_deref().unwrap_or("-"),
                    message = %second_failure.message,
                    "consulta falhou também após a correção"
                );
                Err(AppError::retry_exhausted(
                    "a consulta corrigida automaticamente também falhou",
                )
                .with_source(second_failure))
            }
        }
    }
}
