// ABOUTME: Unified error handling system with standard error codes and HTTP responses
// ABOUTME: Maps pipeline failure classes to user-safe JSON envelopes without leaking driver internals
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Comanda

//! # Unified Error Handling System
//!
//! Central error type for the analytics pipeline. Every failure class from
//! the pipeline maps to an [`ErrorCode`], which decides the HTTP status:
//! input-shape problems and classified/validated SQL problems are client
//! errors (400), everything else is a server error (500).
//!
//! User-visible failures always carry a short non-technical `error` label and
//! a `details` string; classes with a known fix also carry a `hint`. Raw
//! driver messages are logged but never placed in `error`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Standard error codes used throughout the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // Input shape (1000-1999)
    #[serde(rename = "INVALID_INPUT")]
    InvalidInput = 1000,
    #[serde(rename = "EMPTY_CONVERSATION")]
    EmptyConversation = 1001,

    // Model output (2000-2999)
    #[serde(rename = "MODEL_OUTPUT_INVALID")]
    ModelOutputInvalid = 2000,

    // Query validation and execution (3000-3999)
    #[serde(rename = "QUERY_VALIDATION_FAILED")]
    QueryValidationFailed = 3000,
    #[serde(rename = "QUERY_REJECTED")]
    QueryRejected = 3001,
    #[serde(rename = "QUERY_EXECUTION_FAILED")]
    QueryExecutionFailed = 3002,
    #[serde(rename = "QUERY_RETRY_EXHAUSTED")]
    QueryRetryExhausted = 3003,

    // External services (5000-5999)
    #[serde(rename = "EXTERNAL_SERVICE_ERROR")]
    ExternalServiceError = 5000,
    #[serde(rename = "REQUEST_TIMEOUT")]
    RequestTimeout = 5001,

    // Configuration (6000-6999)
    #[serde(rename = "CONFIG_ERROR")]
    ConfigError = 6000,

    // Internal (9000-9999)
    #[serde(rename = "INTERNAL_ERROR")]
    InternalError = 9000,
    #[serde(rename = "DATABASE_ERROR")]
    DatabaseError = 9001,
}

impl ErrorCode {
    /// Get the HTTP status code for this error
    ///
    /// Input-shape problems and all classified/validated SQL problems are the
    /// caller's to fix (400); everything else is reported as a server fault.
    #[must_use]
    pub const fn http_status(self) -> u16 {
        match self {
            Self::InvalidInput
            | Self::EmptyConversation
            | Self::QueryValidationFailed
            | Self::QueryRejected
            | Self::QueryExecutionFailed
            | Self::QueryRetryExhausted => 400,

            Self::ModelOutputInvalid
            | Self::ExternalServiceError
            | Self::RequestTimeout
            | Self::ConfigError
            | Self::InternalError
            | Self::DatabaseError => 500,
        }
    }

    /// Short, non-technical label placed in the `error` field
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::InvalidInput => "A pergunta enviada é inválida",
            Self::EmptyConversation => "Nenhuma mensagem válida foi enviada",
            Self::ModelOutputInvalid => "O assistente não conseguiu interpretar a pergunta",
            Self::QueryValidationFailed => "A consulta gerada não passou na validação",
            Self::QueryRejected => "A consulta gerada não é permitida",
            Self::QueryExecutionFailed => "A consulta não pôde ser executada",
            Self::QueryRetryExhausted => "A consulta falhou mesmo após correção automática",
            Self::ExternalServiceError => "Um serviço externo está indisponível",
            Self::RequestTimeout => "A solicitação demorou demais para responder",
            Self::ConfigError => "Erro de configuração do servidor",
            Self::InternalError => "Erro interno do servidor",
            Self::DatabaseError => "Erro ao acessar o banco de dados",
        }
    }
}

/// Unified error type for the application
#[derive(Debug, Error)]
pub struct AppError {
    /// Error code
    pub code: ErrorCode,
    /// Diagnostic details, safe to return to the operator
    pub details: String,
    /// Remediation hint for classes with a known fix
    pub hint: Option<String>,
    /// Source error for chaining (logged, never serialized)
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new error with the given code and details
    pub fn new(code: ErrorCode, details: impl Into<String>) -> Self {
        Self {
            code,
            details: details.into(),
            hint: None,
            source: None,
        }
    }

    /// Attach a remediation hint
    #[must_use]
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    /// Attach a source error for chaining
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Get the HTTP status code for this error
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        self.code.http_status()
    }

    /// Malformed request body or conversation
    pub fn invalid_input(details: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, details)
    }

    /// Conversation empty after normalization, or not ending in a user turn
    pub fn empty_conversation(details: impl Into<String>) -> Self {
        Self::new(ErrorCode::EmptyConversation, details)
    }

    /// Analysis call returned text that could not be interpreted
    pub fn model_output(details: impl Into<String>) -> Self {
        Self::new(ErrorCode::ModelOutputInvalid, details)
    }

    /// Proposed query failed static validation
    pub fn query_validation(details: impl Into<String>) -> Self {
        Self::new(ErrorCode::QueryValidationFailed, details)
    }

    /// Proposed query rejected by the read-only guard
    pub fn query_rejected(details: impl Into<String>) -> Self {
        Self::new(ErrorCode::QueryRejected, details)
    }

    /// Classified execution failure (single retry also unavailable)
    pub fn query_execution(details: impl Into<String>) -> Self {
        Self::new(ErrorCode::QueryExecutionFailed, details)
    }

    /// Classified execution failure whose single permitted retry also failed
    pub fn retry_exhausted(details: impl Into<String>) -> Self {
        Self::new(ErrorCode::QueryRetryExhausted, details)
    }

    /// External collaborator failure (LLM API, network)
    pub fn external_service(service: impl Into<String>, details: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ExternalServiceError,
            format!("{}: {}", service.into(), details.into()),
        )
    }

    /// Model or database call exceeded its deadline
    pub fn timeout(details: impl Into<String>) -> Self {
        Self::new(ErrorCode::RequestTimeout, details)
    }

    /// Configuration error
    pub fn config(details: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigError, details)
    }

    /// Internal server error
    pub fn internal(details: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, details)
    }

    /// Unclassified database failure, reported generically
    pub fn database(details: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseError, details)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.label(), self.details)
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;

/// HTTP error response envelope: `{error, details, hint?}`
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Short, non-technical error label
    pub error: String,
    /// Diagnostic details
    pub details: String,
    /// Remediation hint, when a known fix exists
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl From<&AppError> for ErrorResponse {
    fn from(error: &AppError) -> Self {
        Self {
            error: error.code.label().to_owned(),
            details: error.details.clone(),
            hint: error.hint.clone(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = ErrorResponse::from(&self);
        if status.is_server_error() {
            tracing::error!(code = ?self.code, details = %self.details, "request failed");
        } else {
            tracing::warn!(code = ?self.code, details = %self.details, "request rejected");
        }
        (status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::internal(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_http_status() {
        assert_eq!(ErrorCode::InvalidInput.http_status(), 400);
        assert_eq!(ErrorCode::QueryValidationFailed.http_status(), 400);
        assert_eq!(ErrorCode::QueryRetryExhausted.http_status(), 400);
        assert_eq!(ErrorCode::ModelOutputInvalid.http_status(), 500);
        assert_eq!(ErrorCode::DatabaseError.http_status(), 500);
    }

    #[test]
    fn test_hint_serialized_only_when_present() {
        let without = AppError::query_execution("coluna desconhecida");
        let json = serde_json::to_string(&ErrorResponse::from(&without)).unwrap();
        assert!(!json.contains("hint"));

        let with = AppError::query_validation("função inexistente")
            .with_hint("use EXTRACT(YEAR FROM coluna)");
        let json = serde_json::to_string(&ErrorResponse::from(&with)).unwrap();
        assert!(json.contains("EXTRACT(YEAR FROM coluna)"));
    }

    #[test]
    fn test_display_includes_label_and_details() {
        let error = AppError::database("connection reset");
        let rendered = error.to_string();
        assert!(rendered.contains("banco de dados"));
        assert!(rendered.contains("connection reset"));
    }
}
