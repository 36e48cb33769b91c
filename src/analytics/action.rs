// ABOUTME: Action resolver turning raw analysis-call output into a typed decision
// ABOUTME: Strict acceptor: exactly two shapes are valid, everything else fails closed
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Comanda

//! # Action Resolver
//!
//! Parses the analysis call's raw text into an [`ActionDecision`]. The parser
//! is a strict acceptor, not a best-effort extractor: a leading/trailing code
//! fence is stripped, the remainder must be a single JSON object in one of
//! the two accepted shapes, and anything else is a hard model-output error
//! carrying the underlying parse failure for diagnostics.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{AppError, AppResult};

/// The model's decision for one analysis call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum ActionDecision {
    /// Terminal direct answer, no database access
    Respond {
        /// Prose answer returned to the operator
        message: String,
    },
    /// Proposed read-only query, not yet trusted
    Query {
        /// Raw proposed SQL text
        sql: String,
        /// Stated reason for needing the query
        reason: Option<String>,
    },
}

/// Strip a Markdown code-fence wrapper, if present
///
/// Handles both multi-line fences and a fence squeezed onto one line.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_suffix("```").unwrap_or(rest).trim();
    // Drop the "json" info string; the body itself always starts with '{'
    rest.strip_prefix("json").map_or(rest, str::trim_start)
}

fn required_string(object: &serde_json::Map<String, Value>, field: &str) -> AppResult<String> {
    match object.get(field) {
        Some(Value::String(value)) => Ok(value.clone()),
        Some(_) => Err(AppError::model_output(format!(
            "campo '{field}' presente mas não é texto"
        ))),
        None => Err(AppError::model_output(format!(
            "campo obrigatório '{field}' ausente na resposta do modelo"
        ))),
    }
}

/// Parse the analysis call's raw output into a decision
///
/// # Errors
///
/// Returns a model-output error naming the parse failure when the text is
/// not a single JSON object in one of the two accepted shapes.
pub fn parse_action(raw: &str) -> AppResult<ActionDecision> {
    let body = strip_code_fence(raw);

    let value: Value = serde_json::from_str(body).map_err(|e| {
        AppError::model_output(format!("a resposta do modelo não é JSON válido: {e}"))
    })?;

    let Value::Object(object) = value else {
        return Err(AppError::model_output(
            "a resposta do modelo não é um objeto JSON",
        ));
    };

    match object.get("action").and_then(Value::as_str) {
        Some("respond") => Ok(ActionDecision::Respond {
            message: required_string(&object, "message")?,
        }),
        Some("query") => {
            let sql = required_string(&object, "sql")?;
            let reason = match object.get("reason") {
                Some(Value::String(reason)) => Some(reason.clone()),
                None | Some(Value::Null) => None,
                Some(_) => {
                    return Err(AppError::model_output(
                        "campo 'reason' presente mas não é texto",
                    ))
                }
            };
            Ok(ActionDecision::Query { sql, reason })
        }
        Some(other) => Err(AppError::model_output(format!(
            "ação desconhecida na resposta do modelo: '{other}'"
        ))),
        None => Err(AppError::model_output(
            "campo 'action' ausente na resposta do modelo",
        )),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_parses_respond_shape() {
        let decision = parse_action(r#"{"action": "respond", "message": "Olá!"}"#).unwrap();
        assert_eq!(
            decision,
            ActionDecision::Respond {
                message: "Olá!".to_owned()
            }
        );
    }

    #[test]
    fn test_parses_query_shape_with_optional_reason() {
        let decision =
            parse_action(r#"{"action": "query", "sql": "SELECT 1", "reason": "contar"}"#).unwrap();
        assert_eq!(
            decision,
            ActionDecision::Query {
                sql: "SELECT 1".to_owned(),
                reason: Some("contar".to_owned())
            }
        );

        let decision = parse_action(r#"{"action": "query", "sql": "SELECT 1"}"#).unwrap();
        assert!(matches!(decision, ActionDecision::Query { reason: None, .. }));
    }

    #[test]
    fn test_strips_code_fence() {
        let fenced = "```json\n{\"action\": \"respond\", \"message\": \"ok\"}\n```";
        assert!(parse_action(fenced).is_ok());

        let bare_fence = "```\n{\"action\": \"respond\", \"message\": \"ok\"}\n```";
        assert!(parse_action(bare_fence).is_ok());
    }

    #[test]
    fn test_strips_single_line_code_fence() {
        let squeezed = "```json{\"action\": \"respond\", \"message\": \"ok\"}```";
        assert!(parse_action(squeezed).is_ok());

        let squeezed_bare = "```{\"action\": \"respond\", \"message\": \"ok\"}```";
        assert!(parse_action(squeezed_bare).is_ok());

        let unterminated = "```json\n{\"action\": \"respond\", \"message\": \"ok\"}";
        assert!(parse_action(unterminated).is_ok());
    }

    #[test]
    fn test_rejects_unknown_action() {
        let error = parse_action(r#"{"action": "delete", "sql": "DROP TABLE x"}"#).unwrap_err();
        assert!(error.details.contains("delete"));
    }

    #[test]
    fn test_rejects_missing_fields_and_wrong_types() {
        assert!(parse_action(r#"{"action": "respond"}"#).is_err());
        assert!(parse_action(r#"{"action": "query", "sql": 42}"#).is_err());
        assert!(parse_action(r#"{"action": "query", "sql": "SELECT 1", "reason": 7}"#).is_err());
    }

    #[test]
    fn test_rejects_non_object_and_trailing_garbage() {
        assert!(parse_action("\"apenas texto\"").is_err());
        assert!(parse_action("[1, 2]").is_err());
        assert!(parse_action(r#"{"action": "respond", "message": "ok"} extra"#).is_err());
        assert!(parse_action("não é json").is_err());
    }

    #[test]
    fn test_parse_failure_carries_diagnostics() {
        let error = parse_action("{invalid").unwrap_err();
        assert!(!error.details.is_empty());
        assert_eq!(error.http_status(), 500);
    }
}
