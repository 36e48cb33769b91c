// ABOUTME: Read-only statement gate applied immediately before execution
// ABOUTME: Single-statement, SELECT-only enforcement with a server-side row limit
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Comanda

//! # Read-Only Statement Gate
//!
//! Last line of defense before text reaches the database, applied to every
//! candidate the retry orchestrator produces, not just the first. The gate is
//! deliberately dumber than the validator: it knows nothing about dialects or
//! the schema, only that exactly one `SELECT` statement may pass and that it
//! must carry a row limit.

use regex::Regex;
use std::sync::LazyLock;

use crate::errors::{AppError, AppResult};

/// Row limit appended when the statement carries none
pub const DEFAULT_ROW_LIMIT: usize = 200;

static LIMIT_CLAUSE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"(?i)\bLIMIT\s+\d+").expect("static pattern")
});

static FORBIDDEN_KEYWORD: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"(?i)\b(INSERT|UPDATE|DELETE|DROP|ALTER|TRUNCATE|CREATE|GRANT|REVOKE)\b")
        .expect("static pattern")
});

/// Enforce the read-only contract on one candidate statement
///
/// Accepts exactly one `SELECT` statement. One trailing semicolon is
/// tolerated and stripped; any other semicolon rejects the text as a
/// multi-statement attempt. A `LIMIT` clause is appended when absent.
///
/// # Errors
///
/// Returns a query-rejected error for empty text, multiple statements,
/// non-`SELECT` statements (including `WITH`), or embedded write keywords.
pub fn enforce_read_only(sql: &str) -> AppResult<String> {
    let mut text = sql.trim();
    if let Some(stripped) = text.strip_suffix(';') {
        text = stripped.trim_end();
    }

    if text.is_empty() {
        return Err(AppError::query_rejected("a consulta proposta está vazia"));
    }

    if text.contains(';') {
        return Err(AppError::query_rejected(
            "múltiplas instruções na mesma consulta não são permitidas",
        ));
    }

    let first_word = text
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_uppercase();
    if first_word != "SELECT" {
        let error = AppError::query_rejected(format!(
            "apenas consultas SELECT são permitidas; a instrução começa com '{first_word}'"
        ));
        return Err(if first_word == "WITH" {
            error.with_hint("reescreva a CTE como subconsulta dentro de um único SELECT")
        } else {
            error
        });
    }

    if let Some(found) = FORBIDDEN_KEYWORD.find(text) {
        return Err(AppError::query_rejected(format!(
            "palavra-chave de escrita '{}' não é permitida",
            found.as_str().to_uppercase()
        )));
    }

    if LIMIT_CLAUSE.is_match(text) {
        Ok(text.to_owned())
    } else {
        Ok(format!("{text} LIMIT {DEFAULT_ROW_LIMIT}"))
    }
}
