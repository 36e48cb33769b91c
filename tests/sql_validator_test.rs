// ABOUTME: Integration tests for the validator, correction engine, and read-only gate together
// ABOUTME: End-to-end text flow: model-flavored SQL in, executable PostgreSQL out or rejection
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Comanda

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use comanda_analytics_server::analytics::guard::{enforce_read_only, DEFAULT_ROW_LIMIT};
use comanda_analytics_server::analytics::validator::validate;

/// The classic model mistake: MySQL date functions plus unquoted CamelCase
/// tables. Validation must flag everything and still hand back something the
/// database will accept.
#[test]
fn test_mysql_flavored_query_becomes_executable_postgres() {
    let proposed =
        "SELECT DATE_FORMAT(criadoEm, '%Y-%m') AS mes, SUM(totalCents) / 100.0 AS receita \
         FROM Pedido WHERE YEAR(criadoEm) = 2025 GROUP BY mes LIMIT 12";

    let report = validate(proposed);
    assert!(!report.is_valid);
    assert!(report.errors.len() >= 2, "errors: {:?}", report.errors);

    let corrected = report.corrected_sql.unwrap();
    assert!(corrected.contains("TO_CHAR("));
    assert!(corrected.contains("EXTRACT(YEAR FROM"));
    assert!(corrected.contains("FROM \"Pedido\""));

    // The corrected text is clean on re-validation and passes the gate
    let recheck = validate(&corrected);
    assert!(recheck.is_valid);
    let gated = enforce_read_only(&corrected).unwrap();
    assert!(gated.starts_with("SELECT"));
}

#[test]
fn test_validation_never_executes_anything() {
    // Even a destructive statement only produces findings here; the gate is
    // the component that rejects it.
    let report = validate("DROP TABLE \"Pedido\"");
    assert!(report.is_valid);
    assert!(enforce_read_only("DROP TABLE \"Pedido\"").is_err());
}

#[test]
fn test_gate_appends_limit_to_validated_query() {
    let report = validate("SELECT COUNT(*) AS total FROM \"Pedido\"");
    assert!(report.is_valid);
    assert!(report.warnings.iter().any(|w| w.contains("LIMIT")));

    let gated = enforce_read_only("SELECT COUNT(*) AS total FROM \"Pedido\"").unwrap();
    assert!(gated.ends_with(&format!("LIMIT {DEFAULT_ROW_LIMIT}")));
}

#[test]
fn test_multi_statement_smuggling_rejected() {
    for attempt in [
        "SELECT 1; DELETE FROM \"Pedido\"",
        "SELECT 1;;",
        "SELECT 1; --",
    ] {
        assert!(enforce_read_only(attempt).is_err(), "accepted: {attempt}");
    }
    // A single trailing semicolon is tolerated
    assert!(enforce_read_only("SELECT 1 LIMIT 1;").is_ok());
}

#[test]
fn test_cte_rejected_with_rewrite_hint() {
    let error = enforce_read_only(
        "WITH vendas AS (SELECT * FROM \"Pedido\") SELECT COUNT(*) FROM vendas",
    )
    .unwrap_err();
    assert_eq!(error.http_status(), 400);
    assert!(error.hint.unwrap().contains("subconsulta"));
}

#[test]
fn test_sqlite_strftime_flagged_and_rewritten() {
    let report = validate(
        "SELECT strftime('%Y-%m', \"criadoEm\") AS mes FROM \"Pedido\" LIMIT 12",
    );
    assert!(!report.is_valid);
    assert!(report.corrected_sql.unwrap().contains("TO_CHAR("));
}

#[test]
fn test_quoting_rewrite_covers_every_catalog_table() {
    let proposed = "SELECT * FROM Cliente, Pedido, ItemPedido, Produto, Entrega, Entregador LIMIT 1";
    let report = validate(proposed);
    let corrected = report.corrected_sql.unwrap();
    for table in [
        "\"Cliente\"",
        "\"Pedido\"",
        "\"ItemPedido\"",
        "\"Produto\"",
        "\"Entrega\"",
        "\"Entregador\"",
    ] {
        assert!(corrected.contains(table), "missing {table} in {corrected}");
    }
    // Comma join still gets its warning
    assert!(report.warnings.iter().any(|w| w.contains("JOIN")));
}
