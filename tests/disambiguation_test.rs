// ABOUTME: Integration tests for result formatting and customer disambiguation laws
// ABOUTME: Tie-break rule, candidate cap, row cap, and pt-BR rendering round trips
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Comanda

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use serde_json::Value;

use comanda_analytics_server::analytics::formatter::{
    disambiguate_customers, extract_search_term, format_cents, format_rows, MAX_CANDIDATES,
    MAX_PREVIEW_ROWS,
};
use comanda_analytics_server::analytics::{RowMap, RowShape, SearchOutcome};

fn customer(name: &str, phone: &str) -> RowMap {
    let mut row = RowMap::new();
    row.insert("nome".to_owned(), Value::from(name));
    row.insert("telefone".to_owned(), Value::from(phone));
    row
}

/// End to end: the executed query carries the search term, the rows are
/// customer-shaped, and the unique exact match wins over partial matches.
#[test]
fn test_search_flow_exact_match_wins() {
    let sql = "SELECT \"nome\", \"telefone\" FROM \"Cliente\" \
               WHERE \"nome\" ILIKE '%Ana%' LIMIT 10";
    let rows = vec![
        customer("Ana Clara", "11 91111-1111"),
        customer("Ana", "11 92222-2222"),
        customer("Mariana", "11 93333-3333"),
    ];

    let result = format_rows(rows, sql);
    assert_eq!(result.shape, RowShape::Customer);
    let Some(SearchOutcome::Exact(row)) = result.outcome else {
        panic!("expected exact outcome, got {:?}", result.outcome);
    };
    assert_eq!(row.get("telefone").unwrap().as_str(), Some("11 92222-2222"));
    assert!(result.preview.contains("Ana"));
}

#[test]
fn test_ambiguous_search_names_all_candidates() {
    let sql = "SELECT \"nome\", \"telefone\" FROM \"Cliente\" \
               WHERE \"nome\" ILIKE '%Silva%' LIMIT 10";
    let rows = vec![
        customer("João Silva", "1"),
        customer("Maria Silva", "2"),
        customer("Pedro Silva", "3"),
    ];

    let result = format_rows(rows, sql);
    let Some(SearchOutcome::Multiple(kept, names)) = result.outcome else {
        panic!("expected multiple outcome");
    };
    assert_eq!(kept.len(), 3);
    assert_eq!(names, vec!["João Silva", "Maria Silva", "Pedro Silva"]);
    // The operator sees every candidate, never a silent first-row pick
    for name in names {
        assert!(result.preview.contains(&name));
    }
}

#[test]
fn test_candidate_cap_is_ten() {
    let rows: Vec<RowMap> = (0..40)
        .map(|i| customer(&format!("Silva {i}"), "x"))
        .collect();
    let SearchOutcome::Multiple(kept, names) = disambiguate_customers(rows, Some("Silva")) else {
        panic!("expected multiple outcome");
    };
    assert_eq!(kept.len(), MAX_CANDIDATES);
    assert_eq!(names.len(), MAX_CANDIDATES);
}

#[test]
fn test_empty_search_reports_not_found_with_suggestions() {
    let sql = "SELECT \"nome\" FROM \"Cliente\" WHERE \"nome\" ILIKE '%Zuleica%' LIMIT 10";
    let result = format_rows(Vec::new(), sql);
    let Some(SearchOutcome::NotFound(suggestions)) = result.outcome else {
        panic!("expected not-found outcome, got {:?}", result.outcome);
    };
    assert!(!suggestions.is_empty());
    assert!(result.preview.contains("Nenhum cliente encontrado"));
}

#[test]
fn test_empty_result_without_search_term_stays_generic() {
    let result = format_rows(Vec::new(), "SELECT COUNT(*) FROM \"Pedido\" LIMIT 1");
    assert!(result.outcome.is_none());
    assert!(result.preview.contains("não retornou"));
}

#[test]
fn test_row_cap_applies_before_preview() {
    let rows: Vec<RowMap> = (0..1000)
        .map(|i| {
            let mut row = RowMap::new();
            row.insert("id".to_owned(), Value::from(i));
            row.insert("status".to_owned(), Value::from("entregue"));
            row
        })
        .collect();
    let result = format_rows(rows, "SELECT * FROM \"Pedido\"");
    assert_eq!(result.rows.len(), MAX_PREVIEW_ROWS);
    assert_eq!(result.shape, RowShape::Order);
}

#[test]
fn test_currency_grouping_round_trip() {
    // Render and parse back: no cents lost for a spread of magnitudes
    for cents in [0_i64, 1, 99, 100, 12_345, 1_000_000, 987_654_321] {
        let rendered = format_cents(cents);
        let digits: String = rendered
            .chars()
            .filter(|c| c.is_ascii_digit())
            .collect();
        assert_eq!(digits.parse::<i64>().unwrap(), cents, "via {rendered}");
    }
}

#[test]
fn test_term_extraction_matches_predicate_styles() {
    for (sql, expected) in [
        ("WHERE \"nome\" ILIKE '%Maria%'", Some("Maria")),
        ("WHERE \"nome\" LIKE 'Maria%'", Some("Maria")),
        ("WHERE nome = 'João Souza'", Some("João Souza")),
        ("WHERE \"status\" = 'entregue'", None),
    ] {
        assert_eq!(
            extract_search_term(&format!("SELECT * FROM \"Cliente\" {sql} LIMIT 5")).as_deref(),
            expected,
            "for {sql}"
        );
    }
}

#[test]
fn test_sales_aggregate_preview_renders_currency() {
    let mut row = RowMap::new();
    row.insert("mes".to_owned(), Value::from("2025-07"));
    row.insert("totalCents".to_owned(), Value::from(456_789));
    let result = format_rows(vec![row], "SELECT ... LIMIT 12");
    assert_eq!(result.shape, RowShape::SalesAggregate);
    assert!(result.preview.contains("R$ 4.567,89"));
}
