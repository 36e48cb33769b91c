// ABOUTME: Result disambiguator and pt-BR formatter for decoded query rows
// ABOUTME: Shape heuristics, customer-search tie-break, currency/date/status rendering
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Comanda

//! # Result Disambiguator & Formatter
//!
//! Turns decoded rows into the compact pt-BR preview handed to the narration
//! call. Row shape is guessed from column names alone; customer-shaped result
//! sets additionally go through search disambiguation, where a single exact
//! name match wins over any number of partial matches. Monetary columns are
//! stored in cents and rendered as reais.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

use super::executor::RowMap;

/// Hard cap on rows kept after execution, everything beyond is dropped
pub const MAX_PREVIEW_ROWS: usize = 200;

/// Maximum disambiguation candidates named to the operator
pub const MAX_CANDIDATES: usize = 10;

/// Rows rendered into the narration preview
const PREVIEW_LINES: usize = 20;

/// Raw order/delivery status values and their operator-facing labels
const STATUS_LABELS: &[(&str, &str)] = &[
    ("pendente", "Pendente"),
    ("confirmado", "Confirmado"),
    ("preparando", "Em preparo"),
    ("saiu_para_entrega", "Saiu para entrega"),
    ("entregue", "Entregue"),
    ("cancelado", "Cancelado"),
];

/// Guessed shape of a result set, from column names alone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowShape {
    /// Customer records: name plus a contact column
    Customer,
    /// Order records: id plus status or a customer reference
    Order,
    /// Time-bucketed aggregates: a date-ish column plus numbers
    SalesAggregate,
    /// Product records: name plus a sales metric
    Product,
    /// Anything else
    Generic,
}

/// Outcome of customer-search disambiguation
#[derive(Debug, Clone)]
pub enum SearchOutcome {
    /// Single match, or the unique exact name match among many
    Exact(RowMap),
    /// Several plausible matches, capped, with candidate names
    Multiple(Vec<RowMap>, Vec<String>),
    /// No exact match and the term appears in no candidate name
    Partial(Vec<RowMap>),
    /// Empty result set, with suggestion names when any exist
    NotFound(Vec<String>),
}

/// A formatted result set ready for narration
#[derive(Debug, Clone)]
pub struct FormattedResult {
    /// Guessed row shape
    pub shape: RowShape,
    /// Normalized rows, capped at [`MAX_PREVIEW_ROWS`]
    pub rows: Vec<RowMap>,
    /// Disambiguation outcome, customer-shaped sets only
    pub outcome: Option<SearchOutcome>,
    /// Compact pt-BR preview handed to the narration call
    pub preview: String,
}

// ============================================================================
// Row normalization and shape detection
// ============================================================================

/// Cap the row count and flatten nested values to display strings
#[must_use]
pub fn normalize_rows(mut rows: Vec<RowMap>) -> Vec<RowMap> {
    rows.truncate(MAX_PREVIEW_ROWS);
    for row in &mut rows {
        for value in row.values_mut() {
            if matches!(value, Value::Object(_) | Value::Array(_)) {
                *value = Value::String(value.to_string());
            }
        }
    }
    rows
}

fn has_key(keys: &[String], wanted: &[&str]) -> bool {
    keys.iter().any(|k| wanted.contains(&k.as_str()))
}

fn has_key_containing(keys: &[String], fragments: &[&str]) -> bool {
    keys.iter()
        .any(|k| fragments.iter().any(|fragment| k.contains(fragment)))
}

/// Guess the shape of a result set from its first row's column names
#[must_use]
pub fn detect_shape(rows: &[RowMap]) -> RowShape {
    let Some(first) = rows.first() else {
        return RowShape::Generic;
    };
    let keys: Vec<String> = first.keys().map(|k| k.to_lowercase()).collect();

    let has_name = has_key(&keys, &["nome", "name"]);
    if has_name
        && has_key_containing(
            &keys,
            &["telefone", "phone", "celular", "email", "endereco", "address"],
        )
    {
        return RowShape::Customer;
    }

    if has_key(&keys, &["id"]) && (has_key(&keys, &["status"]) || has_key_containing(&keys, &["cliente"])) {
        return RowShape::Order;
    }

    let has_number = first.values().any(Value::is_number);
    if has_number && has_key_containing(&keys, &["data", "date", "dia", "mes", "month", "criado"]) {
        return RowShape::SalesAggregate;
    }

    if has_name
        && has_key_containing(&keys, &["vendas", "receita", "revenue", "total", "quantidade"])
    {
        return RowShape::Product;
    }

    RowShape::Generic
}

// ============================================================================
// Customer-search disambiguation
// ============================================================================

static SEARCH_PREDICATE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r#"(?i)"?(?:nome|name)"?\s*(?:I?LIKE|=)\s*'([^']+)'"#).expect("static pattern")
});

/// Extract the searched name from the query's own predicate, when one exists
#[must_use]
pub fn extract_search_term(sql: &str) -> Option<String> {
    let captured = SEARCH_PREDICATE.captures(sql)?;
    let term = captured[1].trim_matches('%').trim();
    (!term.is_empty()).then(|| term.to_owned())
}

/// Search-broadening tips offered when a name search returns nothing
const BROADENING_TIPS: &[&str] = &[
    "tente apenas parte do nome",
    "confira a grafia ou busque pelo telefone",
];

fn broadening_suggestions() -> Vec<String> {
    BROADENING_TIPS.iter().map(|tip| (*tip).to_owned()).collect()
}

fn row_name(row: &RowMap) -> Option<&str> {
    row.get("nome").or_else(|| row.get("name"))?.as_str()
}

fn candidate_names(rows: &[RowMap]) -> Vec<String> {
    rows.iter()
        .filter_map(row_name)
        .map(ToOwned::to_owned)
        .take(MAX_CANDIDATES)
        .collect()
}

/// Disambiguate a customer-shaped result set against the searched term
///
/// One row is always exact. Among many, a unique case-insensitive exact name
/// match wins the tie; two or more exact matches stay ambiguous. When no
/// candidate name even contains the term, the set is reported as partial.
#[must_use]
pub fn disambiguate_customers(rows: Vec<RowMap>, term: Option<&str>) -> SearchOutcome {
    if rows.is_empty() {
        return SearchOutcome::NotFound(broadening_suggestions());
    }
    if rows.len() == 1 {
        let mut rows = rows;
        return SearchOutcome::Exact(rows.remove(0));
    }

    let Some(term) = term else {
        let names = candidate_names(&rows);
        let mut rows = rows;
        rows.truncate(MAX_CANDIDATES);
        return SearchOutcome::Multiple(rows, names);
    };

    let exact: Vec<usize> = rows
        .iter()
        .enumerate()
        .filter(|(_, row)| row_name(row).is_some_and(|name| name.eq_ignore_ascii_case(term)))
        .map(|(index, _)| index)
        .collect();

    if exact.len() == 1 {
        let mut rows = rows;
        return SearchOutcome::Exact(rows.remove(exact[0]));
    }

    if exact.is_empty() {
        let term_lower = term.to_lowercase();
        let any_contains = rows
            .iter()
            .filter_map(row_name)
            .any(|name| name.to_lowercase().contains(&term_lower));
        if !any_contains {
            let mut rows = rows;
            rows.truncate(MAX_CANDIDATES);
            return SearchOutcome::Partial(rows);
        }
    }

    let names = candidate_names(&rows);
    let mut rows = rows;
    rows.truncate(MAX_CANDIDATES);
    SearchOutcome::Multiple(rows, names)
}

// ============================================================================
// pt-BR value rendering
// ============================================================================

/// Render an amount of cents as Brazilian reais, e.g. `R$ 1.234,56`
#[must_use]
pub fn format_cents(cents: i64) -> String {
    let negative = cents < 0;
    let absolute = cents.unsigned_abs();
    let reais = (absolute / 100).to_string();
    let centavos = absolute % 100;

    let mut grouped = String::with_capacity(reais.len() + reais.len() / 3);
    for (index, digit) in reais.chars().enumerate() {
        if index > 0 && (reais.len() - index) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }

    let sign = if negative { "-" } else { "" };
    format!("{sign}R$ {grouped},{centavos:02}")
}

/// Render an ISO date or timestamp string as `dd/mm/aaaa`
#[must_use]
pub fn format_date(raw: &str) -> Option<String> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.format("%d/%m/%Y").to_string());
    }
    if let Ok(ts) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Some(ts.format("%d/%m/%Y").to_string());
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date.format("%d/%m/%Y").to_string());
    }
    None
}

/// Operator-facing label for a raw status value, raw text when unknown
#[must_use]
pub fn status_label(raw: &str) -> &str {
    STATUS_LABELS
        .iter()
        .find(|(value, _)| *value == raw)
        .map_or(raw, |(_, label)| label)
}

fn render_value(key: &str, value: &Value) -> String {
    let key_lower = key.to_lowercase();
    match value {
        Value::Null => "-".to_owned(),
        // NUMERIC aggregates (SUM, AVG) decode as floats; round back to cents
        Value::Number(number) if key_lower.contains("cents") => {
            if let Some(cents) = number.as_i64() {
                format_cents(cents)
            } else if let Some(raw) = number.as_f64() {
                format_cents(raw.round() as i64)
            } else {
                number.to_string()
            }
        }
        Value::String(text) if key_lower == "status" => status_label(text).to_owned(),
        Value::String(text) => format_date(text).unwrap_or_else(|| text.clone()),
        other => other.to_string(),
    }
}

fn render_row(row: &RowMap) -> String {
    row.iter()
        .map(|(key, value)| format!("{key}: {}", render_value(key, value)))
        .collect::<Vec<_>>()
        .join(", ")
}

fn render_rows(rows: &[RowMap]) -> String {
    let mut lines: Vec<String> = rows.iter().take(PREVIEW_LINES).map(render_row).collect();
    if rows.len() > PREVIEW_LINES {
        lines.push(format!("... e mais {} linhas", rows.len() - PREVIEW_LINES));
    }
    lines.join("\n")
}

fn render_outcome(outcome: &SearchOutcome) -> String {
    match outcome {
        SearchOutcome::Exact(row) => format!("Cliente encontrado: {}", render_row(row)),
        SearchOutcome::Multiple(rows, names) => format!(
            "{} clientes possíveis: {}\n{}",
            rows.len(),
            names.join(", "),
            render_rows(rows)
        ),
        SearchOutcome::Partial(rows) => format!(
            "Nenhuma correspondência exata; clientes parecidos:\n{}",
            render_rows(rows)
        ),
        SearchOutcome::NotFound(suggestions) => {
            if suggestions.is_empty() {
                "Nenhum cliente encontrado.".to_owned()
            } else {
                format!(
                    "Nenhum cliente encontrado. Sugestões: {}",
                    suggestions.join("; ")
                )
            }
        }
    }
}

/// Normalize, shape-detect, disambiguate, and render one result set
#[must_use]
pub fn format_rows(rows: Vec<RowMap>, sql: &str) -> FormattedResult {
    let rows = normalize_rows(rows);
    let shape = detect_shape(&rows);

    // Zero rows carry no shape signal; the query's own name predicate tells
    // us the operator was searching for someone.
    let term = extract_search_term(sql);
    let outcome = if rows.is_empty() {
        term.map(|_| SearchOutcome::NotFound(broadening_suggestions()))
    } else if shape == RowShape::Customer {
        Some(disambiguate_customers(rows.clone(), term.as_deref()))
    } else {
        None
    };

    let preview = match &outcome {
        Some(outcome) => render_outcome(outcome),
        None if rows.is_empty() => "A consulta não retornou linhas.".to_owned(),
        None => render_rows(&rows),
    };

    FormattedResult {
        shape,
        rows,
        outcome,
        preview,
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn customer(name: &str) -> RowMap {
        let mut row = RowMap::new();
        row.insert("nome".to_owned(), Value::from(name));
        row.insert("telefone".to_owned(), Value::from("11 99999-0000"));
        row
    }

    #[test]
    fn test_currency_rendering() {
        assert_eq!(format_cents(123_456), "R$ 1.234,56");
        assert_eq!(format_cents(5), "R$ 0,05");
        assert_eq!(format_cents(100), "R$ 1,00");
        assert_eq!(format_cents(-250), "-R$ 2,50");
        assert_eq!(format_cents(1_000_000_00), "R$ 1.000.000,00");
    }

    #[test]
    fn test_date_rendering() {
        assert_eq!(
            format_date("2025-03-09T14:30:00+00:00").as_deref(),
            Some("09/03/2025")
        );
        assert_eq!(format_date("2025-03-09").as_deref(), Some("09/03/2025"));
        assert_eq!(format_date("não é data"), None);
    }

    #[test]
    fn test_status_labels() {
        assert_eq!(status_label("preparando"), "Em preparo");
        assert_eq!(status_label("saiu_para_entrega"), "Saiu para entrega");
        assert_eq!(status_label("desconhecido"), "desconhecido");
    }

    #[test]
    fn test_shape_detection() {
        assert_eq!(detect_shape(&[customer("Maria")]), RowShape::Customer);

        let mut order = RowMap::new();
        order.insert("id".to_owned(), Value::from(1));
        order.insert("status".to_owned(), Value::from("entregue"));
        order.insert("criadoEm".to_owned(), Value::from("2025-03-09"));
        assert_eq!(detect_shape(&[order]), RowShape::Order);

        let mut aggregate = RowMap::new();
        aggregate.insert("mes".to_owned(), Value::from("2025-03"));
        aggregate.insert("total".to_owned(), Value::from(42));
        assert_eq!(detect_shape(&[aggregate]), RowShape::SalesAggregate);

        let mut product = RowMap::new();
        product.insert("nome".to_owned(), Value::from("Pizza Calabresa"));
        product.insert("quantidade".to_owned(), Value::from(31));
        assert_eq!(detect_shape(&[product]), RowShape::Product);

        assert_eq!(detect_shape(&[]), RowShape::Generic);
    }

    #[test]
    fn test_exact_name_wins_the_tie() {
        let rows = vec![
            customer("Maria Silva"),
            customer("Maria"),
            customer("Maria Souza"),
        ];
        let outcome = disambiguate_customers(rows, Some("maria"));
        let SearchOutcome::Exact(row) = outcome else {
            panic!("expected exact outcome");
        };
        assert_eq!(row.get("nome").unwrap().as_str(), Some("Maria"));
    }

    #[test]
    fn test_two_exact_matches_stay_ambiguous() {
        let rows = vec![customer("Maria"), customer("maria")];
        assert!(matches!(
            disambiguate_customers(rows, Some("Maria")),
            SearchOutcome::Multiple(_, _)
        ));
    }

    #[test]
    fn test_partial_when_no_name_contains_term() {
        let rows = vec![customer("João"), customer("Pedro")];
        assert!(matches!(
            disambiguate_customers(rows, Some("Maria")),
            SearchOutcome::Partial(_)
        ));
    }

    #[test]
    fn test_candidates_capped_at_ten() {
        let rows: Vec<RowMap> = (0..25).map(|i| customer(&format!("Maria {i}"))).collect();
        let SearchOutcome::Multiple(kept, names) = disambiguate_customers(rows, Some("Maria"))
        else {
            panic!("expected multiple outcome");
        };
        assert_eq!(kept.len(), MAX_CANDIDATES);
        assert_eq!(names.len(), MAX_CANDIDATES);
    }

    #[test]
    fn test_search_term_extraction() {
        assert_eq!(
            extract_search_term("SELECT * FROM \"Cliente\" WHERE \"nome\" ILIKE '%Maria%'"),
            Some("Maria".to_owned())
        );
        assert_eq!(
            extract_search_term("SELECT * FROM \"Cliente\" WHERE nome = 'João Souza'"),
            Some("João Souza".to_owned())
        );
        assert_eq!(extract_search_term("SELECT COUNT(*) FROM \"Pedido\""), None);
    }

    #[test]
    fn test_rows_truncated_to_cap() {
        let rows: Vec<RowMap> = (0..500)
            .map(|i| {
                let mut row = RowMap::new();
                row.insert("n".to_owned(), Value::from(i));
                row
            })
            .collect();
        assert_eq!(normalize_rows(rows).len(), MAX_PREVIEW_ROWS);
    }

    #[test]
    fn test_nested_values_flattened() {
        let mut row = RowMap::new();
        row.insert("dados".to_owned(), serde_json::json!({"a": 1}));
        let normalized = normalize_rows(vec![row]);
        assert!(normalized[0].get("dados").unwrap().is_string());
    }

    #[test]
    fn test_formatted_preview_for_cents_and_status() {
        let mut row = RowMap::new();
        row.insert("id".to_owned(), Value::from(12));
        row.insert("status".to_owned(), Value::from("preparando"));
        row.insert("totalCents".to_owned(), Value::from(7890));
        let result = format_rows(vec![row], "SELECT * FROM \"Pedido\" LIMIT 1");
        assert!(result.preview.contains("Em preparo"));
        assert!(result.preview.contains("R$ 78,90"));
    }

    #[test]
    fn test_float_backed_cents_rendered_as_currency() {
        // NUMERIC results arrive as f64-backed JSON numbers
        let mut row = RowMap::new();
        row.insert("mes".to_owned(), Value::from("2025-07"));
        row.insert("totalCents".to_owned(), Value::from(456_789.0_f64));
        let result = format_rows(vec![row], "SELECT ... LIMIT 12");
        assert_eq!(result.shape, RowShape::SalesAggregate);
        assert!(result.preview.contains("R$ 4.567,89"), "{}", result.preview);

        // Fractional cents from AVG round to the nearest centavo
        let mut row = RowMap::new();
        row.insert("mediaCents".to_owned(), Value::from(1_049.6_f64));
        let rendered = render_value("mediaCents", row.get("mediaCents").unwrap());
        assert_eq!(rendered, "R$ 10,50");
    }

    #[test]
    fn test_empty_result_preview() {
        let result = format_rows(Vec::new(), "SELECT 1 LIMIT 1");
        assert!(result.preview.contains("não retornou"));
    }
}
