// ABOUTME: Whitelist-based static safety validator for model-proposed SQL text
// ABOUTME: Dialect-function scan, identifier quoting, result-cap and style checks; pure text analysis
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Comanda

//! # SQL Safety Validator
//!
//! Decides whether a proposed query string is dialect-correct enough to
//! execute, independent of what the database will later say. This component
//! never executes anything; statement-kind enforcement (single statement,
//! `SELECT`-only) lives in [`super::guard`], adjacent to the database
//! interface.
//!
//! Dialect-function matches are hard errors that also produce a rewritten
//! candidate; identifier quoting, missing `LIMIT`, comma joins, and cents
//! arithmetic without `/ 100` are warnings.

use regex::Regex;
use std::sync::LazyLock;

use super::corrections;
use crate::catalog::CATALOG;

/// Outcome of validating one proposed query
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    /// False when at least one hard error was found
    pub is_valid: bool,
    /// Rewritten text, set whenever at least one deterministic rewrite fired
    /// (dialect or quoting), independent of validity
    pub corrected_sql: Option<String>,
    /// Hard errors; non-empty implies `is_valid == false`
    pub errors: Vec<String>,
    /// Non-fatal findings
    pub warnings: Vec<String>,
}

impl ValidationReport {
    /// The query text execution should prefer: corrected if any rewrite fired
    #[must_use]
    pub fn preferred_sql<'a>(&'a self, original: &'a str) -> &'a str {
        self.corrected_sql.as_deref().unwrap_or(original)
    }
}

static LIMIT_CLAUSE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"(?i)\bLIMIT\s+\d+").expect("static pattern")
});

static COMMA_JOIN: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r#"(?i)\bFROM\s+"?\w+"?(?:\s+(?:AS\s+)?\w+)?\s*,\s*"?\w+"?"#).expect("static pattern")
});

static CENTS_COLUMN: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r#"(?i)"?\w*cents\w*"?"#).expect("static pattern")
});

static CENTS_DIVISION: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"/\s*100(?:\.0+)?\b").expect("static pattern")
});

/// Per-table quoting matchers, built once from the catalog
static TABLE_MATCHERS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    CATALOG
        .table_names()
        .into_iter()
        .map(|name| {
            #[allow(clippy::expect_used)]
            let pattern = Regex::new(&format!(r#"(")?\b{name}\b(")?"#)).expect("table pattern");
            (name, pattern)
        })
        .collect()
});

/// Rewrite unquoted occurrences of known table names to their quoted form
///
/// Returns the rewritten text plus the table names that needed quoting.
/// Already-quoted occurrences are left untouched.
#[must_use]
pub fn quote_known_tables(sql: &str) -> (String, Vec<&'static str>) {
    let mut rewritten = sql.to_owned();
    let mut touched = Vec::new();

    for (name, pattern) in TABLE_MATCHERS.iter() {
        let mut fired = false;
        rewritten = pattern
            .replace_all(&rewritten, |caps: &regex::Captures<'_>| {
                if caps.get(1).is_some() || caps.get(2).is_some() {
                    caps[0].to_owned()
                } else {
                    fired = true;
                    format!("\"{name}\"")
                }
            })
            .into_owned();
        if fired {
            touched.push(*name);
        }
    }

    (rewritten, touched)
}

/// Validate a proposed query string
///
/// Pure text analysis over the dialect rule table and the known-schema
/// catalog. `corrected_sql` carries the combined dialect + quoting rewrite
/// whenever any rule fired.
#[must_use]
pub fn validate(sql: &str) -> ValidationReport {
    let mut report = ValidationReport {
        is_valid: true,
        ..ValidationReport::default()
    };

    // Dialect-function scan: hard errors with a deterministic rewrite
    let (after_dialect, fired) = corrections::apply_all(sql);
    for rule in &fired {
        report.errors.push(rule.message.to_owned());
    }

    // Identifier quoting over the dialect-corrected text
    let (after_quoting, touched) = quote_known_tables(&after_dialect);
    for name in &touched {
        report.warnings.push(format!(
            "tabela {name} sem aspas; o PostgreSQL exige \"{name}\" para nomes em CamelCase"
        ));
    }

    if !fired.is_empty() || !touched.is_empty() {
        report.corrected_sql = Some(after_quoting);
    }

    if !LIMIT_CLAUSE.is_match(sql) {
        report
            .warnings
            .push("consulta sem cláusula LIMIT; um limite de linhas será aplicado".to_owned());
    }

    if COMMA_JOIN.is_match(sql) {
        report.warnings.push(
            "junção por vírgula no FROM; prefira JOIN explícito com condição ON".to_owned(),
        );
    }

    if CENTS_COLUMN.is_match(sql) && !CENTS_DIVISION.is_match(sql) {
        report.warnings.push(
            "coluna em centavos usada sem divisão por 100; o valor sairá 100x maior".to_owned(),
        );
    }

    report.is_valid = report.errors.is_empty();
    report
}
