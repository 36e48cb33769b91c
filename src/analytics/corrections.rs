// ABOUTME: Dialect correction engine mapping known incompatibility patterns to deterministic rewrites
// ABOUTME: Single source of truth consulted proactively by the validator and reactively after failures
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Comanda

//! # Dialect Correction Engine
//!
//! The target engine is PostgreSQL; models trained on MySQL/SQLite-heavy
//! corpora routinely emit functions that do not exist there. Each rule pairs
//! a case-insensitive lexical pattern with a human-readable explanation and a
//! pure textual rewrite. Rules are idempotent (re-applying to corrected text
//! is a no-op), operate on lexical substrings without needing the full query
//! grammar, and cannot turn a read into a write. Order matters only when two
//! patterns could match the same substring: the first match wins.

use regex::Regex;
use std::sync::LazyLock;

/// A single dialect-incompatibility rule
pub struct CorrectionRule {
    /// Short rule identifier used in logs
    pub name: &'static str,
    /// Human-readable explanation surfaced as a validation error
    pub message: &'static str,
    pattern: Regex,
    replacement: &'static str,
}

impl CorrectionRule {
    fn new(
        name: &'static str,
        message: &'static str,
        pattern: &str,
        replacement: &'static str,
    ) -> Self {
        Self {
            name,
            message,
            // Patterns are compile-time constants; a failure here is a programming error
            // caught by the rule-table unit tests.
            #[allow(clippy::expect_used)]
            pattern: Regex::new(pattern).expect("invalid correction rule pattern"),
            replacement,
        }
    }

    /// Whether the rule's pattern occurs in the query text
    #[must_use]
    pub fn matches(&self, sql: &str) -> bool {
        self.pattern.is_match(sql)
    }

    /// Apply the deterministic rewrite to every occurrence
    #[must_use]
    pub fn apply(&self, sql: &str) -> String {
        self.pattern.replace_all(sql, self.replacement).into_owned()
    }
}

/// The fixed, ordered, immutable rule table
pub static RULES: LazyLock<Vec<CorrectionRule>> = LazyLock::new(|| {
    vec![
        CorrectionRule::new(
            "date_format",
            "DATE_FORMAT não existe no PostgreSQL; use TO_CHAR(coluna, formato)",
            r"(?i)\bDATE_FORMAT\s*\(",
            "TO_CHAR(",
        ),
        CorrectionRule::new(
            "strftime",
            "strftime é do SQLite; no PostgreSQL use TO_CHAR(coluna, formato)",
            r"(?i)\bSTRFTIME\s*\(",
            "TO_CHAR(",
        ),
        CorrectionRule::new(
            "year",
            "YEAR(coluna) não existe no PostgreSQL; use EXTRACT(YEAR FROM coluna)",
            r"(?i)\bYEAR\s*\(\s*([^()]+?)\s*\)",
            "EXTRACT(YEAR FROM $1)",
        ),
        CorrectionRule::new(
            "month",
            "MONTH(coluna) não existe no PostgreSQL; use EXTRACT(MONTH FROM coluna)",
            r"(?i)\bMONTH\s*\(\s*([^()]+?)\s*\)",
            "EXTRACT(MONTH FROM $1)",
        ),
        CorrectionRule::new(
            "day",
            "DAY(coluna) não existe no PostgreSQL; use EXTRACT(DAY FROM coluna)",
            r"(?i)\bDAY\s*\(\s*([^()]+?)\s*\)",
            "EXTRACT(DAY FROM $1)",
        ),
        CorrectionRule::new(
            "date",
            "DATE(coluna) é do MySQL; use DATE_TRUNC('day', coluna)",
            r"(?i)\bDATE\s*\(\s*([^()]+?)\s*\)",
            "DATE_TRUNC('day', $1)",
        ),
        CorrectionRule::new(
            "curdate",
            "CURDATE() não existe no PostgreSQL; use CURRENT_DATE",
            r"(?i)\bCURDATE\s*\(\s*\)",
            "CURRENT_DATE",
        ),
        CorrectionRule::new(
            "ifnull",
            "IFNULL é do MySQL; no PostgreSQL use COALESCE",
            r"(?i)\bIFNULL\s*\(",
            "COALESCE(",
        ),
        CorrectionRule::new(
            "datediff",
            "DATEDIFF não existe no PostgreSQL; subtraia as datas diretamente",
            r"(?i)\bDATEDIFF\s*\(\s*([^(),]+?)\s*,\s*([^()]+?)\s*\)",
            "($1::date - $2::date)",
        ),
    ]
});

/// Function names whose execution failures are auto-correctable date mismatches
const DATE_FUNCTION_NAMES: &[&str] = &[
    "date_format",
    "strftime",
    "year",
    "month",
    "day",
    "date",
    "curdate",
    "datediff",
];

/// Whether a driver-reported function name is a known date-function mismatch
#[must_use]
pub fn is_date_function(name: &str) -> bool {
    DATE_FUNCTION_NAMES.contains(&name.to_lowercase().as_str())
}

/// Apply every matching rule in table order
///
/// Returns the rewritten text plus the rules that fired. The rewritten text
/// equals the input when no rule matched.
#[must_use]
pub fn apply_all(sql: &str) -> (String, Vec<&'static CorrectionRule>) {
    let mut rewritten = sql.to_owned();
    let mut fired = Vec::new();
    for rule in RULES.iter() {
        if rule.matches(&rewritten) {
            rewritten = rule.apply(&rewritten);
            fired.push(rule);
        }
    }
    (rewritten, fired)
}
