// ABOUTME: Natural-language-to-safe-SQL analytics pipeline module organization
// ABOUTME: Normalizer, action resolver, validator, corrections, retry orchestrator, formatter
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Comanda

//! # Analytics Pipeline
//!
//! The only place in the back-office where untrusted, model-generated text is
//! converted into a database-executing command. Control flow per request:
//!
//! 1. [`conversation`] — bound and whitelist the chat history
//! 2. [`action`] — one analysis model call, strictly parsed into a decision
//! 3. [`validator`] + [`corrections`] — static safety and dialect checks
//! 4. [`guard`] — read-only, single-statement enforcement with row limit
//! 5. [`executor`] — execution with bounded, classified retry
//! 6. [`formatter`] — row normalization, shape detection, disambiguation
//! 7. [`pipeline`] — sequential orchestration plus the narration call
//!
//! Nothing here is cached or shared across requests except the immutable
//! correction-rule table and the schema catalog.

/// Strict parsing of the analysis call's output into an action decision
pub mod action;

/// Chat history bounding and role whitelisting
pub mod conversation;

/// Dialect correction engine: pattern ⇒ deterministic rewrite table
pub mod corrections;

/// Execution retry orchestrator and failure-classifier strategy
pub mod executor;

/// Result disambiguation and pt-BR presentation rendering
pub mod formatter;

/// Read-only statement gate adjacent to the database interface
pub mod guard;

/// Sequential per-request orchestration of the whole pipeline
pub mod pipeline;

/// Whitelist-based static SQL safety validation
pub mod validator;

pub use action::ActionDecision;
pub use conversation::{normalize_conversation, RawMessage};
pub use executor::{
    CorrectiveAction, DriverError, FailureClassifier, PostgresFailureClassifier, QueryExecutor,
    RetryOrchestrator, RowMap,
};
pub use formatter::{RowShape, SearchOutcome};
pub use pipeline::{AnalyticsAnswer, AnalyticsPipeline};
pub use validator::ValidationReport;
