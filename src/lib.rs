// ABOUTME: Main library entry point for the Comanda analytics server
// ABOUTME: Exposes the natural-language-to-safe-SQL analytics pipeline over HTTP
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Comanda

#![deny(unsafe_code)]

//! # Comanda Analytics Server
//!
//! The analytics subsystem of the Comanda restaurant back-office. An operator
//! asks a free-form question ("quantas vendas tivemos ontem?"); a language
//! model either answers directly or proposes a read-only SQL query. Proposed
//! queries pass through several defensive layers before ever reaching the
//! production PostgreSQL database:
//!
//! - **Conversation normalization**: bounded, role-whitelisted chat history
//! - **Action resolution**: strict parsing of the model's decision
//! - **SQL safety validation**: dialect-function scan, identifier quoting,
//!   result-cap and style checks
//! - **Read-only guard**: single-statement, `SELECT`-only enforcement with
//!   automatic row-limit injection
//! - **Bounded retry**: classified driver failures get exactly one corrected
//!   re-attempt; everything else propagates immediately
//! - **Disambiguation**: customer-shaped results are never silently collapsed
//!   to "the first row"
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use comanda_analytics_server::config::environment::ServerConfig;
//! use comanda_analytics_server::errors::AppResult;
//!
//! fn main() -> AppResult<()> {
//!     let config = ServerConfig::from_env()?;
//!     println!("Comanda analytics configured for port {}", config.http_port);
//!     Ok(())
//! }
//! ```

/// Natural-language-to-safe-SQL pipeline: normalizer, resolver, validator,
/// correction engine, retry orchestrator, disambiguator
pub mod analytics;

/// Static known-schema catalog driving quoting checks and shape detection
pub mod catalog;

/// Configuration management
pub mod config;

/// Shared server state handed to route handlers
pub mod context;

/// `PostgreSQL` pool setup and the production query executor
pub mod database;

/// Unified error handling with standard error codes and HTTP responses
pub mod errors;

/// LLM provider abstraction for the analysis and narration calls
pub mod llm;

/// Production logging and structured output
pub mod logging;

/// HTTP routes for the analytics endpoint and health probe
pub mod routes;
