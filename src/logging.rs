// ABOUTME: Logging configuration and structured logging setup for observability
// ABOUTME: Configures log levels, formats, and output destinations via environment
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Comanda

//! Production-ready logging configuration with structured output

use anyhow::Result;
use std::env;
use std::io;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
};

/// Log output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// `JSON` format for production logging
    Json,
    /// Pretty format for development
    Pretty,
    /// Compact format for space-constrained environments
    Compact,
}

impl LogFormat {
    /// Parse from environment string with a development-friendly default
    #[must_use]
    pub fn from_env_str(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "json" => Self::Json,
            "compact" => Self::Compact,
            _ => Self::Pretty,
        }
    }
}

/// Initialize logging from `RUST_LOG` and `COMANDA_LOG_FORMAT`
///
/// Defaults to `info` level with pretty output. Safe to call exactly once at
/// process start; subsequent calls return an error from the subscriber.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_from_env() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn,hyper=warn"));

    let format = LogFormat::from_env_str(
        &env::var("COMANDA_LOG_FORMAT").unwrap_or_else(|_| "pretty".to_owned()),
    );

    let fmt_layer = match format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(io::stdout)
            .with_current_span(true)
            .boxed(),
        LogFormat::Pretty => fmt::layer().with_writer(io::stdout).boxed(),
        LogFormat::Compact => fmt::layer().compact().with_writer(io::stdout).boxed(),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_parsing() {
        assert_eq!(LogFormat::from_env_str("json"), LogFormat::Json);
        assert_eq!(LogFormat::from_env_str("COMPACT"), LogFormat::Compact);
        assert_eq!(LogFormat::from_env_str("anything"), LogFormat::Pretty);
    }
}
