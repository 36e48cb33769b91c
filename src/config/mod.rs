// ABOUTME: Configuration module organization for the analytics server
// ABOUTME: Re-exports environment-based server configuration
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Comanda

//! Configuration management

/// Environment-based configuration for production deployment
pub mod environment;

pub use environment::{LlmProviderType, ServerConfig};
