// ABOUTME: HTTP route organization for the analytics server
// ABOUTME: One analytics endpoint plus a liveness/readiness probe
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Comanda

//! HTTP surface: `POST /api/analytics/ask` and `GET /api/health`.

/// The analytics ask endpoint
pub mod analytics;

/// Health probe for the database and the model provider
pub mod health;

pub use analytics::AnalyticsRoutes;
pub use health::HealthRoutes;
