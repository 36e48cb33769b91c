// ABOUTME: Binary entry point for the Comanda analytics server
// ABOUTME: Wires config, logging, database pool, LLM provider, and the HTTP surface
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Comanda

//! Comanda analytics server binary.

use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use comanda_analytics_server::config::ServerConfig;
use comanda_analytics_server::context::ServerResources;
use comanda_analytics_server::database;
use comanda_analytics_server::llm::ChatProvider;
use comanda_analytics_server::logging;
use comanda_analytics_server::routes::{AnalyticsRoutes, HealthRoutes};

/// Whole-request deadline, generous enough for both model calls plus a retry
const REQUEST_DEADLINE: Duration = Duration::from_secs(90);

/// Request bodies are small conversations; anything larger is garbage
const MAX_BODY_BYTES: usize = 64 * 1024;

#[derive(Parser)]
#[command(name = "comanda-analytics-server", version)]
#[command(about = "Endpoint de análise em linguagem natural do back-office Comanda")]
struct Args {
    /// Override the HTTP port from the environment
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    logging::init_from_env()?;

    let mut config = ServerConfig::from_env().context("configuração inválida")?;
    if let Some(port) = args.port {
        config.http_port = port;
    }
    info!(config = %config.summary(), "iniciando o servidor de análise");

    let pool = database::connect(&config.database_url).await?;
    let provider = Arc::new(ChatProvider::from_env()?);
    let http_port = config.http_port;
    let resources = Arc::new(ServerResources::new(config, pool, provider));

    let app = AnalyticsRoutes::routes(Arc::clone(&resources))
        .merge(HealthRoutes::routes(resources))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(CorsLayer::permissive())
        .layer(TimeoutLayer::new(REQUEST_DEADLINE))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES));

    let addr = SocketAddr::from(([0, 0, 0, 0], http_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("não foi possível escutar em {addr}"))?;
    info!(%addr, "servidor pronto");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("o servidor HTTP terminou com erro")?;

    info!("servidor encerrado");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(%error, "falha ao instalar o handler de ctrl-c");
        return;
    }
    info!("ctrl-c recebido, encerrando");
}
