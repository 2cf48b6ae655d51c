// Data Access Agent - Web Server

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;

use data_access_agent::web::{app, AppState};
use data_access_agent::{AgentConfig, StaticHistoryProvider};

/// Serve the Data Access AI Agent over HTTP
#[derive(Parser, Debug)]
#[command(name = "data-agent-server", version)]
struct Args {
    #[command(flatten)]
    config: AgentConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = args.config;
    config.init_tracing();

    let provider = StaticHistoryProvider::load().context("Failed to load history dataset")?;
    let state = AppState::new(config.router(), Arc::new(provider));

    tracing::info!(
        preselect_fields = config.preselect_fields,
        "Data Access AI Agent web server starting"
    );

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;

    tracing::info!("Server running on http://{}", config.bind_addr);
    tracing::info!("   UI:  http://{}/", config.bind_addr);
    tracing::info!("   API: http://{}/api/page", config.bind_addr);

    axum::serve(listener, app(state))
        .await
        .context("Server error")?;

    Ok(())
}
