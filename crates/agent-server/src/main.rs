//! analyst-server: HTTP API for the financial analysis pipeline

use agent_analyst::{AnalysisPipeline, AnalystConfig};
use agent_server::{AppState, RequestTracker, ServerConfig, create_app};
use agent_utils::{AppConfig, init_tracing_with};
use anyhow::Context as _;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

/// How long in-flight analyses get to observe cancellation on shutdown
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let app_config = AppConfig::from_env()?;
    init_tracing_with(&app_config)?;

    let server_config = ServerConfig::from_env()?;
    let analyst_config = AnalystConfig::from_env()?;
    let pipeline = AnalysisPipeline::from_config(&analyst_config)
        .context("Failed to build the analysis pipeline")?;
    info!(
        provider = ?analyst_config.provider,
        model = %analyst_config.model,
        "Analysis pipeline ready"
    );

    let tracker = Arc::new(RequestTracker::from_config(Arc::new(pipeline), &server_config));
    let app = create_app(
        AppState::new(Arc::clone(&tracker)),
        server_config.cors_permissive,
    );

    let addr = server_config.bind_addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;
    info!(%addr, "{} listening", app_config.service_name);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let cancelled = tracker.cancel_all().await;
    if cancelled > 0 {
        info!(cancelled, "Cancelling in-flight analyses");
        if !tracker.wait_idle(SHUTDOWN_GRACE).await {
            warn!(remaining = tracker.in_flight().await, "Analyses still running at exit");
        }
    }
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
