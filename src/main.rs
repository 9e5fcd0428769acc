mod api;
mod config;
mod engine;
mod error;
mod gateway;
mod money;
mod report;
mod tracking;
mod types;
mod workflow;

use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::api::{router, ApiState};
use crate::config::Config;
use crate::engine::Engine;
use crate::error::Result;
use crate::gateway::{Gateway, HttpGateway, LatencyStats};
use crate::workflow::Orchestrator;

#[tokio::main]
async fn main() {
    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cfg.log_level))
        .init();

    if let Err(e) = run(cfg).await {
        error!("Fatal error: {e}");
        std::process::exit(1);
    }
}

async fn run(cfg: Config) -> Result<()> {
    let latency = Arc::new(LatencyStats::new());
    let gateway: Arc<dyn Gateway> = Arc::new(HttpGateway::new(&cfg, Arc::clone(&latency))?);
    info!(
        "Gateway ready at {} (timeout {}s, workflow concurrency {})",
        cfg.gateway_api_url, cfg.gateway_timeout_secs, cfg.workflow_concurrency,
    );

    let orchestrator = Orchestrator::from_config(&cfg, Arc::clone(&gateway));
    let engine = Arc::new(Engine::new(gateway, orchestrator));

    let app = router(ApiState { engine, latency });
    let bind_addr = format!("0.0.0.0:{}", cfg.api_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("HTTP API listening on {bind_addr}");

    axum::serve(listener, app).await?;

    Ok(())
}
