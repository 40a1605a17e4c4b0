use anyhow::{Context, Result};
use fabric_api::GrpcDataplane;
use fabric_core::{DataplaneClient, InMemoryTopology};
use fabric_routing::{RouteRealizer, RoutingMetrics};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod cleanup;
mod config;
mod metrics_server;

use config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting fabric-agent...");

    let config = Config::load()?;
    info!(
        "Configuration loaded: dataplane {}, ipv4-only {}, preferred network {:?}",
        config.dataplane_address, config.realizer.ipv4_only, config.realizer.preferred_network
    );

    let dataplane = GrpcDataplane::connect(config.dataplane_address.clone())
        .await
        .with_context(|| format!("failed to connect to dataplane at {}", config.dataplane_address))?;
    info!("Connected to dataplane at {}", config.dataplane_address);

    let topology = InMemoryTopology::new();
    config.seed_topology(&topology).await;

    let metrics = RoutingMetrics::new()?;
    let realizer = Arc::new(RouteRealizer::new(
        DataplaneClient::new(Arc::new(dataplane)),
        Arc::new(topology.clone()),
        config.realizer.clone(),
        metrics.clone(),
    ));
    info!("Route realizer initialized");

    tokio::spawn(cleanup::run_cleanup_loop(
        realizer.clone(),
        topology.clone(),
        config.cleanup_interval(),
    ));

    let metrics_address = config.metrics_address;
    tokio::spawn(async move {
        if let Err(e) = metrics_server::serve(metrics_address, metrics).await {
            error!("Metrics server failed: {}", e);
        }
    });

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received, exiting...");

    Ok(())
}
