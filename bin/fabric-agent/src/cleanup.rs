use fabric_core::InMemoryTopology;
use fabric_routing::RouteRealizer;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

/// Periodic sweep removing routes whose peering is gone
pub async fn run_cleanup_loop(realizer: Arc<RouteRealizer>, topology: InMemoryTopology, interval: Duration) {
    info!("Starting unpeered route cleanup every {:?}", interval);

    loop {
        tokio::time::sleep(interval).await;

        let removed = sweep(&realizer, &topology).await;
        if removed > 0 {
            info!("Cleanup sweep removed {} unpeered routes", removed);
        }
    }
}

/// Clean every known network once, returning the number of routes removed
pub async fn sweep(realizer: &RouteRealizer, topology: &InMemoryTopology) -> usize {
    let mut removed = 0;

    for vni in topology.known_vnis().await {
        match realizer.cleanup_unpeered_routes(vni).await {
            Ok(count) => {
                debug!("Removed {} unpeered routes from vni {}", count, vni);
                removed += count;
            }
            Err(e) => {
                error!("Error cleaning up unpeered routes in vni {}: {}", vni, e);
            }
        }
    }

    removed
}
