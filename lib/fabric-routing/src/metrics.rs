//! Prometheus metrics for route realization

use anyhow::Result;
use prometheus::{Counter, CounterVec, Encoder, Opts, Registry, TextEncoder};
use std::sync::Arc;

/// Prometheus metrics collector for route events and the mutations they cause
#[derive(Clone)]
pub struct RoutingMetrics {
    /// Route events received, by operation and next hop kind
    pub route_events_total: CounterVec,
    /// Route events that returned an error, by operation
    pub route_event_errors_total: CounterVec,
    /// Per-network realization attempts, by operation, next hop kind and outcome
    pub dataplane_mutations_total: CounterVec,
    /// Routes deleted by the cleanup sweep
    pub stale_routes_removed_total: Counter,
    pub registry: Arc<Registry>,
}

impl RoutingMetrics {
    pub fn new() -> Result<Self> {
        let registry = Arc::new(Registry::new());

        let route_events_total = CounterVec::new(
            Opts::new("fabric_route_events_total", "Total route events received"),
            &["operation", "kind"],
        )?;

        let route_event_errors_total = CounterVec::new(
            Opts::new("fabric_route_event_errors_total", "Total route events that failed"),
            &["operation"],
        )?;

        let dataplane_mutations_total = CounterVec::new(
            Opts::new(
                "fabric_dataplane_mutations_total",
                "Total per-network realization attempts by outcome",
            ),
            &["operation", "kind", "outcome"],
        )?;

        let stale_routes_removed_total = Counter::new(
            "fabric_stale_routes_removed_total",
            "Total routes removed because their peering is gone",
        )?;

        registry.register(Box::new(route_events_total.clone()))?;
        registry.register(Box::new(route_event_errors_total.clone()))?;
        registry.register(Box::new(dataplane_mutations_total.clone()))?;
        registry.register(Box::new(stale_routes_removed_total.clone()))?;

        Ok(Self {
            route_events_total,
            route_event_errors_total,
            dataplane_mutations_total,
            stale_routes_removed_total,
            registry,
        })
    }

    /// Gather all metrics in Prometheus text format
    pub fn gather(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = vec![];
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = RoutingMetrics::new().expect("Failed to create metrics");
        assert!(metrics.gather().is_ok());
    }

    #[test]
    fn test_metrics_clone_shares_registry() {
        let metrics = RoutingMetrics::new().expect("Failed to create metrics");
        let clone = metrics.clone();
        clone.stale_routes_removed_total.inc();

        let text = metrics.gather().expect("Failed to gather metrics");
        assert!(text.contains("fabric_stale_routes_removed_total 1"));
    }

    #[test]
    fn test_metrics_text_format_structure() {
        let metrics = RoutingMetrics::new().expect("Failed to create metrics");
        metrics
            .dataplane_mutations_total
            .with_label_values(&["add", "standard", "applied"])
            .inc();

        let text = metrics.gather().expect("Failed to gather metrics");
        assert!(text.contains("# HELP"));
        assert!(text.contains("# TYPE"));
        assert!(text.contains("fabric_dataplane_mutations_total{"));
        assert!(text.contains("outcome=\"applied\""));
    }
}
