use std::sync::Arc;

use prometheus::Registry;

use crate::metrics::GatewayMetrics;
use crate::store::PlayerStatsStore;
use crate::validation::KnownProtocols;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn PlayerStatsStore>,
    pub protocols: Arc<KnownProtocols>,
    pub registry: Registry,
    pub metrics: GatewayMetrics,
    pub max_body_bytes: usize,
}

impl AppState {
    pub fn new(
        store: Arc<dyn PlayerStatsStore>,
        protocols: KnownProtocols,
        registry: Registry,
        metrics: GatewayMetrics,
        max_body_bytes: usize,
    ) -> Self {
        Self {
            store,
            protocols: Arc::new(protocols),
            registry,
            metrics,
            max_body_bytes,
        }
    }
}
