use anyhow::Result;
use prometheus::Registry;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LogFormat;
use crate::metrics::GatewayMetrics;

pub struct Observability {
    pub registry: Registry,
    pub metrics: GatewayMetrics,
}

impl Observability {
    pub fn init(format: LogFormat) -> Result<Self> {
        let registry = Registry::new_custom(Some("stew".into()), None)?;
        let metrics = GatewayMetrics::register(&registry)?;

        let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "gateway=debug,tower_http=debug".into());

        let json = format == LogFormat::Json;
        tracing_subscriber::registry()
            .with(env_filter)
            .with(json.then(|| tracing_subscriber::fmt::layer().json()))
            .with((!json).then(tracing_subscriber::fmt::layer))
            .try_init()?;

        tracing::info!(?format, "Observability stack initialized");
        Ok(Self { registry, metrics })
    }
}
