use prometheus::{
    opts, Encoder, HistogramOpts, HistogramVec, IntCounterVec, Registry, TextEncoder,
};

const LATENCY_BUCKETS: [f64; 12] = [
    0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

/// Gateway collectors, registered once into the registry served at `/metrics`
#[derive(Clone)]
pub struct GatewayMetrics {
    // ── HTTP ────────────────────────────────────────────────────────────────
    http_requests_total: IntCounterVec,
    http_request_duration: HistogramVec,
    // ── Gateway ─────────────────────────────────────────────────────────────
    validation_rejections: IntCounterVec,
    store_failures: IntCounterVec,
}

impl GatewayMetrics {
    pub fn register(r: &Registry) -> prometheus::Result<Self> {
        let metrics = Self {
            http_requests_total: IntCounterVec::new(
                opts!("http_requests_total", "Total HTTP requests"),
                &["method", "path", "status"],
            )?,
            http_request_duration: HistogramVec::new(
                HistogramOpts::new("http_request_duration_seconds", "HTTP request latency")
                    .buckets(LATENCY_BUCKETS.to_vec()),
                &["method", "path"],
            )?,
            validation_rejections: IntCounterVec::new(
                opts!(
                    "validation_rejections_total",
                    "Requests rejected by field validation"
                ),
                &["operation"],
            )?,
            store_failures: IntCounterVec::new(
                opts!("store_failures_total", "Failed stored-procedure calls"),
                &["procedure"],
            )?,
        };

        r.register(Box::new(metrics.http_requests_total.clone()))?;
        r.register(Box::new(metrics.http_request_duration.clone()))?;
        r.register(Box::new(metrics.validation_rejections.clone()))?;
        r.register(Box::new(metrics.store_failures.clone()))?;
        Ok(metrics)
    }

    pub fn observe_http(&self, method: &str, path: &str, status: u16, duration_secs: f64) {
        self.http_requests_total
            .with_label_values(&[method, path, &status.to_string()])
            .inc();
        self.http_request_duration
            .with_label_values(&[method, path])
            .observe(duration_secs);
    }

    pub fn observe_rejection(&self, operation: &str) {
        self.validation_rejections
            .with_label_values(&[operation])
            .inc();
    }

    pub fn observe_store_failure(&self, procedure: &str) {
        self.store_failures.with_label_values(&[procedure]).inc();
    }
}

pub fn gather_metrics(r: &Registry) -> String {
    let encoder = TextEncoder::new();
    let families = r.gather();
    let mut buf = Vec::new();
    encoder.encode(&families, &mut buf).unwrap_or_default();
    String::from_utf8(buf).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_names_prefixed() {
        let registry = Registry::new_custom(Some("test".into()), None).unwrap();
        let metrics = GatewayMetrics::register(&registry).unwrap();
        metrics.observe_http("GET", "/v1/gateway/ip", 200, 0.002);
        metrics.observe_rejection("lookup_ip");
        metrics.observe_store_failure("get_ip_info");

        let families = registry.gather();
        assert_eq!(families.len(), 4);
        for fam in &families {
            assert!(
                fam.get_name().starts_with("test_"),
                "metric {} missing prefix",
                fam.get_name()
            );
        }
    }

    #[test]
    fn test_gather_renders_text_format() {
        let registry = Registry::new_custom(Some("render".into()), None).unwrap();
        let metrics = GatewayMetrics::register(&registry).unwrap();
        metrics.observe_rejection("create_ip");

        let body = gather_metrics(&registry);
        assert!(body.contains(r#"render_validation_rejections_total{operation="create_ip"} 1"#));
    }

    #[test]
    fn test_registries_do_not_share_counts() {
        let first = Registry::new();
        let second = Registry::new();
        let counted = GatewayMetrics::register(&first).unwrap();
        GatewayMetrics::register(&second).unwrap();

        counted.observe_store_failure("add_ip_info");

        assert!(gather_metrics(&first).contains(r#"store_failures_total{procedure="add_ip_info"} 1"#));
        assert!(!gather_metrics(&second).contains("add_ip_info"));
    }
}
