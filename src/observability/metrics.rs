use prometheus::{
    Encoder, Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry,
    TextEncoder,
};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub discovery_requests_total: IntCounterVec,
    pub discovery_latency_seconds: HistogramVec,
    pub discovery_results: Histogram,
    pub candidate_cache_hits_total: IntCounter,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let discovery_requests_total = IntCounterVec::new(
            Opts::new("discovery_requests_total", "Discovery calls by outcome"),
            &["outcome"],
        )
        .expect("valid discovery_requests_total metric");

        let discovery_latency_seconds = HistogramVec::new(
            HistogramOpts::new(
                "discovery_latency_seconds",
                "Latency of discovery calls in seconds",
            ),
            &["outcome"],
        )
        .expect("valid discovery_latency_seconds metric");

        let discovery_results = Histogram::with_opts(
            HistogramOpts::new("discovery_results", "Ranked listings returned per call")
                .buckets(vec![0.0, 1.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0]),
        )
        .expect("valid discovery_results metric");

        let candidate_cache_hits_total = IntCounter::new(
            "candidate_cache_hits_total",
            "Discovery calls answered from memoized candidates",
        )
        .expect("valid candidate_cache_hits_total metric");

        registry
            .register(Box::new(discovery_requests_total.clone()))
            .expect("register discovery_requests_total");
        registry
            .register(Box::new(discovery_latency_seconds.clone()))
            .expect("register discovery_latency_seconds");
        registry
            .register(Box::new(discovery_results.clone()))
            .expect("register discovery_results");
        registry
            .register(Box::new(candidate_cache_hits_total.clone()))
            .expect("register candidate_cache_hits_total");

        Self {
            registry,
            discovery_requests_total,
            discovery_latency_seconds,
            discovery_results,
            candidate_cache_hits_total,
        }
    }

    pub fn observe_outcome(&self, outcome: &str, elapsed_secs: f64) {
        self.discovery_requests_total
            .with_label_values(&[outcome])
            .inc();
        self.discovery_latency_seconds
            .with_label_values(&[outcome])
            .observe(elapsed_secs);
    }

    pub fn encode(&self) -> Result<String, String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|err| format!("failed to encode metrics: {err}"))?;

        String::from_utf8(buffer).map_err(|err| format!("metrics are not valid utf8: {err}"))
    }
}
