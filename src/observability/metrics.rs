use prometheus::{
    CounterVec, Encoder, Gauge, GaugeVec, HistogramOpts, HistogramVec, Opts, Registry,
    TextEncoder,
};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("Failed to register metric: {0}")]
    Registration(#[from] prometheus::Error),
    #[error("Failed to encode metrics: {0}")]
    Encoding(String),
}

/// Metrics collection for the pet listing service
#[derive(Clone)]
pub struct Metrics {
    registry: Registry,

    // HTTP metrics
    pub http_requests_total: CounterVec,
    pub http_request_duration_seconds: HistogramVec,
    pub http_requests_in_flight: GaugeVec,

    // Store metrics
    pub pet_operations_total: CounterVec,
    pub pet_operation_duration_seconds: HistogramVec,
    pub pets_in_store: Gauge,

    // Upload metrics
    pub uploads_total: CounterVec,
    pub upload_bytes_total: CounterVec,
}

impl Metrics {
    /// Create a new metrics instance with all required metrics registered
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        info!("Initializing Prometheus metrics");

        // HTTP metrics
        let http_requests_total = CounterVec::new(
            Opts::new(
                "http_requests_total",
                "Total number of HTTP requests processed",
            ),
            &["method", "endpoint", "status_code"],
        )?;

        let http_request_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "http_request_duration_seconds",
                "HTTP request duration in seconds",
            )
            .buckets(vec![
                0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
            ]),
            &["method", "endpoint"],
        )?;

        let http_requests_in_flight = GaugeVec::new(
            Opts::new(
                "http_requests_in_flight",
                "Number of HTTP requests currently being processed",
            ),
            &["method", "endpoint"],
        )?;

        // Store metrics
        let pet_operations_total = CounterVec::new(
            Opts::new(
                "pet_operations_total",
                "Total number of pet store operations",
            ),
            &["operation", "status"],
        )?;

        let pet_operation_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "pet_operation_duration_seconds",
                "Pet store operation duration in seconds",
            )
            .buckets(vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5]),
            &["operation"],
        )?;

        let pets_in_store = Gauge::new("pets_in_store", "Number of pets currently listed")?;

        // Upload metrics
        let uploads_total = CounterVec::new(
            Opts::new("uploads_total", "Total number of image upload requests"),
            &["outcome"],
        )?;

        let upload_bytes_total = CounterVec::new(
            Opts::new(
                "upload_bytes_total",
                "Total number of bytes written to the upload directory",
            ),
            &["field"],
        )?;

        // Register all metrics
        registry.register(Box::new(http_requests_total.clone()))?;
        registry.register(Box::new(http_request_duration_seconds.clone()))?;
        registry.register(Box::new(http_requests_in_flight.clone()))?;
        registry.register(Box::new(pet_operations_total.clone()))?;
        registry.register(Box::new(pet_operation_duration_seconds.clone()))?;
        registry.register(Box::new(pets_in_store.clone()))?;
        registry.register(Box::new(uploads_total.clone()))?;
        registry.register(Box::new(upload_bytes_total.clone()))?;

        info!("Prometheus metrics initialized successfully");

        Ok(Metrics {
            registry,
            http_requests_total,
            http_request_duration_seconds,
            http_requests_in_flight,
            pet_operations_total,
            pet_operation_duration_seconds,
            pets_in_store,
            uploads_total,
            upload_bytes_total,
        })
    }

    /// Get the metrics registry for exposing metrics endpoint
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Encode all metrics in Prometheus text format
    pub fn encode(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();

        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|e| MetricsError::Encoding(e.to_string()))?;

        String::from_utf8(buffer).map_err(|e| MetricsError::Encoding(e.to_string()))
    }

    /// Record HTTP request metrics
    pub fn record_http_request(
        &self,
        method: &str,
        endpoint: &str,
        status_code: u16,
        duration_seconds: f64,
    ) {
        let status_str = status_code.to_string();

        self.http_requests_total
            .with_label_values(&[method, endpoint, &status_str])
            .inc();

        self.http_request_duration_seconds
            .with_label_values(&[method, endpoint])
            .observe(duration_seconds);
    }

    /// Record a pet store operation
    pub fn record_pet_operation(&self, operation: &str, success: bool, duration_seconds: f64) {
        let status = if success { "success" } else { "error" };

        self.pet_operations_total
            .with_label_values(&[operation, status])
            .inc();

        self.pet_operation_duration_seconds
            .with_label_values(&[operation])
            .observe(duration_seconds);
    }

    /// Set the current collection size
    pub fn set_pets_in_store(&self, count: usize) {
        self.pets_in_store.set(count as f64);
    }

    /// Record an upload request. `outcome` is one of `stored`, `empty`, `error`.
    pub fn record_upload(&self, outcome: &str, bytes: u64) {
        self.uploads_total.with_label_values(&[outcome]).inc();

        if bytes > 0 {
            self.upload_bytes_total
                .with_label_values(&["image"])
                .inc_by(bytes as f64);
        }
    }

    /// Increment in-flight requests
    pub fn increment_in_flight(&self, method: &str, endpoint: &str) {
        self.http_requests_in_flight
            .with_label_values(&[method, endpoint])
            .inc();
    }

    /// Decrement in-flight requests
    pub fn decrement_in_flight(&self, method: &str, endpoint: &str) {
        self.http_requests_in_flight
            .with_label_values(&[method, endpoint])
            .dec();
    }
}
