use prometheus::{
    Counter, CounterVec, Encoder, Gauge, GaugeVec, HistogramOpts, HistogramVec, Opts, Registry,
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

/// Metrics collection for the ordering service
#[derive(Clone)]
pub struct Metrics {
    registry: Registry,

    // HTTP metrics
    pub http_requests_total: CounterVec,
    pub http_request_duration_seconds: HistogramVec,
    pub http_requests_in_flight: GaugeVec,

    // Business logic metrics
    pub order_operations_total: CounterVec,
    pub age_gate_checks_total: CounterVec,
    pub orders_submitted_total: Counter,

    // Session metrics
    pub active_sessions: Gauge,
    pub sessions_purged_total: Counter,
}

impl Metrics {
    /// Create a new metrics instance with all required metrics registered
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        info!("Initializing Prometheus metrics");

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

        let order_operations_total = CounterVec::new(
            Opts::new(
                "order_operations_total",
                "Total number of order workflow operations",
            ),
            &["operation", "status"],
        )?;

        let age_gate_checks_total = CounterVec::new(
            Opts::new(
                "age_gate_checks_total",
                "Total number of order submissions by age gate outcome",
            ),
            &["outcome"],
        )?;

        let orders_submitted_total = Counter::new(
            "orders_submitted_total",
            "Total number of orders completed",
        )?;

        let active_sessions = Gauge::new("active_sessions", "Number of live order sessions")?;

        let sessions_purged_total = Counter::new(
            "sessions_purged_total",
            "Total number of idle order sessions purged",
        )?;

        registry.register(Box::new(http_requests_total.clone()))?;
        registry.register(Box::new(http_request_duration_seconds.clone()))?;
        registry.register(Box::new(http_requests_in_flight.clone()))?;
        registry.register(Box::new(order_operations_total.clone()))?;
        registry.register(Box::new(age_gate_checks_total.clone()))?;
        registry.register(Box::new(orders_submitted_total.clone()))?;
        registry.register(Box::new(active_sessions.clone()))?;
        registry.register(Box::new(sessions_purged_total.clone()))?;

        info!("Prometheus metrics initialized successfully");

        Ok(Metrics {
            registry,
            http_requests_total,
            http_request_duration_seconds,
            http_requests_in_flight,
            order_operations_total,
            age_gate_checks_total,
            orders_submitted_total,
            active_sessions,
            sessions_purged_total,
        })
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

    /// Record order operation metrics
    pub fn record_order_operation(&self, operation: &str, success: bool) {
        let status = if success { "success" } else { "error" };

        self.order_operations_total
            .with_label_values(&[operation, status])
            .inc();
    }

    /// Record the outcome of an age gate check
    pub fn record_age_gate(&self, outcome: &str) {
        self.age_gate_checks_total
            .with_label_values(&[outcome])
            .inc();
    }

    pub fn record_order_submitted(&self) {
        self.orders_submitted_total.inc();
    }

    pub fn set_active_sessions(&self, count: usize) {
        self.active_sessions.set(count as f64);
    }

    pub fn record_sessions_purged(&self, count: usize) {
        self.sessions_purged_total.inc_by(count as f64);
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
