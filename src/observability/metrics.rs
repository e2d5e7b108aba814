use prometheus::{CounterVec, Encoder, Histogram, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("Failed to register metric: {0}")]
    Registration(#[from] prometheus::Error),
    #[error("Failed to encode metrics: {0}")]
    Encoding(String),
}

/// Store-level metrics for the reservation data layer
#[derive(Clone)]
pub struct Metrics {
    registry: Registry,

    // Relational store
    pub database_operations_total: CounterVec,
    pub database_operation_duration_seconds: HistogramVec,

    // Key-value store
    pub cache_operations_total: CounterVec,
    pub cache_operation_duration_seconds: HistogramVec,

    // Meal orders
    pub meal_orders_total: CounterVec,
    pub meal_order_ttl_seconds: Histogram,
}

impl Metrics {
    /// Create a new metrics instance with all required metrics registered
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        info!("Initializing Prometheus metrics");

        let database_operations_total = CounterVec::new(
            Opts::new(
                "database_operations_total",
                "Total number of relational store operations",
            ),
            &["operation", "table", "status"],
        )?;

        let database_operation_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "database_operation_duration_seconds",
                "Relational store operation duration in seconds",
            )
            .buckets(vec![
                0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0,
            ]),
            &["operation", "table"],
        )?;

        let cache_operations_total = CounterVec::new(
            Opts::new(
                "cache_operations_total",
                "Total number of key-value store operations",
            ),
            &["operation", "status"],
        )?;

        let cache_operation_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "cache_operation_duration_seconds",
                "Key-value store operation duration in seconds",
            )
            .buckets(vec![0.0005, 0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 1.0]),
            &["operation"],
        )?;

        let meal_orders_total = CounterVec::new(
            Opts::new("meal_orders_total", "Total number of meal order attempts"),
            &["status"],
        )?;

        // Minutes to a week
        let meal_order_ttl_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "meal_order_ttl_seconds",
                "Expiry attached to meal order records in seconds",
            )
            .buckets(vec![
                60.0, 300.0, 900.0, 3600.0, 14400.0, 86400.0, 259200.0, 604800.0,
            ]),
        )?;

        registry.register(Box::new(database_operations_total.clone()))?;
        registry.register(Box::new(database_operation_duration_seconds.clone()))?;
        registry.register(Box::new(cache_operations_total.clone()))?;
        registry.register(Box::new(cache_operation_duration_seconds.clone()))?;
        registry.register(Box::new(meal_orders_total.clone()))?;
        registry.register(Box::new(meal_order_ttl_seconds.clone()))?;

        info!("Prometheus metrics initialized successfully");

        Ok(Metrics {
            registry,
            database_operations_total,
            database_operation_duration_seconds,
            cache_operations_total,
            cache_operation_duration_seconds,
            meal_orders_total,
            meal_order_ttl_seconds,
        })
    }

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

    pub fn record_database_operation(
        &self,
        operation: &str,
        table: &str,
        success: bool,
        duration_seconds: f64,
    ) {
        let status = if success { "success" } else { "error" };

        self.database_operations_total
            .with_label_values(&[operation, table, status])
            .inc();

        self.database_operation_duration_seconds
            .with_label_values(&[operation, table])
            .observe(duration_seconds);
    }

    pub fn record_cache_operation(&self, operation: &str, success: bool, duration_seconds: f64) {
        let status = if success { "success" } else { "error" };

        self.cache_operations_total
            .with_label_values(&[operation, status])
            .inc();

        self.cache_operation_duration_seconds
            .with_label_values(&[operation])
            .observe(duration_seconds);
    }

    /// `status` is one of `success`, `invalid`, `not_found`, `elapsed`, `consistency_gap`, `error`
    pub fn record_meal_order(&self, status: &str) {
        self.meal_orders_total.with_label_values(&[status]).inc();
    }

    pub fn record_meal_order_ttl(&self, ttl_seconds: f64) {
        self.meal_order_ttl_seconds.observe(ttl_seconds);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = Metrics::new();
        assert!(metrics.is_ok());
    }

    #[test]
    fn test_database_operation_recording() {
        let metrics = Metrics::new().unwrap();

        metrics.record_database_operation("get", "restaurants", true, 0.050);
        metrics.record_database_operation("update", "reservations", false, 0.100);

        let encoded = metrics.encode().unwrap();
        assert!(encoded.contains("database_operations_total"));
        assert!(encoded.contains("database_operation_duration_seconds"));
        assert!(encoded.contains("table=\"reservations\""));
    }

    #[test]
    fn test_cache_and_meal_order_recording() {
        let metrics = Metrics::new().unwrap();

        metrics.record_cache_operation("hset", true, 0.002);
        metrics.record_meal_order("success");
        metrics.record_meal_order_ttl(600.0);

        let encoded = metrics.encode().unwrap();
        assert!(encoded.contains("cache_operations_total"));
        assert!(encoded.contains("meal_orders_total{status=\"success\"} 1"));
        assert!(encoded.contains("meal_order_ttl_seconds_count 1"));
    }

    #[test]
    fn test_registries_are_independent() {
        let first = Metrics::new().unwrap();
        let second = Metrics::new().unwrap();

        first.record_meal_order("elapsed");

        assert!(!second.encode().unwrap().contains("elapsed"));
    }
}
