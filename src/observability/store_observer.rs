use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, Instrument};

use super::Metrics;
use crate::models::RepositoryResult;

/// Observer handed to each repository and cache at construction.
///
/// Wraps every store round trip in a client span, logs its outcome and, when
/// metrics are attached, records counters and latency histograms. A default
/// observer only traces.
#[derive(Clone, Default)]
pub struct StoreObserver {
    metrics: Option<Arc<Metrics>>,
}

impl StoreObserver {
    pub fn new(metrics: Arc<Metrics>) -> Self {
        Self {
            metrics: Some(metrics),
        }
    }

    pub fn metrics(&self) -> Option<&Arc<Metrics>> {
        self.metrics.as_ref()
    }

    /// Trace a relational store operation
    pub async fn trace_database<F, T>(
        &self,
        operation: &str,
        table: &str,
        future: F,
    ) -> RepositoryResult<T>
    where
        F: Future<Output = RepositoryResult<T>>,
    {
        let span = tracing::info_span!(
            "postgres",
            "db.system" = "postgresql",
            "db.operation" = operation,
            "db.sql.table" = table,
            "otel.kind" = "client",
            "otel.name" = format!("{}.{}", table, operation),
        );

        let start_time = Instant::now();
        let result = future.instrument(span.clone()).await;
        let elapsed = start_time.elapsed();

        if let Some(metrics) = &self.metrics {
            metrics.record_database_operation(
                operation,
                table,
                result.is_ok(),
                elapsed.as_secs_f64(),
            );
        }

        let _entered = span.enter();
        match &result {
            Ok(_) => info!(
                duration_ms = elapsed.as_millis(),
                "Database operation completed successfully"
            ),
            Err(e) if e.is_not_found() => info!(
                duration_ms = elapsed.as_millis(),
                "Database operation matched no rows"
            ),
            Err(e) => error!(
                error = %e,
                duration_ms = elapsed.as_millis(),
                "Database operation failed"
            ),
        }

        result
    }

    /// Trace a key-value store operation
    pub async fn trace_cache<F, T>(&self, operation: &str, key: &str, future: F) -> RepositoryResult<T>
    where
        F: Future<Output = RepositoryResult<T>>,
    {
        let span = tracing::info_span!(
            "redis",
            "db.system" = "redis",
            "db.operation" = operation,
            "db.redis.key" = key,
            "otel.kind" = "client",
            "otel.name" = format!("redis.{}", operation),
        );

        let start_time = Instant::now();
        let result = future.instrument(span.clone()).await;
        let elapsed = start_time.elapsed();

        if let Some(metrics) = &self.metrics {
            metrics.record_cache_operation(operation, result.is_ok(), elapsed.as_secs_f64());
        }

        let _entered = span.enter();
        match &result {
            Ok(_) => info!(
                duration_ms = elapsed.as_millis(),
                "Cache operation completed successfully"
            ),
            Err(e) => error!(
                error = %e,
                duration_ms = elapsed.as_millis(),
                "Cache operation failed"
            ),
        }

        result
    }

    pub fn record_meal_order(&self, status: &str) {
        if let Some(metrics) = &self.metrics {
            metrics.record_meal_order(status);
        }
    }

    pub fn record_meal_order_ttl(&self, ttl: Duration) {
        if let Some(metrics) = &self.metrics {
            metrics.record_meal_order_ttl(ttl.as_secs_f64());
        }
    }
}
