use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{info, instrument, warn};

use crate::models::{MealOrder, RepositoryError, RepositoryResult};
use crate::observability::StoreObserver;

/// Key-value storage for per-reservation meal orders.
///
/// Each order is one hash keyed by the reservation id, holding
/// `menu_item_id -> quantity`.
#[async_trait]
pub trait MealOrderCache: Send + Sync {
    /// Replace the record for `order.reservation_id` and expire it at `expires_at`.
    ///
    /// The expiry is an absolute deadline, so time spent on the write never
    /// pushes it later. The write and the expiry are separate round trips.
    /// When the expiry fails the record is left without one and
    /// `ConsistencyGap` is returned.
    async fn store_order(
        &self,
        order: &MealOrder,
        expires_at: DateTime<Utc>,
    ) -> RepositoryResult<()>;

    /// `None` when the record was never written or has expired
    async fn get_order(&self, reservation_id: &str) -> RepositoryResult<Option<MealOrder>>;

    /// `None` when the record is missing or carries no expiry
    async fn remaining_ttl(&self, reservation_id: &str) -> RepositoryResult<Option<Duration>>;
}

/// Redis implementation of the MealOrderCache trait
#[derive(Clone)]
pub struct RedisMealOrderCache {
    connection: ConnectionManager,
    observer: StoreObserver,
}

impl RedisMealOrderCache {
    pub fn new(connection: ConnectionManager) -> Self {
        Self {
            connection,
            observer: StoreObserver::default(),
        }
    }

    pub fn with_observer(mut self, observer: StoreObserver) -> Self {
        self.observer = observer;
        self
    }
}

/// PEXPIREAT takes a unix timestamp in milliseconds. Deadlines at or before
/// the epoch become 1 so Redis drops the key at once.
pub(crate) fn expiry_millis(expires_at: DateTime<Utc>) -> i64 {
    expires_at.timestamp_millis().max(1)
}

/// A record written without its expiry.
pub(crate) fn expiry_failed(reservation_id: &str, error: RepositoryError) -> RepositoryError {
    RepositoryError::ConsistencyGap {
        reservation_id: reservation_id.to_string(),
        message: error.to_string(),
    }
}

#[async_trait]
impl MealOrderCache for RedisMealOrderCache {
    #[instrument(skip(self, order), fields(reservation_id = %order.reservation_id, items = order.items.len()))]
    async fn store_order(
        &self,
        order: &MealOrder,
        expires_at: DateTime<Utc>,
    ) -> RepositoryResult<()> {
        if order.is_empty() {
            return Err(RepositoryError::InvalidInput {
                message: "meal order has no items".to_string(),
            });
        }

        let key = order.reservation_id.as_str();
        let fields: Vec<(&str, u32)> = order
            .items
            .iter()
            .map(|(menu_item_id, quantity)| (menu_item_id.as_str(), *quantity))
            .collect();
        let mut connection = self.connection.clone();

        self.observer
            .trace_cache("hset", key, async {
                let written: redis::RedisResult<()> = redis::pipe()
                    .atomic()
                    .del(key)
                    .ignore()
                    .hset_multiple(key, &fields)
                    .ignore()
                    .query_async(&mut connection)
                    .await;
                written.map_err(|e| RepositoryError::from_redis("write meal order", e))
            })
            .await?;

        let expiry_set = self
            .observer
            .trace_cache("pexpireat", key, async {
                connection
                    .pexpire_at::<_, bool>(key, expiry_millis(expires_at))
                    .await
                    .map_err(|e| RepositoryError::from_redis("expire meal order", e))
            })
            .await
            .map_err(|e| expiry_failed(&order.reservation_id, e))?;

        if !expiry_set {
            warn!("Meal order vanished before its expiry could be set");
        }

        info!(expires_at = %expires_at, "Meal order stored");
        Ok(())
    }

    #[instrument(skip(self), fields(reservation_id = %reservation_id))]
    async fn get_order(&self, reservation_id: &str) -> RepositoryResult<Option<MealOrder>> {
        let mut connection = self.connection.clone();

        let items = self
            .observer
            .trace_cache("hgetall", reservation_id, async {
                connection
                    .hgetall::<_, BTreeMap<String, u32>>(reservation_id)
                    .await
                    .map_err(|e| RepositoryError::from_redis("read meal order", e))
            })
            .await?;

        if items.is_empty() {
            return Ok(None);
        }

        Ok(Some(MealOrder {
            reservation_id: reservation_id.to_string(),
            items,
        }))
    }

    #[instrument(skip(self), fields(reservation_id = %reservation_id))]
    async fn remaining_ttl(&self, reservation_id: &str) -> RepositoryResult<Option<Duration>> {
        let mut connection = self.connection.clone();

        // -2 when the key is missing, -1 when it has no expiry
        let millis = self
            .observer
            .trace_cache("pttl", reservation_id, async {
                connection
                    .pttl::<_, i64>(reservation_id)
                    .await
                    .map_err(|e| RepositoryError::from_redis("read meal order ttl", e))
            })
            .await?;

        Ok(u64::try_from(millis)
            .ok()
            .filter(|millis| *millis > 0)
            .map(Duration::from_millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::TimeZone;

    #[test]
    fn test_expiry_millis_is_the_deadline() {
        let deadline = Utc.with_ymd_and_hms(2026, 5, 1, 19, 30, 0).unwrap();
        assert_eq!(expiry_millis(deadline), deadline.timestamp_millis());
        assert_eq!(expiry_millis(Utc.timestamp_opt(0, 0).unwrap()), 1);
    }

    #[test]
    fn test_expiry_failure_becomes_consistency_gap() {
        let cause = RepositoryError::StoreUnavailable {
            store: "redis",
            operation: "expire meal order".to_string(),
            message: "connection reset".to_string(),
        };
        let cause_text = cause.to_string();

        let err = expiry_failed("R1", cause);

        match &err {
            RepositoryError::ConsistencyGap {
                reservation_id,
                message,
            } => {
                assert_eq!(reservation_id, "R1");
                assert!(message.contains(&cause_text));
            }
            other => panic!("Expected ConsistencyGap, got {:?}", other),
        }
        assert!(err.is_retryable());
    }
}
