use chrono::Utc;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::models::{
    time_until, validate_id, MealOrder, OrderMealsRequest, OrderMealsResponse, RepositoryError,
    RepositoryResult, Validate,
};
use crate::observability::StoreObserver;
use crate::repositories::{MealOrderCache, ReservationRepository};

/// Places meal orders against reservations.
///
/// The reservation's scheduled time is read from the relational store and
/// becomes the expiry of the key-value record, so an order never outlives
/// its reservation.
pub struct MealOrderService {
    reservations: Arc<dyn ReservationRepository>,
    cache: Arc<dyn MealOrderCache>,
    observer: StoreObserver,
}

impl MealOrderService {
    pub fn new(
        reservations: Arc<dyn ReservationRepository>,
        cache: Arc<dyn MealOrderCache>,
    ) -> Self {
        Self {
            reservations,
            cache,
            observer: StoreObserver::default(),
        }
    }

    pub fn with_observer(mut self, observer: StoreObserver) -> Self {
        self.observer = observer;
        self
    }

    /// Store the requested meals for a reservation, expiring at its scheduled time.
    ///
    /// Rejected with `ReservationElapsed` before any write once that time has
    /// passed. A failure to set the expiry after the write is `ConsistencyGap`;
    /// nothing is rolled back or retried.
    #[instrument(skip(self, request), fields(reservation_id = %request.reservation_id, meals = request.meals.len()))]
    pub async fn order_meals(&self, request: OrderMealsRequest) -> RepositoryResult<OrderMealsResponse> {
        let result = self.place_order(&request).await;
        self.observer.record_meal_order(outcome(&result));
        result
    }

    async fn place_order(&self, request: &OrderMealsRequest) -> RepositoryResult<OrderMealsResponse> {
        request.validate()?;

        let reservation_time = self
            .reservations
            .reservation_time(&request.reservation_id)
            .await?;

        let Some(ttl) = time_until(reservation_time, Utc::now()) else {
            warn!(%reservation_time, "Refusing meal order for elapsed reservation");
            return Err(RepositoryError::ReservationElapsed {
                reservation_id: request.reservation_id.clone(),
                reservation_time,
            });
        };

        let order = MealOrder::from_items(&request.reservation_id, &request.meals);
        self.cache.store_order(&order, reservation_time).await?;
        self.observer.record_meal_order_ttl(ttl);

        info!(
            ttl_secs = ttl.as_secs(),
            total_quantity = order.total_quantity(),
            "Meal order placed"
        );
        Ok(OrderMealsResponse::success())
    }

    /// The stored order, or `None` once it has expired
    #[instrument(skip(self))]
    pub async fn get_order(&self, reservation_id: &str) -> RepositoryResult<Option<MealOrder>> {
        validate_id("reservation_id", reservation_id)?;
        self.cache.get_order(reservation_id).await
    }
}

fn outcome<T>(result: &RepositoryResult<T>) -> &'static str {
    match result {
        Ok(_) => "success",
        Err(RepositoryError::NotFound { .. }) => "not_found",
        Err(RepositoryError::ReservationElapsed { .. }) => "elapsed",
        Err(RepositoryError::ConsistencyGap { .. }) => "consistency_gap",
        Err(RepositoryError::InvalidInput { .. }) => "invalid",
        Err(_) => "error",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        CheckReservationResponse, CreateReservationRequest, DeleteResponse, MealOrderItem,
        Reservation, ReservationFilters, UpdateReservationRequest,
    };
    use crate::observability::Metrics;
    use async_trait::async_trait;
    use chrono::{DateTime, Duration as ChronoDuration};
    use mockall::mock;
    use mockall::predicate::eq;
    use std::sync::Mutex;
    use std::time::Duration;

    const RESERVATION_ID: &str = "e93dc146-97dc-417c-b312-f0f1f349ee78";
    const ITEM_A: &str = "903cca44-1f9e-487f-9529-ecc06173f042";
    const ITEM_B: &str = "1b4e28ba-2fa1-11d2-883f-0016d3cca427";

    mock! {
        TestReservationRepository {}

        #[async_trait]
        impl ReservationRepository for TestReservationRepository {
            async fn create(&self, request: CreateReservationRequest) -> Result<Reservation, RepositoryError>;
            async fn get(&self, id: &str) -> Result<Reservation, RepositoryError>;
            async fn list(&self, filters: ReservationFilters) -> Result<Vec<Reservation>, RepositoryError>;
            async fn update(&self, request: UpdateReservationRequest) -> Result<Reservation, RepositoryError>;
            async fn delete(&self, id: &str) -> Result<DeleteResponse, RepositoryError>;
            async fn check_reservation(&self, restaurant_id: &str) -> Result<CheckReservationResponse, RepositoryError>;
            async fn reservation_time(&self, id: &str) -> Result<DateTime<Utc>, RepositoryError>;
        }
    }

    mock! {
        TestMealOrderCache {}

        #[async_trait]
        impl MealOrderCache for TestMealOrderCache {
            async fn store_order(&self, order: &MealOrder, expires_at: DateTime<Utc>) -> Result<(), RepositoryError>;
            async fn get_order(&self, reservation_id: &str) -> Result<Option<MealOrder>, RepositoryError>;
            async fn remaining_ttl(&self, reservation_id: &str) -> Result<Option<Duration>, RepositoryError>;
        }
    }

    fn order_request(meals: Vec<MealOrderItem>) -> OrderMealsRequest {
        OrderMealsRequest {
            reservation_id: RESERVATION_ID.to_string(),
            meals,
        }
    }

    fn reservations_at(time: DateTime<Utc>) -> MockTestReservationRepository {
        let mut reservations = MockTestReservationRepository::new();
        reservations
            .expect_reservation_time()
            .with(eq(RESERVATION_ID))
            .times(1)
            .returning(move |_| Ok(time));
        reservations
    }

    #[tokio::test]
    async fn test_order_meals_expires_at_reservation_time() {
        let reservation_time = Utc::now() + ChronoDuration::minutes(10);
        let reservations = reservations_at(reservation_time);
        let stored: Arc<Mutex<Option<(MealOrder, DateTime<Utc>)>>> = Arc::new(Mutex::new(None));

        let mut cache = MockTestMealOrderCache::new();
        let captured = stored.clone();
        cache
            .expect_store_order()
            .times(1)
            .returning(move |order, expires_at| {
                *captured.lock().unwrap() = Some((order.clone(), expires_at));
                Ok(())
            });

        let service = MealOrderService::new(Arc::new(reservations), Arc::new(cache));
        let response = service
            .order_meals(order_request(vec![MealOrderItem::new(ITEM_A, 2)]))
            .await
            .unwrap();
        assert_eq!(response, OrderMealsResponse::success());

        let (order, expires_at) = stored.lock().unwrap().take().unwrap();
        assert_eq!(order.reservation_id, RESERVATION_ID);
        assert_eq!(order.quantity_of(ITEM_A), Some(2));
        // The deadline is the reservation itself, however long the write takes.
        assert!(expires_at <= reservation_time);
        assert_eq!(expires_at, reservation_time);
    }

    #[tokio::test]
    async fn test_duplicate_items_keep_last_quantity() {
        let reservations = reservations_at(Utc::now() + ChronoDuration::hours(2));

        let mut cache = MockTestMealOrderCache::new();
        cache
            .expect_store_order()
            .withf(|order, _| {
                order.items.len() == 2
                    && order.quantity_of(ITEM_A) == Some(5)
                    && order.quantity_of(ITEM_B) == Some(1)
            })
            .times(1)
            .returning(|_, _| Ok(()));

        let service = MealOrderService::new(Arc::new(reservations), Arc::new(cache));
        let result = service
            .order_meals(order_request(vec![
                MealOrderItem::new(ITEM_A, 2),
                MealOrderItem::new(ITEM_B, 1),
                MealOrderItem::new(ITEM_A, 5),
            ]))
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_missing_reservation_writes_nothing() {
        let mut reservations = MockTestReservationRepository::new();
        reservations
            .expect_reservation_time()
            .times(1)
            .returning(|id| Err(RepositoryError::not_found("reservation", id)));

        let mut cache = MockTestMealOrderCache::new();
        cache.expect_store_order().never();

        let metrics = Arc::new(Metrics::new().unwrap());
        let service = MealOrderService::new(Arc::new(reservations), Arc::new(cache))
            .with_observer(StoreObserver::new(metrics.clone()));

        let result = service
            .order_meals(order_request(vec![MealOrderItem::new(ITEM_A, 1)]))
            .await;

        assert!(result.unwrap_err().is_not_found());
        assert!(metrics
            .encode()
            .unwrap()
            .contains("meal_orders_total{status=\"not_found\"} 1"));
    }

    #[tokio::test]
    async fn test_elapsed_reservation_rejected_before_write() {
        let reservations = reservations_at(Utc::now() - ChronoDuration::minutes(1));

        let mut cache = MockTestMealOrderCache::new();
        cache.expect_store_order().never();

        let service = MealOrderService::new(Arc::new(reservations), Arc::new(cache));
        let result = service
            .order_meals(order_request(vec![MealOrderItem::new(ITEM_A, 1)]))
            .await;

        match result {
            Err(RepositoryError::ReservationElapsed { reservation_id, .. }) => {
                assert_eq!(reservation_id, RESERVATION_ID);
            }
            other => panic!("Expected ReservationElapsed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_consistency_gap_is_surfaced() {
        let reservations = reservations_at(Utc::now() + ChronoDuration::minutes(30));

        let mut cache = MockTestMealOrderCache::new();
        cache.expect_store_order().times(1).returning(|order, _| {
            Err(RepositoryError::ConsistencyGap {
                reservation_id: order.reservation_id.clone(),
                message: "connection dropped".to_string(),
            })
        });

        let metrics = Arc::new(Metrics::new().unwrap());
        let service = MealOrderService::new(Arc::new(reservations), Arc::new(cache))
            .with_observer(StoreObserver::new(metrics.clone()));

        let err = service
            .order_meals(order_request(vec![MealOrderItem::new(ITEM_A, 1)]))
            .await
            .unwrap_err();

        assert!(err.is_retryable());
        assert!(matches!(err, RepositoryError::ConsistencyGap { .. }));
        assert!(metrics
            .encode()
            .unwrap()
            .contains("meal_orders_total{status=\"consistency_gap\"} 1"));
    }

    #[tokio::test]
    async fn test_invalid_request_touches_no_store() {
        let mut reservations = MockTestReservationRepository::new();
        reservations.expect_reservation_time().never();
        let mut cache = MockTestMealOrderCache::new();
        cache.expect_store_order().never();

        let service = MealOrderService::new(Arc::new(reservations), Arc::new(cache));

        let empty = service.order_meals(order_request(vec![])).await;
        assert!(matches!(empty, Err(RepositoryError::InvalidInput { .. })));

        let zero = service
            .order_meals(order_request(vec![MealOrderItem::new(ITEM_A, 0)]))
            .await;
        assert!(matches!(zero, Err(RepositoryError::InvalidInput { .. })));
    }

    #[tokio::test]
    async fn test_get_order_reads_cache() {
        let reservations = MockTestReservationRepository::new();
        let mut cache = MockTestMealOrderCache::new();
        cache
            .expect_get_order()
            .with(eq(RESERVATION_ID))
            .times(1)
            .returning(|id| {
                Ok(Some(MealOrder::from_items(id, &[MealOrderItem::new(ITEM_A, 3)])))
            });

        let service = MealOrderService::new(Arc::new(reservations), Arc::new(cache));
        let order = service.get_order(RESERVATION_ID).await.unwrap().unwrap();

        assert_eq!(order.quantity_of(ITEM_A), Some(3));
        assert!(service.get_order("R1").await.is_err());
    }
}
