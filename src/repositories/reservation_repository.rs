use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{debug, info, instrument};

use super::query_builder::{BuiltQuery, QueryBuilder};
use crate::models::{
    validate_id, CheckReservationResponse, CreateReservationRequest, DeleteResponse,
    RepositoryError, RepositoryResult, Reservation, ReservationFilters,
    UpdateReservationRequest, Validate,
};
use crate::observability::StoreObserver;

const TABLE: &str = "reservations";
const ENTITY: &str = "reservation";
const COLUMNS: &str = "id::text AS id, user_id::text AS user_id, \
                       restaurant_id::text AS restaurant_id, reservation_time, status";

/// Data access for reservations. Deletes are logical.
#[async_trait]
pub trait ReservationRepository: Send + Sync {
    async fn create(&self, request: CreateReservationRequest) -> RepositoryResult<Reservation>;

    async fn get(&self, id: &str) -> RepositoryResult<Reservation>;

    async fn list(&self, filters: ReservationFilters) -> RepositoryResult<Vec<Reservation>>;

    /// Fails with `NotFound` when the row is missing or logically deleted
    async fn update(&self, request: UpdateReservationRequest) -> RepositoryResult<Reservation>;

    async fn delete(&self, id: &str) -> RepositoryResult<DeleteResponse>;

    /// Whether any reservation row references the restaurant.
    ///
    /// Deleted rows and past reservations count too.
    async fn check_reservation(&self, restaurant_id: &str)
        -> RepositoryResult<CheckReservationResponse>;

    /// Scheduled time of a live reservation
    async fn reservation_time(&self, id: &str) -> RepositoryResult<DateTime<Utc>>;
}

/// Postgres implementation of the ReservationRepository trait
pub struct PgReservationRepository {
    pool: PgPool,
    observer: StoreObserver,
}

impl PgReservationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            observer: StoreObserver::default(),
        }
    }

    pub fn with_observer(mut self, observer: StoreObserver) -> Self {
        self.observer = observer;
        self
    }
}

pub(crate) fn list_query(filters: &ReservationFilters) -> BuiltQuery {
    QueryBuilder::new(format!(
        "SELECT {COLUMNS} FROM {TABLE} WHERE deleted_at = 0"
    ))
    .filter_opt_as("restaurant_id", "uuid", filters.restaurant_id.clone())
    .filter_opt_as("user_id", "uuid", filters.user_id.clone())
    .filter_opt("reservation_time", filters.reservation_time)
    .filter_opt("status", filters.status.clone())
    .order_by("created_at, id")
    .paginate(filters.pagination)
    .build()
}

#[async_trait]
impl ReservationRepository for PgReservationRepository {
    #[instrument(skip(self, request), fields(table = TABLE, restaurant_id = %request.restaurant_id))]
    async fn create(&self, request: CreateReservationRequest) -> RepositoryResult<Reservation> {
        request.validate()?;

        let reservation = self
            .observer
            .trace_database("create", TABLE, async {
                sqlx::query_as::<_, Reservation>(&format!(
                    "INSERT INTO {TABLE} (user_id, restaurant_id, reservation_time, status) \
                     VALUES ($1::uuid, $2::uuid, $3, $4) RETURNING {COLUMNS}"
                ))
                .bind(&request.user_id)
                .bind(&request.restaurant_id)
                .bind(request.reservation_time)
                .bind(&request.status)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| RepositoryError::from_sqlx("create reservation", ENTITY, None, e))
            })
            .await?;

        info!(id = %reservation.id, "Reservation created");
        Ok(reservation)
    }

    #[instrument(skip(self), fields(table = TABLE, id = %id))]
    async fn get(&self, id: &str) -> RepositoryResult<Reservation> {
        validate_id("id", id)?;

        self.observer
            .trace_database("get", TABLE, async {
                sqlx::query_as::<_, Reservation>(&format!(
                    "SELECT {COLUMNS} FROM {TABLE} WHERE id = $1::uuid AND deleted_at = 0"
                ))
                .bind(id)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| RepositoryError::from_sqlx("get reservation", ENTITY, Some(id), e))
            })
            .await
    }

    #[instrument(skip(self, filters), fields(table = TABLE))]
    async fn list(&self, filters: ReservationFilters) -> RepositoryResult<Vec<Reservation>> {
        filters.validate()?;
        let built = list_query(&filters);
        debug!(sql = %built.sql, args = built.args.len(), "Listing reservations");

        let reservations = self
            .observer
            .trace_database("list", TABLE, async {
                built
                    .apply_bindings(sqlx::query_as::<_, Reservation>(&built.sql))
                    .fetch_all(&self.pool)
                    .await
                    .map_err(|e| RepositoryError::from_sqlx("list reservations", ENTITY, None, e))
            })
            .await?;

        info!(count = reservations.len(), "Reservations listed");
        Ok(reservations)
    }

    #[instrument(skip(self, request), fields(table = TABLE, id = %request.id))]
    async fn update(&self, request: UpdateReservationRequest) -> RepositoryResult<Reservation> {
        request.validate()?;

        let reservation = self
            .observer
            .trace_database("update", TABLE, async {
                sqlx::query_as::<_, Reservation>(&format!(
                    "UPDATE {TABLE} SET user_id = $2::uuid, restaurant_id = $3::uuid, \
                     reservation_time = $4, status = $5, updated_at = now() \
                     WHERE id = $1::uuid AND deleted_at = 0 RETURNING {COLUMNS}"
                ))
                .bind(&request.id)
                .bind(&request.user_id)
                .bind(&request.restaurant_id)
                .bind(request.reservation_time)
                .bind(&request.status)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| {
                    RepositoryError::from_sqlx("update reservation", ENTITY, Some(&request.id), e)
                })
            })
            .await?;

        info!("Reservation updated");
        Ok(reservation)
    }

    #[instrument(skip(self), fields(table = TABLE, id = %id))]
    async fn delete(&self, id: &str) -> RepositoryResult<DeleteResponse> {
        validate_id("id", id)?;

        let affected = self
            .observer
            .trace_database("delete", TABLE, async {
                sqlx::query(&format!(
                    "UPDATE {TABLE} SET deleted_at = EXTRACT(EPOCH FROM now())::bigint, \
                     updated_at = now() WHERE id = $1::uuid AND deleted_at = 0"
                ))
                .bind(id)
                .execute(&self.pool)
                .await
                .map(|result| result.rows_affected())
                .map_err(|e| RepositoryError::from_sqlx("delete reservation", ENTITY, Some(id), e))
            })
            .await?;

        if affected == 0 {
            debug!("Reservation already deleted or never existed");
        } else {
            info!("Reservation soft deleted");
        }
        Ok(DeleteResponse::new("Reservation deleted successfully"))
    }

    #[instrument(skip(self), fields(table = TABLE, restaurant_id = %restaurant_id))]
    async fn check_reservation(
        &self,
        restaurant_id: &str,
    ) -> RepositoryResult<CheckReservationResponse> {
        validate_id("restaurant_id", restaurant_id)?;

        let available = self
            .observer
            .trace_database("check", TABLE, async {
                sqlx::query_scalar::<_, bool>(&format!(
                    "SELECT EXISTS (SELECT 1 FROM {TABLE} WHERE restaurant_id = $1::uuid)"
                ))
                .bind(restaurant_id)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| {
                    RepositoryError::from_sqlx("check reservation", ENTITY, Some(restaurant_id), e)
                })
            })
            .await?;

        debug!(available, "Reservation existence checked");
        Ok(CheckReservationResponse { available })
    }

    #[instrument(skip(self), fields(table = TABLE, id = %id))]
    async fn reservation_time(&self, id: &str) -> RepositoryResult<DateTime<Utc>> {
        validate_id("id", id)?;

        self.observer
            .trace_database("get_time", TABLE, async {
                sqlx::query_scalar::<_, DateTime<Utc>>(&format!(
                    "SELECT reservation_time FROM {TABLE} WHERE id = $1::uuid AND deleted_at = 0"
                ))
                .bind(id)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| {
                    RepositoryError::from_sqlx("read reservation time", ENTITY, Some(id), e)
                })
            })
            .await
    }
}
