use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, info, instrument};

use super::query_builder::{BuiltQuery, QueryBuilder};
use crate::models::{
    validate_id, CreateRestaurantRequest, DeleteResponse, RepositoryError, RepositoryResult,
    Restaurant, RestaurantFilters, UpdateRestaurantRequest, Validate,
};
use crate::observability::StoreObserver;

const TABLE: &str = "restaurants";
const ENTITY: &str = "restaurant";
const COLUMNS: &str = "id::text AS id, name, address, phone_number, description";

/// Data access for restaurants. Deletes are logical.
#[async_trait]
pub trait RestaurantRepository: Send + Sync {
    async fn create(&self, request: CreateRestaurantRequest) -> RepositoryResult<Restaurant>;

    /// Fails with `NotFound` when no live row has this id
    async fn get(&self, id: &str) -> RepositoryResult<Restaurant>;

    async fn list(&self, filters: RestaurantFilters) -> RepositoryResult<Vec<Restaurant>>;

    /// Replace every field of a live row
    async fn update(&self, request: UpdateRestaurantRequest) -> RepositoryResult<Restaurant>;

    /// Stamp `deleted_at`. Deleting an already deleted row succeeds.
    async fn delete(&self, id: &str) -> RepositoryResult<DeleteResponse>;
}

/// Postgres implementation of the RestaurantRepository trait
pub struct PgRestaurantRepository {
    pool: PgPool,
    observer: StoreObserver,
}

impl PgRestaurantRepository {
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

pub(crate) fn list_query(filters: &RestaurantFilters) -> BuiltQuery {
    QueryBuilder::new(format!(
        "SELECT {COLUMNS} FROM {TABLE} WHERE deleted_at = 0"
    ))
    .filter_opt("name", filters.name.clone())
    .filter_opt("address", filters.address.clone())
    .order_by("created_at, id")
    .paginate(filters.pagination)
    .build()
}

#[async_trait]
impl RestaurantRepository for PgRestaurantRepository {
    #[instrument(skip(self, request), fields(table = TABLE, name = %request.name))]
    async fn create(&self, request: CreateRestaurantRequest) -> RepositoryResult<Restaurant> {
        request.validate()?;

        let restaurant = self
            .observer
            .trace_database("create", TABLE, async {
                sqlx::query_as::<_, Restaurant>(&format!(
                    "INSERT INTO {TABLE} (name, address, phone_number, description) \
                     VALUES ($1, $2, $3, $4) RETURNING {COLUMNS}"
                ))
                .bind(&request.name)
                .bind(&request.address)
                .bind(&request.phone_number)
                .bind(&request.description)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| RepositoryError::from_sqlx("create restaurant", ENTITY, None, e))
            })
            .await?;

        info!(id = %restaurant.id, "Restaurant created");
        Ok(restaurant)
    }

    #[instrument(skip(self), fields(table = TABLE, id = %id))]
    async fn get(&self, id: &str) -> RepositoryResult<Restaurant> {
        validate_id("id", id)?;

        self.observer
            .trace_database("get", TABLE, async {
                sqlx::query_as::<_, Restaurant>(&format!(
                    "SELECT {COLUMNS} FROM {TABLE} WHERE id = $1::uuid AND deleted_at = 0"
                ))
                .bind(id)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| RepositoryError::from_sqlx("get restaurant", ENTITY, Some(id), e))
            })
            .await
    }

    #[instrument(skip(self, filters), fields(table = TABLE))]
    async fn list(&self, filters: RestaurantFilters) -> RepositoryResult<Vec<Restaurant>> {
        filters.validate()?;
        let built = list_query(&filters);
        debug!(sql = %built.sql, args = built.args.len(), "Listing restaurants");

        let restaurants = self
            .observer
            .trace_database("list", TABLE, async {
                built
                    .apply_bindings(sqlx::query_as::<_, Restaurant>(&built.sql))
                    .fetch_all(&self.pool)
                    .await
                    .map_err(|e| RepositoryError::from_sqlx("list restaurants", ENTITY, None, e))
            })
            .await?;

        info!(count = restaurants.len(), "Restaurants listed");
        Ok(restaurants)
    }

    #[instrument(skip(self, request), fields(table = TABLE, id = %request.id))]
    async fn update(&self, request: UpdateRestaurantRequest) -> RepositoryResult<Restaurant> {
        request.validate()?;

        let restaurant = self
            .observer
            .trace_database("update", TABLE, async {
                sqlx::query_as::<_, Restaurant>(&format!(
                    "UPDATE {TABLE} SET name = $2, address = $3, phone_number = $4, \
                     description = $5, updated_at = now() \
                     WHERE id = $1::uuid AND deleted_at = 0 RETURNING {COLUMNS}"
                ))
                .bind(&request.id)
                .bind(&request.name)
                .bind(&request.address)
                .bind(&request.phone_number)
                .bind(&request.description)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| {
                    RepositoryError::from_sqlx("update restaurant", ENTITY, Some(&request.id), e)
                })
            })
            .await?;

        info!("Restaurant updated");
        Ok(restaurant)
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
                .map_err(|e| RepositoryError::from_sqlx("delete restaurant", ENTITY, Some(id), e))
            })
            .await?;

        if affected == 0 {
            debug!("Restaurant already deleted or never existed");
        } else {
            info!("Restaurant soft deleted");
        }
        Ok(DeleteResponse::new("Restaurant deleted successfully"))
    }
}
