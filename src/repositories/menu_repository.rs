use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, info, instrument};

use super::query_builder::{BuiltQuery, QueryBuilder};
use crate::models::{
    validate_id, CreateMenuItemRequest, DeleteResponse, MenuItem, MenuItemFilters,
    RepositoryError, RepositoryResult, UpdateMenuItemRequest, Validate,
};
use crate::observability::StoreObserver;

const TABLE: &str = "menu";
const ENTITY: &str = "menu item";
const COLUMNS: &str =
    "id::text AS id, restaurant_id::text AS restaurant_id, name, description, price";

/// Data access for menu items. Deletes remove the row.
#[async_trait]
pub trait MenuRepository: Send + Sync {
    async fn create(&self, request: CreateMenuItemRequest) -> RepositoryResult<MenuItem>;

    async fn get(&self, id: &str) -> RepositoryResult<MenuItem>;

    async fn list(&self, filters: MenuItemFilters) -> RepositoryResult<Vec<MenuItem>>;

    async fn update(&self, request: UpdateMenuItemRequest) -> RepositoryResult<MenuItem>;

    /// Physical delete. A missing row is not an error.
    async fn delete(&self, id: &str) -> RepositoryResult<DeleteResponse>;
}

/// Postgres implementation of the MenuRepository trait
pub struct PgMenuRepository {
    pool: PgPool,
    observer: StoreObserver,
}

impl PgMenuRepository {
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

pub(crate) fn list_query(filters: &MenuItemFilters) -> BuiltQuery {
    QueryBuilder::new(format!("SELECT {COLUMNS} FROM {TABLE} WHERE true"))
        .filter_opt_as("restaurant_id", "uuid", filters.restaurant_id.clone())
        .filter_opt("name", filters.name.clone())
        .filter_opt("price", filters.price)
        .order_by("created_at, id")
        .paginate(filters.pagination)
        .build()
}

#[async_trait]
impl MenuRepository for PgMenuRepository {
    #[instrument(skip(self, request), fields(table = TABLE, restaurant_id = %request.restaurant_id))]
    async fn create(&self, request: CreateMenuItemRequest) -> RepositoryResult<MenuItem> {
        request.validate()?;

        let item = self
            .observer
            .trace_database("create", TABLE, async {
                sqlx::query_as::<_, MenuItem>(&format!(
                    "INSERT INTO {TABLE} (restaurant_id, name, description, price) \
                     VALUES ($1::uuid, $2, $3, $4) RETURNING {COLUMNS}"
                ))
                .bind(&request.restaurant_id)
                .bind(&request.name)
                .bind(&request.description)
                .bind(request.price)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| RepositoryError::from_sqlx("create menu item", ENTITY, None, e))
            })
            .await?;

        info!(id = %item.id, "Menu item created");
        Ok(item)
    }

    #[instrument(skip(self), fields(table = TABLE, id = %id))]
    async fn get(&self, id: &str) -> RepositoryResult<MenuItem> {
        validate_id("id", id)?;

        self.observer
            .trace_database("get", TABLE, async {
                sqlx::query_as::<_, MenuItem>(&format!(
                    "SELECT {COLUMNS} FROM {TABLE} WHERE id = $1::uuid"
                ))
                .bind(id)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| RepositoryError::from_sqlx("get menu item", ENTITY, Some(id), e))
            })
            .await
    }

    #[instrument(skip(self, filters), fields(table = TABLE))]
    async fn list(&self, filters: MenuItemFilters) -> RepositoryResult<Vec<MenuItem>> {
        filters.validate()?;
        let built = list_query(&filters);
        debug!(sql = %built.sql, args = built.args.len(), "Listing menu items");

        let items = self
            .observer
            .trace_database("list", TABLE, async {
                built
                    .apply_bindings(sqlx::query_as::<_, MenuItem>(&built.sql))
                    .fetch_all(&self.pool)
                    .await
                    .map_err(|e| RepositoryError::from_sqlx("list menu items", ENTITY, None, e))
            })
            .await?;

        info!(count = items.len(), "Menu items listed");
        Ok(items)
    }

    #[instrument(skip(self, request), fields(table = TABLE, id = %request.id))]
    async fn update(&self, request: UpdateMenuItemRequest) -> RepositoryResult<MenuItem> {
        request.validate()?;

        let item = self
            .observer
            .trace_database("update", TABLE, async {
                sqlx::query_as::<_, MenuItem>(&format!(
                    "UPDATE {TABLE} SET restaurant_id = $2::uuid, name = $3, description = $4, \
                     price = $5, updated_at = now() WHERE id = $1::uuid RETURNING {COLUMNS}"
                ))
                .bind(&request.id)
                .bind(&request.restaurant_id)
                .bind(&request.name)
                .bind(&request.description)
                .bind(request.price)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| {
                    RepositoryError::from_sqlx("update menu item", ENTITY, Some(&request.id), e)
                })
            })
            .await?;

        info!("Menu item updated");
        Ok(item)
    }

    #[instrument(skip(self), fields(table = TABLE, id = %id))]
    async fn delete(&self, id: &str) -> RepositoryResult<DeleteResponse> {
        validate_id("id", id)?;

        let affected = self
            .observer
            .trace_database("delete", TABLE, async {
                sqlx::query(&format!("DELETE FROM {TABLE} WHERE id = $1::uuid"))
                    .bind(id)
                    .execute(&self.pool)
                    .await
                    .map(|result| result.rows_affected())
                    .map_err(|e| {
                        RepositoryError::from_sqlx("delete menu item", ENTITY, Some(id), e)
                    })
            })
            .await?;

        if affected == 0 {
            debug!("Menu item did not exist");
        } else {
            info!("Menu item deleted");
        }
        Ok(DeleteResponse::new("Menu item deleted successfully"))
    }
}
