pub mod config;
pub mod models;
pub mod observability;
pub mod repositories;
pub mod services;

pub use config::{Config, ConfigError, Connections};
pub use models::{RepositoryError, RepositoryResult};
pub use observability::{init_observability, shutdown_observability, Metrics, StoreObserver};
pub use repositories::{
    MealOrderCache, MenuRepository, PgMenuRepository, PgReservationRepository,
    PgRestaurantRepository, RedisMealOrderCache, ReservationRepository, RestaurantRepository,
};
pub use services::MealOrderService;
