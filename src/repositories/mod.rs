// Repositories module - data access layer

pub mod meal_order_cache;
pub mod menu_repository;
pub mod query_builder;
pub mod reservation_repository;
pub mod restaurant_repository;


pub use meal_order_cache::{MealOrderCache, RedisMealOrderCache};
pub use menu_repository::{MenuRepository, PgMenuRepository};
pub use query_builder::{rewrite_named_params, BuiltQuery, NamedParams, QueryBuilder, QueryValue};
pub use reservation_repository::{PgReservationRepository, ReservationRepository};
pub use restaurant_repository::{PgRestaurantRepository, RestaurantRepository};
