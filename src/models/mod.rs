// Re-export all model types
pub use self::common::*;
pub use self::errors::*;
pub use self::meal_order::*;
pub use self::menu::*;
pub use self::reservation::*;
pub use self::restaurant::*;
pub use self::validation::*;

mod common;
mod errors;
mod meal_order;
mod menu;
mod reservation;
mod restaurant;
mod validation;
