// Services module - sequencing across stores

pub mod meal_order_service;

pub use meal_order_service::MealOrderService;
