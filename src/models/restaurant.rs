use serde::{Deserialize, Serialize};

use super::Pagination;

/// A restaurant row. Soft-deleted rows are never returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Restaurant {
    pub id: String,
    pub name: String,
    pub address: String,
    pub phone_number: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRestaurantRequest {
    pub name: String,
    pub address: String,
    pub phone_number: String,
    pub description: String,
}

/// Full replacement of a restaurant's fields
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateRestaurantRequest {
    pub id: String,
    pub name: String,
    pub address: String,
    pub phone_number: String,
    pub description: String,
}

/// Filters for listing restaurants; every present filter must match
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RestaurantFilters {
    pub name: Option<String>,
    pub address: Option<String>,
    #[serde(default)]
    pub pagination: Pagination,
}
