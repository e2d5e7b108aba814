use serde::{Deserialize, Serialize};

use super::Pagination;

/// A menu item. Menu items have no soft-delete marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct MenuItem {
    pub id: String,
    pub restaurant_id: String,
    pub name: String,
    pub description: String,
    /// Price in the smallest currency unit
    pub price: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMenuItemRequest {
    pub restaurant_id: String,
    pub name: String,
    pub description: String,
    pub price: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateMenuItemRequest {
    pub id: String,
    pub restaurant_id: String,
    pub name: String,
    pub description: String,
    pub price: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MenuItemFilters {
    pub restaurant_id: Option<String>,
    pub name: Option<String>,
    pub price: Option<i64>,
    #[serde(default)]
    pub pagination: Pagination,
}
