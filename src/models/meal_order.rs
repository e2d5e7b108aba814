use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const ORDER_STATUS_SUCCESS: &str = "success";

/// One requested menu item and its quantity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MealOrderItem {
    pub menu_item_id: String,
    pub quantity: u32,
}

impl MealOrderItem {
    pub fn new(menu_item_id: impl Into<String>, quantity: u32) -> Self {
        Self {
            menu_item_id: menu_item_id.into(),
            quantity,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderMealsRequest {
    pub reservation_id: String,
    pub meals: Vec<MealOrderItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderMealsResponse {
    pub status: String,
}

impl OrderMealsResponse {
    pub fn success() -> Self {
        Self {
            status: ORDER_STATUS_SUCCESS.to_string(),
        }
    }
}

/// Ephemeral per-reservation order state held in the key-value store
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MealOrder {
    pub reservation_id: String,
    /// menu item id -> quantity
    pub items: BTreeMap<String, u32>,
}

impl MealOrder {
    /// Collapse requested meals into a single record. A menu item listed
    /// more than once keeps its last quantity.
    pub fn from_items(reservation_id: impl Into<String>, meals: &[MealOrderItem]) -> Self {
        let items = meals
            .iter()
            .map(|meal| (meal.menu_item_id.clone(), meal.quantity))
            .collect();
        Self {
            reservation_id: reservation_id.into(),
            items,
        }
    }

    pub fn quantity_of(&self, menu_item_id: &str) -> Option<u32> {
        self.items.get(menu_item_id).copied()
    }

    pub fn total_quantity(&self) -> u64 {
        self.items.values().map(|q| u64::from(*q)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_items_last_quantity_wins() {
        let order = MealOrder::from_items(
            "r1",
            &[
                MealOrderItem::new("item-a", 2),
                MealOrderItem::new("item-b", 1),
                MealOrderItem::new("item-a", 5),
            ],
        );

        assert_eq!(order.items.len(), 2);
        assert_eq!(order.quantity_of("item-a"), Some(5));
        assert_eq!(order.quantity_of("item-b"), Some(1));
        assert_eq!(order.total_quantity(), 6);
    }

    #[test]
    fn test_empty_order() {
        let order = MealOrder::from_items("r1", &[]);
        assert!(order.is_empty());
        assert_eq!(order.quantity_of("missing"), None);
    }

    #[test]
    fn test_success_response() {
        assert_eq!(OrderMealsResponse::success().status, "success");
    }
}
