use uuid::Uuid;

use super::{
    CreateMenuItemRequest, CreateReservationRequest, CreateRestaurantRequest, MealOrderItem,
    MenuItemFilters, OrderMealsRequest, Pagination, ReservationFilters, RestaurantFilters,
    UpdateMenuItemRequest, UpdateReservationRequest, UpdateRestaurantRequest, ValidationError,
    ValidationResult,
};

/// Trait for validating input models
pub trait Validate {
    fn validate(&self) -> ValidationResult<()>;
}

/// Validation constants
pub const MAX_NAME_LENGTH: usize = 255;
pub const MAX_ADDRESS_LENGTH: usize = 500;
pub const MAX_PHONE_NUMBER_LENGTH: usize = 32;
pub const MAX_DESCRIPTION_LENGTH: usize = 2000;
pub const MAX_STATUS_LENGTH: usize = 50;

impl Validate for CreateRestaurantRequest {
    fn validate(&self) -> ValidationResult<()> {
        validate_required("name", &self.name, MAX_NAME_LENGTH)?;
        validate_required("address", &self.address, MAX_ADDRESS_LENGTH)?;
        validate_optional("phone_number", &self.phone_number, MAX_PHONE_NUMBER_LENGTH)?;
        validate_optional("description", &self.description, MAX_DESCRIPTION_LENGTH)?;
        Ok(())
    }
}

impl Validate for UpdateRestaurantRequest {
    fn validate(&self) -> ValidationResult<()> {
        validate_id("id", &self.id)?;
        validate_required("name", &self.name, MAX_NAME_LENGTH)?;
        validate_required("address", &self.address, MAX_ADDRESS_LENGTH)?;
        validate_optional("phone_number", &self.phone_number, MAX_PHONE_NUMBER_LENGTH)?;
        validate_optional("description", &self.description, MAX_DESCRIPTION_LENGTH)?;
        Ok(())
    }
}

impl Validate for RestaurantFilters {
    fn validate(&self) -> ValidationResult<()> {
        validate_pagination(&self.pagination)
    }
}

impl Validate for CreateMenuItemRequest {
    fn validate(&self) -> ValidationResult<()> {
        validate_id("restaurant_id", &self.restaurant_id)?;
        validate_required("name", &self.name, MAX_NAME_LENGTH)?;
        validate_optional("description", &self.description, MAX_DESCRIPTION_LENGTH)?;
        validate_price(self.price)?;
        Ok(())
    }
}

impl Validate for UpdateMenuItemRequest {
    fn validate(&self) -> ValidationResult<()> {
        validate_id("id", &self.id)?;
        validate_id("restaurant_id", &self.restaurant_id)?;
        validate_required("name", &self.name, MAX_NAME_LENGTH)?;
        validate_optional("description", &self.description, MAX_DESCRIPTION_LENGTH)?;
        validate_price(self.price)?;
        Ok(())
    }
}

impl Validate for MenuItemFilters {
    fn validate(&self) -> ValidationResult<()> {
        if let Some(restaurant_id) = &self.restaurant_id {
            validate_id("restaurant_id", restaurant_id)?;
        }
        if let Some(price) = self.price {
            validate_price(price)?;
        }
        validate_pagination(&self.pagination)
    }
}

impl Validate for CreateReservationRequest {
    fn validate(&self) -> ValidationResult<()> {
        validate_id("user_id", &self.user_id)?;
        validate_id("restaurant_id", &self.restaurant_id)?;
        validate_required("status", &self.status, MAX_STATUS_LENGTH)?;
        Ok(())
    }
}

impl Validate for UpdateReservationRequest {
    fn validate(&self) -> ValidationResult<()> {
        validate_id("id", &self.id)?;
        validate_id("user_id", &self.user_id)?;
        validate_id("restaurant_id", &self.restaurant_id)?;
        validate_required("status", &self.status, MAX_STATUS_LENGTH)?;
        Ok(())
    }
}

impl Validate for ReservationFilters {
    fn validate(&self) -> ValidationResult<()> {
        if let Some(restaurant_id) = &self.restaurant_id {
            validate_id("restaurant_id", restaurant_id)?;
        }
        if let Some(user_id) = &self.user_id {
            validate_id("user_id", user_id)?;
        }
        validate_pagination(&self.pagination)
    }
}

impl Validate for MealOrderItem {
    fn validate(&self) -> ValidationResult<()> {
        validate_id("menu_item_id", &self.menu_item_id)?;
        validate_quantity(self.quantity)?;
        Ok(())
    }
}

impl Validate for OrderMealsRequest {
    fn validate(&self) -> ValidationResult<()> {
        validate_id("reservation_id", &self.reservation_id)?;
        if self.meals.is_empty() {
            return Err(ValidationError::RequiredField {
                field: "meals".to_string(),
            });
        }
        for meal in &self.meals {
            meal.validate()?;
        }
        Ok(())
    }
}

/// Validate an identifier: present and UUID-shaped
pub fn validate_id(field: &str, id: &str) -> ValidationResult<()> {
    let trimmed = id.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::RequiredField {
            field: field.to_string(),
        });
    }

    if Uuid::parse_str(trimmed).is_err() {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            expected: "UUID".to_string(),
        });
    }

    Ok(())
}

/// Validate a required free-text field
pub fn validate_required(field: &str, value: &str, max_length: usize) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::RequiredField {
            field: field.to_string(),
        });
    }
    validate_optional(field, value, max_length)
}

/// Validate a free-text field that may be empty
pub fn validate_optional(field: &str, value: &str, max_length: usize) -> ValidationResult<()> {
    let length = value.chars().count();
    if length > max_length {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max_length,
            actual_length: length,
        });
    }

    if value
        .chars()
        .any(|c| c.is_control() && c != '\n' && c != '\r' && c != '\t')
    {
        return Err(ValidationError::InvalidValue {
            field: field.to_string(),
            value: value.to_string(),
            reason: "Contains invalid control characters".to_string(),
        });
    }

    Ok(())
}

pub fn validate_price(price: i64) -> ValidationResult<()> {
    if price < 0 {
        return Err(ValidationError::InvalidValue {
            field: "price".to_string(),
            value: price.to_string(),
            reason: "Price cannot be negative".to_string(),
        });
    }
    Ok(())
}

pub fn validate_quantity(quantity: u32) -> ValidationResult<()> {
    if quantity == 0 {
        return Err(ValidationError::InvalidValue {
            field: "quantity".to_string(),
            value: quantity.to_string(),
            reason: "Quantity must be positive".to_string(),
        });
    }
    Ok(())
}

/// A zero limit is rejected. A zero offset is the first page.
pub fn validate_pagination(pagination: &Pagination) -> ValidationResult<()> {
    if pagination.limit == Some(0) {
        return Err(ValidationError::InvalidValue {
            field: "limit".to_string(),
            value: "0".to_string(),
            reason: "Must be positive when present".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    const RESTAURANT_ID: &str = "a9a9858a-def9-4ab0-9925-a40177cd9b7d";
    const USER_ID: &str = "67188541-6344-42bd-8be2-a14c558d30aa";

    #[test]
    fn test_validate_id() {
        assert!(validate_id("id", RESTAURANT_ID).is_ok());

        assert!(matches!(
            validate_id("id", ""),
            Err(ValidationError::RequiredField { .. })
        ));
        assert!(matches!(
            validate_id("id", "not-a-uuid"),
            Err(ValidationError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn test_validate_required() {
        assert!(validate_required("name", "S", MAX_NAME_LENGTH).is_ok());
        assert!(validate_required("name", "   ", MAX_NAME_LENGTH).is_err());
        assert!(validate_required("name", &"a".repeat(MAX_NAME_LENGTH + 1), MAX_NAME_LENGTH).is_err());
        assert!(validate_required("name", "Test\x00Name", MAX_NAME_LENGTH).is_err());
    }

    #[test]
    fn test_create_restaurant_request_validation() {
        let valid = CreateRestaurantRequest {
            name: "S".to_string(),
            address: "Chilonzor".to_string(),
            phone_number: "991234567".to_string(),
            description: "d".to_string(),
        };
        assert!(valid.validate().is_ok());

        let mut invalid = valid.clone();
        invalid.address = String::new();
        assert!(invalid.validate().is_err());
    }

    #[test]
    fn test_menu_item_price_validation() {
        assert!(validate_price(0).is_ok());
        assert!(validate_price(15000).is_ok());
        assert!(validate_price(-1).is_err());

        let request = CreateMenuItemRequest {
            restaurant_id: RESTAURANT_ID.to_string(),
            name: "Osh".to_string(),
            description: "Plov".to_string(),
            price: -100,
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_reservation_request_validation() {
        let request = CreateReservationRequest {
            user_id: USER_ID.to_string(),
            restaurant_id: RESTAURANT_ID.to_string(),
            reservation_time: Utc::now(),
            status: "Confirmed".to_string(),
        };
        assert!(request.validate().is_ok());

        let mut missing_status = request.clone();
        missing_status.status = " ".to_string();
        assert!(missing_status.validate().is_err());
    }

    #[test]
    fn test_pagination_validation() {
        assert!(validate_pagination(&Pagination::default()).is_ok());
        assert!(validate_pagination(&Pagination::new(10, 20)).is_ok());
        assert!(validate_pagination(&Pagination {
            limit: Some(0),
            offset: None
        })
        .is_err());
        assert!(validate_pagination(&Pagination::new(2, 0)).is_ok());
        assert!(validate_pagination(&Pagination {
            limit: None,
            offset: Some(0)
        })
        .is_ok());
    }

    #[test]
    fn test_order_meals_request_validation() {
        let request = OrderMealsRequest {
            reservation_id: RESTAURANT_ID.to_string(),
            meals: vec![MealOrderItem::new(USER_ID, 2)],
        };
        assert!(request.validate().is_ok());

        let empty = OrderMealsRequest {
            reservation_id: RESTAURANT_ID.to_string(),
            meals: vec![],
        };
        assert!(matches!(
            empty.validate(),
            Err(ValidationError::RequiredField { .. })
        ));

        let zero_quantity = OrderMealsRequest {
            reservation_id: RESTAURANT_ID.to_string(),
            meals: vec![MealOrderItem::new(USER_ID, 0)],
        };
        assert!(zero_quantity.validate().is_err());
    }
}
