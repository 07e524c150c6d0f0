//! Domain models and request payloads.
//!
//! Row types stay private to `db`; everything here is what handlers and
//! templates work with. Input types carry a `validate` step that runs at the
//! request boundary, before any repository call.

pub mod order;
pub mod product;
pub mod product_image;
pub mod user;

use thiserror::Error;

pub use order::{CreateOrderInput, CustomerOrder, Order, OrderDetail, OrderItem, UpdateOrderStatusInput};
pub use product::{CreateProductInput, Product, UpdateProductInput};
pub use product_image::{CreateImageInput, ProductImage, UpdateImageInput};
pub use user::{CreateUserInput, LoginInput, NewUser, UpdateUserInput, User, UserChanges, UserResponse};

/// A request payload broke a field rule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Check that `value` has between `min` and `max` characters (inclusive).
pub(crate) fn check_length(
    field: &str,
    value: &str,
    min: usize,
    max: usize,
) -> Result<(), ValidationError> {
    let len = value.chars().count();
    if len < min || len > max {
        return Err(ValidationError(format!(
            "{field} must be between {min} and {max} characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_length_counts_chars_not_bytes() {
        // Four characters, twelve bytes
        assert!(check_length("name", "กขคง", 2, 4).is_ok());
        assert!(check_length("name", "a", 2, 4).is_err());
        let err = check_length("name", "abcde", 2, 4).unwrap_err();
        assert_eq!(err.to_string(), "name must be between 2 and 4 characters");
    }
}
