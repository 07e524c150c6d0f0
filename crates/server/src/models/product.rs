//! Product domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shopdesk_core::{Price, ProductId, Stock};

use super::{ValidationError, check_length};

const NAME_MIN: usize = 2;
const NAME_MAX: usize = 100;

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Product {
    pub product_id: ProductId,
    pub name: String,
    pub description: Option<String>,
    pub price: Price,
    pub stock_quantity: Stock,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload for `POST /products`.
///
/// `price` and `stock_quantity` are validated while deserializing: a price of
/// zero or a negative stock never reaches `validate`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateProductInput {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Price,
    pub stock_quantity: Stock,
}

impl CreateProductInput {
    /// # Errors
    ///
    /// Returns a `ValidationError` if the name is out of bounds.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_name(&self.name)
    }
}

/// Name rule shared by the JSON payloads and the admin product form.
///
/// # Errors
///
/// Returns a `ValidationError` if the trimmed name is out of bounds.
pub fn validate_name(name: &str) -> Result<(), ValidationError> {
    check_length("name", name.trim(), NAME_MIN, NAME_MAX)
}

/// Payload for `PUT /products/{id}`. Absent fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProductInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Price>,
    pub stock_quantity: Option<Stock>,
}

impl UpdateProductInput {
    /// # Errors
    ///
    /// Returns a `ValidationError` if a supplied name is out of bounds.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match &self.name {
            Some(name) => validate_name(name),
            None => Ok(()),
        }
    }

    /// Merge the supplied fields over `current`.
    #[must_use]
    pub fn apply(self, current: Product) -> Product {
        Product {
            name: self.name.map_or(current.name, |n| n.trim().to_owned()),
            description: self.description.or(current.description),
            price: self.price.unwrap_or(current.price),
            stock_quantity: self.stock_quantity.unwrap_or(current.stock_quantity),
            ..current
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    fn product() -> Product {
        Product {
            product_id: ProductId::new(1),
            name: "Desk Lamp".to_owned(),
            description: Some("Warm light".to_owned()),
            price: Price::from_cents(2_500).unwrap(),
            stock_quantity: Stock::new(12).unwrap(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_create_rejects_short_name() {
        let input: CreateProductInput =
            serde_json::from_str(r#"{"name":"A","price":"1.00","stock_quantity":1}"#).unwrap();
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_create_rejects_bad_numbers_while_parsing() {
        assert!(
            serde_json::from_str::<CreateProductInput>(
                r#"{"name":"Lamp","price":"0","stock_quantity":1}"#
            )
            .is_err()
        );
        assert!(
            serde_json::from_str::<CreateProductInput>(
                r#"{"name":"Lamp","price":"1.00","stock_quantity":-1}"#
            )
            .is_err()
        );
    }

    #[test]
    fn test_update_merges_only_supplied_fields() {
        let update: UpdateProductInput = serde_json::from_str(r#"{"price":"19.999"}"#).unwrap();
        let merged = update.apply(product());

        assert_eq!(merged.name, "Desk Lamp");
        assert_eq!(merged.description.as_deref(), Some("Warm light"));
        assert_eq!(merged.stock_quantity.get(), 12);
        assert_eq!(merged.price.amount(), Decimal::new(2_000, 2));
    }
}
