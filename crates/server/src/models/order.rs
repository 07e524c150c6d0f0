//! Order domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shopdesk_core::{
    Money, OrderId, OrderItemId, OrderLine, OrderPlanError, OrderRequest, OrderStatus, Price,
    ProductId, Quantity, UserId,
};

use super::ValidationError;

/// An order header, as returned by list endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Order {
    pub order_id: OrderId,
    pub user_id: UserId,
    pub total_amount: Money,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A persisted order line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderItem {
    pub order_item_id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: Quantity,
    pub price_at_time: Price,
    pub subtotal: Money,
    pub product_name: String,
}

/// An order with its items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

/// An order header with the owning username, for the admin pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomerOrder {
    #[serde(flatten)]
    pub order: Order,
    pub username: String,
}

/// Payload for `POST /orders`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrderInput {
    pub user_id: UserId,
    pub items: Vec<OrderLine>,
}

impl CreateOrderInput {
    /// # Errors
    ///
    /// Returns a `ValidationError` if `items` is empty.
    pub fn into_request(self) -> Result<OrderRequest, ValidationError> {
        OrderRequest::new(self.user_id, self.items).map_err(|e| match e {
            OrderPlanError::EmptyOrder => ValidationError::new("order must contain at least one item"),
            other => ValidationError(other.to_string()),
        })
    }
}

/// Payload for `PUT /orders/{id}` and the admin status form.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct UpdateOrderStatusInput {
    pub status: OrderStatus,
}
