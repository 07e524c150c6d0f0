//! Order repository: placement and status transitions.
//!
//! Both workflows run inside a single transaction. Dropping the transaction
//! on any early return rolls it back, so a failed order leaves no order row,
//! no item rows and no stock change behind.
//!
//! # Locking
//!
//! Placement locks every referenced product row (`FOR UPDATE`, ascending id)
//! before checking stock, then decrements with a conditional `UPDATE` that
//! refuses to go below zero. Status changes lock the order row so two
//! concurrent cancellations cannot both return stock.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use thiserror::Error;

use shopdesk_core::{
    Money, OrderId, OrderItemId, OrderPlan, OrderPlanError, OrderRequest, OrderStatus, Price,
    ProductId, ProductSnapshot, Quantity, Stock, StatusTransition, TransitionError, UserId,
};

use super::{RepositoryError, parse_column};
use crate::models::{CustomerOrder, Order, OrderDetail, OrderItem};

/// Errors from the order workflows.
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("Product with ID {0} not found")]
    ProductNotFound(ProductId),

    #[error(
        "Not enough stock for product {product_name} (requested {requested}, available {available})"
    )]
    InsufficientStock {
        product_id: ProductId,
        product_name: String,
        requested: Quantity,
        available: Stock,
    },

    #[error("Order with ID {0} not found")]
    OrderNotFound(OrderId),

    #[error("User with ID {0} not found")]
    UserNotFound(UserId),

    #[error(transparent)]
    InvalidStatusTransition(#[from] TransitionError),

    /// The request passed field validation but cannot form an order
    /// (empty, or an amount too large for the store).
    #[error("{0}")]
    Invalid(String),

    #[error("data corruption: {0}")]
    DataCorruption(String),

    #[error("store unavailable: {0}")]
    StoreUnavailable(#[from] sqlx::Error),
}

impl From<OrderPlanError> for OrderError {
    fn from(err: OrderPlanError) -> Self {
        match err {
            OrderPlanError::ProductNotFound(id) => Self::ProductNotFound(id),
            OrderPlanError::InsufficientStock {
                product_id,
                product_name,
                requested,
                available,
            } => Self::InsufficientStock {
                product_id,
                product_name,
                requested,
                available,
            },
            OrderPlanError::EmptyOrder | OrderPlanError::Amount(_) => Self::Invalid(err.to_string()),
        }
    }
}

impl From<RepositoryError> for OrderError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Database(e) => Self::StoreUnavailable(e),
            other => Self::DataCorruption(other.to_string()),
        }
    }
}

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    order_id: i32,
    user_id: i32,
    total_amount: Decimal,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = RepositoryError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let total_amount = Money::new(row.total_amount).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid total for order {}: {e}", row.order_id))
        })?;

        Ok(Self {
            order_id: OrderId::new(row.order_id),
            user_id: UserId::new(row.user_id),
            total_amount,
            status: parse_column::<OrderStatus>(&row.status, "status")?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    order_item_id: i32,
    order_id: i32,
    product_id: i32,
    quantity: i32,
    price_at_time: Decimal,
    subtotal: Decimal,
    product_name: String,
}

impl TryFrom<OrderItemRow> for OrderItem {
    type Error = RepositoryError;

    fn try_from(row: OrderItemRow) -> Result<Self, Self::Error> {
        let corrupt = |what: &str, e: &dyn std::fmt::Display| {
            RepositoryError::DataCorruption(format!(
                "invalid {what} for order item {}: {e}",
                row.order_item_id
            ))
        };

        Ok(Self {
            order_item_id: OrderItemId::new(row.order_item_id),
            order_id: OrderId::new(row.order_id),
            product_id: ProductId::new(row.product_id),
            quantity: Quantity::new(row.quantity).map_err(|e| corrupt("quantity", &e))?,
            price_at_time: Price::new(row.price_at_time).map_err(|e| corrupt("price_at_time", &e))?,
            subtotal: Money::new(row.subtotal).map_err(|e| corrupt("subtotal", &e))?,
            product_name: row.product_name,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ProductStockRow {
    product_id: i32,
    name: String,
    price: Decimal,
    stock_quantity: i32,
}

impl TryFrom<ProductStockRow> for ProductSnapshot {
    type Error = RepositoryError;

    fn try_from(row: ProductStockRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: ProductId::new(row.product_id),
            price: Price::new(row.price).map_err(|e| {
                RepositoryError::DataCorruption(format!(
                    "invalid price for product {}: {e}",
                    row.product_id
                ))
            })?,
            stock: Stock::new(row.stock_quantity).map_err(|e| {
                RepositoryError::DataCorruption(format!(
                    "invalid stock for product {}: {e}",
                    row.product_id
                ))
            })?,
            name: row.name,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CustomerOrderRow {
    #[sqlx(flatten)]
    order: OrderRow,
    username: String,
}

#[derive(Debug, sqlx::FromRow)]
struct ItemStockRow {
    product_id: i32,
    quantity: i32,
}

// =============================================================================
// Transaction steps
// =============================================================================

/// Lock the given products in ascending id order and read their state.
async fn lock_products(
    conn: &mut PgConnection,
    ids: &[ProductId],
) -> Result<Vec<ProductSnapshot>, OrderError> {
    let rows = sqlx::query_as::<_, ProductStockRow>(
        r"
        SELECT product_id, name, price, stock_quantity
        FROM products
        WHERE product_id = ANY($1)
        ORDER BY product_id
        FOR UPDATE
        ",
    )
    .bind(ids)
    .fetch_all(conn)
    .await?;

    rows.into_iter()
        .map(|row| ProductSnapshot::try_from(row).map_err(OrderError::from))
        .collect()
}

async fn fetch_items(
    conn: &mut PgConnection,
    order_id: OrderId,
) -> Result<Vec<OrderItem>, RepositoryError> {
    let rows = sqlx::query_as::<_, OrderItemRow>(
        r"
        SELECT oi.order_item_id, oi.order_id, oi.product_id, oi.quantity,
               oi.price_at_time, oi.subtotal, p.name AS product_name
        FROM order_items oi
        JOIN products p ON p.product_id = oi.product_id
        WHERE oi.order_id = $1
        ORDER BY oi.order_item_id
        ",
    )
    .bind(order_id)
    .fetch_all(conn)
    .await?;

    rows.into_iter().map(OrderItem::try_from).collect()
}

/// Write a planned order: header, items and stock decrements.
async fn insert_plan(conn: &mut PgConnection, plan: &OrderPlan) -> Result<OrderDetail, OrderError> {
    let header = sqlx::query_as::<_, OrderRow>(
        r"
        INSERT INTO orders (user_id, total_amount, status)
        VALUES ($1, $2, $3)
        RETURNING order_id, user_id, total_amount, status, created_at, updated_at
        ",
    )
    .bind(plan.user_id)
    .bind(plan.total.amount())
    .bind(OrderStatus::Pending.as_str())
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(ref db_err) if db_err.is_foreign_key_violation() => {
            OrderError::UserNotFound(plan.user_id)
        }
        other => OrderError::StoreUnavailable(other),
    })?;
    let order = Order::try_from(header)?;

    let mut items = Vec::with_capacity(plan.lines.len());
    for line in &plan.lines {
        let decremented = sqlx::query(
            r"
            UPDATE products
            SET stock_quantity = stock_quantity - $1, updated_at = NOW()
            WHERE product_id = $2 AND stock_quantity >= $1
            ",
        )
        .bind(line.quantity.get())
        .bind(line.product_id)
        .execute(&mut *conn)
        .await?;

        // Unreachable while the rows are locked; kept so the store can never go negative.
        if decremented.rows_affected() == 0 {
            return Err(OrderError::InsufficientStock {
                product_id: line.product_id,
                product_name: line.product_name.clone(),
                requested: line.quantity,
                available: Stock::EMPTY,
            });
        }

        let item_id = sqlx::query_scalar::<_, i32>(
            r"
            INSERT INTO order_items (order_id, product_id, quantity, price_at_time, subtotal)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING order_item_id
            ",
        )
        .bind(order.order_id)
        .bind(line.product_id)
        .bind(line.quantity.get())
        .bind(line.price_at_time.amount())
        .bind(line.subtotal.amount())
        .fetch_one(&mut *conn)
        .await?;

        items.push(OrderItem {
            order_item_id: OrderItemId::new(item_id),
            order_id: order.order_id,
            product_id: line.product_id,
            quantity: line.quantity,
            price_at_time: line.price_at_time,
            subtotal: line.subtotal,
            product_name: line.product_name.clone(),
        });
    }

    Ok(OrderDetail { order, items })
}

/// Put every item of an order back on its product's shelf.
async fn restore_stock(conn: &mut PgConnection, order_id: OrderId) -> Result<(), OrderError> {
    let items = sqlx::query_as::<_, ItemStockRow>(
        "SELECT product_id, quantity FROM order_items WHERE order_id = $1 ORDER BY product_id",
    )
    .bind(order_id)
    .fetch_all(&mut *conn)
    .await?;

    for item in items {
        sqlx::query(
            r"
            UPDATE products
            SET stock_quantity = stock_quantity + $1, updated_at = NOW()
            WHERE product_id = $2
            ",
        )
        .bind(item.quantity)
        .bind(item.product_id)
        .execute(&mut *conn)
        .await?;

        tracing::debug!(
            order_id = %order_id,
            product_id = item.product_id,
            quantity = item.quantity,
            "stock restored"
        );
    }

    Ok(())
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for orders and their items.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Place an order: snapshot prices, write the order and its items, and
    /// take the ordered units out of stock. All or nothing.
    ///
    /// # Errors
    ///
    /// - `ProductNotFound` / `InsufficientStock` for the first failing line
    /// - `UserNotFound` if the owning user does not exist
    /// - `StoreUnavailable` if the database fails
    ///
    /// No rows are written or changed when an error is returned.
    #[tracing::instrument(
        skip(self, request),
        fields(user_id = %request.user_id(), lines = request.lines().len())
    )]
    pub async fn create_order(&self, request: &OrderRequest) -> Result<OrderDetail, OrderError> {
        let mut tx = self.pool.begin().await?;

        let products = lock_products(&mut tx, &request.product_ids()).await?;
        let plan = OrderPlan::build(request, &products)?;
        let detail = insert_plan(&mut tx, &plan).await?;

        tx.commit().await?;

        tracing::info!(
            order_id = %detail.order.order_id,
            user_id = %detail.order.user_id,
            lines = detail.items.len(),
            total = %detail.order.total_amount,
            "order created"
        );

        Ok(detail)
    }

    /// Move an order to `target`, returning stock when a pending order is
    /// cancelled.
    ///
    /// # Errors
    ///
    /// - `OrderNotFound` if the order does not exist
    /// - `InvalidStatusTransition` when leaving `cancelled`
    /// - `StoreUnavailable` if the database fails
    #[tracing::instrument(skip(self), fields(order_id = %order_id, target = %target))]
    pub async fn update_status(
        &self,
        order_id: OrderId,
        target: OrderStatus,
    ) -> Result<OrderDetail, OrderError> {
        let mut tx = self.pool.begin().await?;

        let current: Order = sqlx::query_as::<_, OrderRow>(
            r"
            SELECT order_id, user_id, total_amount, status, created_at, updated_at
            FROM orders
            WHERE order_id = $1
            FOR UPDATE
            ",
        )
        .bind(order_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(OrderError::OrderNotFound(order_id))?
        .try_into()?;

        let transition = StatusTransition::new(current.status, target)?;
        if transition.restores_stock() {
            restore_stock(&mut tx, order_id).await?;
        }

        let order: Order = sqlx::query_as::<_, OrderRow>(
            r"
            UPDATE orders
            SET status = $2, updated_at = NOW()
            WHERE order_id = $1
            RETURNING order_id, user_id, total_amount, status, created_at, updated_at
            ",
        )
        .bind(order_id)
        .bind(target.as_str())
        .fetch_one(&mut *tx)
        .await?
        .try_into()?;

        let items = fetch_items(&mut tx, order_id).await?;
        tx.commit().await?;

        tracing::info!(
            from = %transition.from(),
            to = %transition.to(),
            restocked = transition.restores_stock(),
            "order status updated"
        );

        Ok(OrderDetail { order, items })
    }

    /// An order with its items and product names.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get_with_items(&self, order_id: OrderId) -> Result<Option<OrderDetail>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;

        let row = sqlx::query_as::<_, OrderRow>(
            r"
            SELECT order_id, user_id, total_amount, status, created_at, updated_at
            FROM orders
            WHERE order_id = $1
            ",
        )
        .bind(order_id)
        .fetch_optional(&mut *conn)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let order = Order::try_from(row)?;
        let items = fetch_items(&mut conn, order_id).await?;

        Ok(Some(OrderDetail { order, items }))
    }

    /// All orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(
            r"
            SELECT order_id, user_id, total_amount, status, created_at, updated_at
            FROM orders
            ORDER BY created_at DESC, order_id DESC
            ",
        )
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Order::try_from).collect()
    }

    /// A user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(
            r"
            SELECT order_id, user_id, total_amount, status, created_at, updated_at
            FROM orders
            WHERE user_id = $1
            ORDER BY created_at DESC, order_id DESC
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Order::try_from).collect()
    }

    /// Orders with the owning username, newest first, for the admin pages.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_with_customers(&self, limit: i64) -> Result<Vec<CustomerOrder>, RepositoryError> {
        let rows = sqlx::query_as::<_, CustomerOrderRow>(
            r"
            SELECT o.order_id, o.user_id, o.total_amount, o.status, o.created_at, o.updated_at,
                   u.username
            FROM orders o
            JOIN users u ON u.user_id = o.user_id
            ORDER BY o.created_at DESC, o.order_id DESC
            LIMIT $1
            ",
        )
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(CustomerOrder {
                    order: row.order.try_into()?,
                    username: row.username,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_errors_keep_their_kind() {
        let err: OrderError = OrderPlanError::ProductNotFound(ProductId::new(9)).into();
        assert!(matches!(err, OrderError::ProductNotFound(id) if id.as_i32() == 9));
        assert_eq!(err.to_string(), "Product with ID 9 not found");

        let err: OrderError = OrderPlanError::EmptyOrder.into();
        assert!(matches!(err, OrderError::Invalid(_)));
    }

    #[test]
    fn test_repository_errors_map_to_store_or_corruption() {
        let err: OrderError = RepositoryError::Database(sqlx::Error::PoolTimedOut).into();
        assert!(matches!(err, OrderError::StoreUnavailable(_)));

        let err: OrderError = RepositoryError::DataCorruption("bad status".to_owned()).into();
        assert!(matches!(err, OrderError::DataCorruption(_)));
    }
}
