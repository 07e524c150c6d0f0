//! Order planning.
//!
//! Turning a request into an order has two halves: deciding what the order
//! looks like (prices, subtotals, whether stock covers every line) and
//! writing it. This module is the first half. The server locks the referenced
//! product rows, hands their current state to [`OrderPlan::build`] and only
//! writes when the plan succeeds.
//!
//! Lines are checked in the order the customer submitted them. When the same
//! product appears on more than one line, later lines draw from what earlier
//! lines left, so two lines of 3 against a stock of 5 fail on the second line.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::{Money, MoneyError, Price, ProductId, Quantity, Stock, UserId};

/// Errors produced while planning an order.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum OrderPlanError {
    #[error("order must contain at least one item")]
    EmptyOrder,
    #[error("Product with ID {0} not found")]
    ProductNotFound(ProductId),
    #[error("Not enough stock for product {product_name} (requested {requested}, available {available})")]
    InsufficientStock {
        product_id: ProductId,
        product_name: String,
        requested: Quantity,
        available: Stock,
    },
    #[error("order amount out of range: {0}")]
    Amount(#[from] MoneyError),
}

/// One requested line: a product and how many units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub quantity: Quantity,
}

/// A validated order request: an acting user and a non-empty list of lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRequest {
    user_id: UserId,
    lines: Vec<OrderLine>,
}

impl OrderRequest {
    /// # Errors
    ///
    /// Returns `OrderPlanError::EmptyOrder` if `lines` is empty.
    pub fn new(user_id: UserId, lines: Vec<OrderLine>) -> Result<Self, OrderPlanError> {
        if lines.is_empty() {
            return Err(OrderPlanError::EmptyOrder);
        }
        Ok(Self { user_id, lines })
    }

    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }

    /// Distinct product ids referenced by the request, ascending.
    ///
    /// Locking rows in this order keeps concurrent orders from deadlocking
    /// on each other.
    #[must_use]
    pub fn product_ids(&self) -> Vec<ProductId> {
        let mut ids: Vec<ProductId> = self.lines.iter().map(|l| l.product_id).collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }
}

/// Product state as read (and locked) at planning time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductSnapshot {
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    pub stock: Stock,
}

/// A line ready to be written as an order item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedLine {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: Quantity,
    /// Price copied from the product when the plan was built.
    pub price_at_time: Price,
    pub subtotal: Money,
}

/// The outcome of a successful plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderPlan {
    pub user_id: UserId,
    pub lines: Vec<PlannedLine>,
    pub total: Money,
}

impl OrderPlan {
    /// Check every line of `request` against `products` and price it.
    ///
    /// `products` is the current state of the referenced products. Ids missing
    /// from it are reported as not found.
    ///
    /// # Errors
    ///
    /// Returns the first failing line's error: `ProductNotFound`,
    /// `InsufficientStock`, or `Amount` if a subtotal or the total overflows.
    pub fn build(
        request: &OrderRequest,
        products: &[ProductSnapshot],
    ) -> Result<Self, OrderPlanError> {
        let by_id: HashMap<ProductId, &ProductSnapshot> =
            products.iter().map(|p| (p.id, p)).collect();
        let mut remaining: HashMap<ProductId, Stock> = HashMap::new();

        let mut lines = Vec::with_capacity(request.lines.len());
        let mut total = Money::ZERO;

        for line in &request.lines {
            let product = by_id
                .get(&line.product_id)
                .ok_or(OrderPlanError::ProductNotFound(line.product_id))?;

            let left = remaining.entry(product.id).or_insert(product.stock);
            let before = *left;
            *left = before
                .take(line.quantity)
                .ok_or_else(|| OrderPlanError::InsufficientStock {
                    product_id: product.id,
                    product_name: product.name.clone(),
                    requested: line.quantity,
                    available: before,
                })?;

            let subtotal = product.price.times(line.quantity)?;
            total = total.checked_add(subtotal)?;

            lines.push(PlannedLine {
                product_id: product.id,
                product_name: product.name.clone(),
                quantity: line.quantity,
                price_at_time: product.price,
                subtotal,
            });
        }

        Ok(Self {
            user_id: request.user_id,
            lines,
            total,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::str::FromStr;

    use rust_decimal::Decimal;

    use super::*;

    fn product(id: i32, price: &str, stock: i32) -> ProductSnapshot {
        ProductSnapshot {
            id: ProductId::new(id),
            name: format!("Product {id}"),
            price: Price::new(Decimal::from_str(price).unwrap()).unwrap(),
            stock: Stock::new(stock).unwrap(),
        }
    }

    fn line(id: i32, qty: i32) -> OrderLine {
        OrderLine {
            product_id: ProductId::new(id),
            quantity: Quantity::new(qty).unwrap(),
        }
    }

    fn request(lines: Vec<OrderLine>) -> OrderRequest {
        OrderRequest::new(UserId::new(1), lines).unwrap()
    }

    #[test]
    fn test_empty_request_rejected() {
        assert_eq!(
            OrderRequest::new(UserId::new(1), vec![]),
            Err(OrderPlanError::EmptyOrder)
        );
    }

    #[test]
    fn test_single_line_total() {
        let plan = OrderPlan::build(&request(vec![line(1, 3)]), &[product(1, "10.00", 5)]).unwrap();

        assert_eq!(plan.total.to_string(), "30.00");
        assert_eq!(plan.lines.len(), 1);
        assert_eq!(plan.lines[0].price_at_time.to_string(), "10.00");
        assert_eq!(plan.lines[0].subtotal.to_string(), "30.00");
    }

    #[test]
    fn test_insufficient_stock() {
        let err = OrderPlan::build(&request(vec![line(1, 5)]), &[product(1, "10.00", 2)])
            .unwrap_err();

        assert!(matches!(
            err,
            OrderPlanError::InsufficientStock { available, .. } if available.get() == 2
        ));
        assert!(err.to_string().starts_with("Not enough stock for product Product 1"));
    }

    #[test]
    fn test_missing_product_after_valid_line() {
        let err = OrderPlan::build(
            &request(vec![line(1, 1), line(2, 1)]),
            &[product(1, "4.00", 10)],
        )
        .unwrap_err();

        assert_eq!(err, OrderPlanError::ProductNotFound(ProductId::new(2)));
        assert_eq!(err.to_string(), "Product with ID 2 not found");
    }

    #[test]
    fn test_repeated_product_draws_from_same_stock() {
        let products = [product(1, "1.00", 5)];

        let ok = OrderPlan::build(&request(vec![line(1, 2), line(1, 3)]), &products).unwrap();
        assert_eq!(ok.total.to_string(), "5.00");

        let err = OrderPlan::build(&request(vec![line(1, 3), line(1, 3)]), &products).unwrap_err();
        assert!(matches!(
            err,
            OrderPlanError::InsufficientStock { available, .. } if available.get() == 2
        ));
    }

    #[test]
    fn test_total_is_sum_of_subtotals() {
        let products = [product(1, "19.99", 100), product(2, "0.10", 100)];
        let plan =
            OrderPlan::build(&request(vec![line(2, 3), line(1, 2), line(2, 7)]), &products)
                .unwrap();

        let sum = plan
            .lines
            .iter()
            .try_fold(Money::ZERO, |acc, l| acc.checked_add(l.subtotal))
            .unwrap();
        assert_eq!(plan.total, sum);
        assert_eq!(plan.total.to_string(), "40.98");
        for l in &plan.lines {
            assert_eq!(l.subtotal, l.price_at_time.times(l.quantity).unwrap());
        }
    }

    #[test]
    fn test_lines_keep_request_order() {
        let products = [product(1, "1.00", 1), product(2, "2.00", 1)];
        let plan = OrderPlan::build(&request(vec![line(2, 1), line(1, 1)]), &products).unwrap();
        let ids: Vec<i32> = plan.lines.iter().map(|l| l.product_id.as_i32()).collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[test]
    fn test_product_ids_sorted_and_distinct() {
        let req = request(vec![line(3, 1), line(1, 1), line(3, 2)]);
        assert_eq!(req.product_ids(), vec![ProductId::new(1), ProductId::new(3)]);
    }
}
