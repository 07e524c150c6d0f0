//! Integer counts: ordered quantities and on-hand stock.
//!
//! Both map onto Postgres `INTEGER` columns, so they wrap `i32`.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors for [`Quantity`] and [`Stock`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum QuantityError {
    #[error("quantity must be greater than zero")]
    NotPositive,
    #[error("stock quantity cannot be negative")]
    NegativeStock,
}

/// Number of units on an order line. Always at least one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct Quantity(i32);

impl Quantity {
    /// # Errors
    ///
    /// Returns `QuantityError::NotPositive` for zero or negative values.
    pub const fn new(value: i32) -> Result<Self, QuantityError> {
        if value <= 0 {
            return Err(QuantityError::NotPositive);
        }
        Ok(Self(value))
    }

    #[must_use]
    pub const fn get(self) -> i32 {
        self.0
    }
}

impl TryFrom<i32> for Quantity {
    type Error = QuantityError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Quantity> for i32 {
    fn from(quantity: Quantity) -> Self {
        quantity.0
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Units of a product on hand. Never negative.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "i32", into = "i32")]
pub struct Stock(i32);

impl Stock {
    pub const EMPTY: Self = Self(0);

    /// # Errors
    ///
    /// Returns `QuantityError::NegativeStock` for negative values.
    pub const fn new(value: i32) -> Result<Self, QuantityError> {
        if value < 0 {
            return Err(QuantityError::NegativeStock);
        }
        Ok(Self(value))
    }

    #[must_use]
    pub const fn get(self) -> i32 {
        self.0
    }

    /// Whether `quantity` units can be taken from this stock.
    #[must_use]
    pub const fn covers(self, quantity: Quantity) -> bool {
        self.0 >= quantity.0
    }

    /// Stock left after taking `quantity` units, or `None` if there is not
    /// enough.
    #[must_use]
    pub const fn take(self, quantity: Quantity) -> Option<Self> {
        if self.covers(quantity) {
            Some(Self(self.0 - quantity.0))
        } else {
            None
        }
    }
}

impl TryFrom<i32> for Stock {
    type Error = QuantityError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Stock> for i32 {
    fn from(stock: Stock) -> Self {
        stock.0
    }
}

impl fmt::Display for Stock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
