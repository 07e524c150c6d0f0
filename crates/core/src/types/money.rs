//! Fixed-point money types.
//!
//! All amounts are `rust_decimal::Decimal` with two fractional digits, which
//! matches the `NUMERIC(12,2)` columns in the store. Floating point never
//! enters the price path: a stored price, the snapshot taken when an order is
//! placed and the subtotal computed from it are the same decimal value.
//!
//! - [`Price`] is a unit price and must be strictly positive.
//! - [`Money`] is any non-negative amount (subtotals, order totals).

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::quantity::Quantity;

/// Number of fractional digits kept for every amount.
pub const MONEY_SCALE: u32 = 2;

/// Largest amount a `NUMERIC(12,2)` column can hold.
const MAX_AMOUNT: Decimal = Decimal::from_parts(3_567_587_327, 232, 0, false, 2);

/// Errors that can occur when constructing money values.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MoneyError {
    /// A unit price was zero or negative.
    #[error("price must be greater than zero")]
    NotPositive,
    /// An amount was negative.
    #[error("amount cannot be negative")]
    Negative,
    /// The amount does not fit the store's `NUMERIC(12,2)` columns.
    #[error("amount exceeds 9999999999.99")]
    TooLarge,
}

fn normalize(amount: Decimal) -> Result<Decimal, MoneyError> {
    let rounded = amount.round_dp(MONEY_SCALE);
    if rounded > MAX_AMOUNT {
        return Err(MoneyError::TooLarge);
    }
    let mut scaled = rounded;
    scaled.rescale(MONEY_SCALE);
    Ok(scaled)
}

/// A unit price. Always greater than zero, rounded to two decimal places.
///
/// Rounding uses banker's rounding (`round_dp`), so `10.005` becomes `10.00`
/// and `10.015` becomes `10.02`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Price(Decimal);

impl Price {
    /// Create a price from a decimal amount.
    ///
    /// # Errors
    ///
    /// Returns `MoneyError::NotPositive` if the amount rounds to zero or below,
    /// or `MoneyError::TooLarge` if it exceeds the column precision.
    pub fn new(amount: Decimal) -> Result<Self, MoneyError> {
        let amount = normalize(amount)?;
        if amount <= Decimal::ZERO {
            return Err(MoneyError::NotPositive);
        }
        Ok(Self(amount))
    }

    /// Create a price from a whole number of cents.
    ///
    /// # Errors
    ///
    /// Returns `MoneyError::NotPositive` if `cents` is zero or negative.
    pub fn from_cents(cents: i64) -> Result<Self, MoneyError> {
        Self::new(Decimal::new(cents, MONEY_SCALE))
    }

    /// The decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Price multiplied by a quantity.
    ///
    /// # Errors
    ///
    /// Returns `MoneyError::TooLarge` if the product overflows the column.
    pub fn times(self, quantity: Quantity) -> Result<Money, MoneyError> {
        let subtotal = self
            .0
            .checked_mul(Decimal::from(quantity.get()))
            .ok_or(MoneyError::TooLarge)?;
        Money::new(subtotal)
    }
}

impl TryFrom<Decimal> for Price {
    type Error = MoneyError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

/// A non-negative monetary amount with two decimal places.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Money(Decimal);

impl Money {
    /// Zero.
    pub const ZERO: Self = Self(Decimal::from_parts(0, 0, 0, false, MONEY_SCALE));

    /// Create an amount from a decimal value.
    ///
    /// # Errors
    ///
    /// Returns `MoneyError::Negative` for negative values or
    /// `MoneyError::TooLarge` if the value exceeds the column precision.
    pub fn new(amount: Decimal) -> Result<Self, MoneyError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(MoneyError::Negative);
        }
        Ok(Self(normalize(amount)?))
    }

    /// The decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Sum of two amounts.
    ///
    /// # Errors
    ///
    /// Returns `MoneyError::TooLarge` if the sum exceeds the column precision.
    pub fn checked_add(self, other: Self) -> Result<Self, MoneyError> {
        let sum = self.0.checked_add(other.0).ok_or(MoneyError::TooLarge)?;
        Self::new(sum)
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::ZERO
    }
}

impl TryFrom<Decimal> for Money {
    type Error = MoneyError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Money> for Decimal {
    fn from(money: Money) -> Self {
        money.0
    }
}

impl From<Price> for Money {
    fn from(price: Price) -> Self {
        Self(price.0)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}
