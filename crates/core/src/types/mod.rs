//! Core types for shopdesk.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod money;
pub mod quantity;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use money::{MONEY_SCALE, Money, MoneyError, Price};
pub use quantity::{Quantity, QuantityError, Stock};
pub use status::*;
