//! Order status transitions.
//!
//! ```text
//! pending ──► completed ──► cancelled
//!    │                          ▲
//!    └──────────────────────────┘  (stock returned)
//! ```
//!
//! Stock goes back to the shelf only when a *pending* order is cancelled.
//! A completed order has shipped; cancelling it is a bookkeeping change.
//! Cancelled is terminal, otherwise `cancelled → pending → cancelled` would
//! return the same units twice.

use crate::types::OrderStatus;

/// Error for a transition the state machine does not allow.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("cannot change order status from {from} to {to}")]
pub struct TransitionError {
    pub from: OrderStatus,
    pub to: OrderStatus,
}

/// An allowed move between two statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusTransition {
    from: OrderStatus,
    to: OrderStatus,
}

impl StatusTransition {
    /// # Errors
    ///
    /// Returns [`TransitionError`] when leaving `cancelled` for another status.
    pub const fn new(from: OrderStatus, to: OrderStatus) -> Result<Self, TransitionError> {
        match (from, to) {
            (OrderStatus::Cancelled, OrderStatus::Pending | OrderStatus::Completed) => {
                Err(TransitionError { from, to })
            }
            _ => Ok(Self { from, to }),
        }
    }

    #[must_use]
    pub const fn from(self) -> OrderStatus {
        self.from
    }

    #[must_use]
    pub const fn to(self) -> OrderStatus {
        self.to
    }

    /// Whether applying this transition returns the order's items to stock.
    #[must_use]
    pub const fn restores_stock(self) -> bool {
        matches!(
            (self.from, self.to),
            (OrderStatus::Pending, OrderStatus::Cancelled)
        )
    }
}
