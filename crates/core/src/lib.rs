//! shopdesk core - domain types and order rules.
//!
//! This crate is shared by every shopdesk component:
//! - `server` - JSON API and admin pages
//! - `cli` - migrations, user management and seeding
//!
//! # Architecture
//!
//! The core crate holds types and pure rules only. It never touches the
//! database or the network, so the order arithmetic and the status machine
//! can be exercised without a running store.
//!
//! # Modules
//!
//! - [`types`] - Type-safe IDs, money, quantities, statuses and emails
//! - [`order`] - Order planning: stock checks, price snapshots, totals
//! - [`transition`] - Order status transitions and their stock effect

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod order;
pub mod transition;
pub mod types;

pub use order::{OrderLine, OrderPlan, OrderPlanError, OrderRequest, PlannedLine, ProductSnapshot};
pub use transition::{StatusTransition, TransitionError};
pub use types::*;
