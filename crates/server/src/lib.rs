//! shopdesk server library.
//!
//! JSON API and server-rendered admin pages over the `PostgreSQL` store.
//! The binary in `main.rs` wires configuration, telemetry and the listener;
//! everything else lives here so the integration tests can build the same
//! router.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

pub use routes::app;
pub use state::AppState;
