//! Request extractors shared by the JSON API and the admin pages.

pub mod auth;

pub use auth::{CurrentUser, RequireAdmin, RequireAdminPage};
