//! Business services layered over the repositories.

pub mod auth;
