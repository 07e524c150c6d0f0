//! Server-rendered admin pages (Askama + HTMX).

pub mod auth;
pub mod dashboard;
pub mod orders;
pub mod products;

use axum::{
    Router,
    response::Redirect,
    routing::{get, post, put},
};

use crate::state::AppState;

/// Create the admin routes router, mounted at `/admin`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(|| async { Redirect::to("/admin/dashboard") }))
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/dashboard", get(dashboard::dashboard))
        .route("/recent-activity", get(dashboard::recent_activity))
        .route("/products", get(products::index).post(products::form::create))
        .route("/products/add", get(products::form::add_page))
        .route("/products/edit/{id}", get(products::form::edit_page))
        .route(
            "/products/{id}",
            put(products::form::update)
                .post(products::form::update)
                .delete(products::form::delete),
        )
        .route("/products/{id}/delete", post(products::form::delete))
        .route("/orders", get(orders::index))
        .route("/orders/{id}", get(orders::show))
        .route("/orders/{id}/status", post(orders::update_status))
}
