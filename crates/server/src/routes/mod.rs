//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                         - Liveness
//! GET  /health/ready                   - Readiness (database ping)
//!
//! # Users
//! POST /users/login                    - Issue an access token (JSON or form)
//! POST /users                          - Register
//! GET  /users                          - List (admin)
//! GET  /users/{id}                     - Show (self or admin)
//! PUT  /users/{id}                     - Partial update (self or admin)
//! DELETE /users/{id}                   - Delete (self or admin)
//! GET  /users/{id}/orders              - Order history (self or admin)
//!
//! # Products (mutations admin only)
//! GET  /products                       - List
//! POST /products                       - Create
//! GET|PUT|DELETE /products/{id}
//! GET|POST /products/{id}/images
//! GET|PUT|DELETE /products/{id}/images/{image_id}
//! PUT  /products/{id}/images/{image_id}/set-primary
//!
//! # Orders
//! POST /orders                         - Place (self, or admin for anyone)
//! GET  /orders                         - List (admin)
//! GET  /orders/{id}                    - Detail with items (owner or admin)
//! PUT  /orders/{id}                    - Status transition (admin)
//!
//! # Admin pages
//! /admin/...                           - See `admin::routes`
//!
//! # Static
//! GET  /uploads/*                      - Uploaded files
//! ```

pub mod admin;
pub mod orders;
pub mod products;
pub mod users;

use axum::{
    Form, Json, Router,
    extract::{FromRequest, Request, State},
    http::{HeaderValue, Method, StatusCode, header},
    routing::{get, post, put},
};
use serde::de::DeserializeOwned;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::error::AppError;
use crate::state::AppState;

/// JSON body extractor whose rejections use the API's `{"error": ...}` shape.
///
/// A body that does not deserialize (an unknown status, a missing field) is a
/// 400 like any other validation failure.
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        Ok(Self(value))
    }
}

/// Body extractor accepting either `application/json` or a url-encoded form.
pub struct JsonOrForm<T>(pub T);

impl<S, T> FromRequest<S> for JsonOrForm<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/json"));

        if is_json {
            let ApiJson(value) = ApiJson::<T>::from_request(req, state).await?;
            Ok(Self(value))
        } else {
            let Form(value) = Form::<T>::from_request(req, state)
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            Ok(Self(value))
        }
    }
}

/// Create the user routes router.
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(users::list).post(users::register))
        .route("/login", post(users::login))
        .route(
            "/{id}",
            get(users::show).put(users::update).delete(users::delete),
        )
        .route("/{id}/orders", get(users::orders))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::list).post(products::create))
        .route(
            "/{id}",
            get(products::show)
                .put(products::update)
                .delete(products::delete),
        )
        .route(
            "/{id}/images",
            get(products::list_images).post(products::create_image),
        )
        .route(
            "/{id}/images/{image_id}",
            get(products::show_image)
                .put(products::update_image)
                .delete(products::delete_image),
        )
        .route(
            "/{id}/images/{image_id}/set-primary",
            put(products::set_primary_image),
        )
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::list).post(orders::create))
        .route("/{id}", get(orders::show).put(orders::update_status))
}

/// Create all routes, without state or middleware.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .nest("/users", user_routes())
        .nest("/products", product_routes())
        .nest("/orders", order_routes())
        .nest("/admin", admin::routes())
}

/// Build the full application: routes, static uploads, CORS and tracing.
pub fn app(state: AppState) -> Router {
    let config = state.config();

    let origin = HeaderValue::from_str(&config.cors_origin)
        .inspect_err(|_| {
            tracing::warn!(origin = %config.cors_origin, "ignoring unparseable CORS origin");
        })
        .ok()
        // Credentials cannot be combined with a wildcard origin
        .filter(|v| v.as_bytes() != b"*");
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origin))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true);

    let uploads = ServeDir::new(&config.uploads_dir);

    routes()
        .nest_service("/uploads", uploads)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
