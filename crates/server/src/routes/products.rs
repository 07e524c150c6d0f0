//! Product catalog and product image records.
//!
//! Reads are public; every mutation requires an admin.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use shopdesk_core::{ProductId, ProductImageId};

use crate::db::{ProductImageRepository, ProductRepository, RepositoryError};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::RequireAdmin;
use crate::models::{
    CreateImageInput, CreateProductInput, Product, ProductImage, UpdateImageInput,
    UpdateProductInput,
};
use crate::state::AppState;

use super::ApiJson;

fn product_not_found(err: RepositoryError) -> AppError {
    match err {
        RepositoryError::NotFound => AppError::not_found("Product"),
        other => other.into(),
    }
}

fn image_not_found(err: RepositoryError) -> AppError {
    match err {
        RepositoryError::NotFound => AppError::not_found("Image"),
        other => other.into(),
    }
}

// =============================================================================
// Products
// =============================================================================

/// `GET /products`
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Product>>> {
    Ok(Json(ProductRepository::new(state.pool()).list().await?))
}

/// `GET /products/{id}`
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<Product>> {
    let product = ProductRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("Product"))?;

    Ok(Json(product))
}

/// `POST /products`
#[tracing::instrument(skip(state, input))]
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    ApiJson(input): ApiJson<CreateProductInput>,
) -> Result<impl IntoResponse> {
    input.validate()?;
    let product = ProductRepository::new(state.pool()).create(&input).await?;

    tracing::info!(product_id = %product.product_id, "product created");
    Ok((StatusCode::CREATED, Json(product)))
}

/// `PUT /products/{id}`
#[tracing::instrument(skip(state, input), fields(product_id = %id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<ProductId>,
    ApiJson(input): ApiJson<UpdateProductInput>,
) -> Result<Json<Product>> {
    input.validate()?;
    let product = ProductRepository::new(state.pool())
        .update(id, input)
        .await
        .map_err(product_not_found)?;

    add_breadcrumb("products", "Product updated", &[("product_id", id.to_string())]);
    Ok(Json(product))
}

/// `DELETE /products/{id}`
#[tracing::instrument(skip(state), fields(product_id = %id))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<ProductId>,
) -> Result<StatusCode> {
    if !ProductRepository::new(state.pool()).delete(id).await? {
        return Err(AppError::not_found("Product"));
    }

    tracing::info!("product deleted");
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Images
// =============================================================================

/// `GET /products/{id}/images`
pub async fn list_images(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<Vec<ProductImage>>> {
    ProductRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("Product"))?;

    let images = ProductImageRepository::new(state.pool())
        .list_for_product(id)
        .await?;
    Ok(Json(images))
}

/// `GET /products/{id}/images/{image_id}`
pub async fn show_image(
    State(state): State<AppState>,
    Path((id, image_id)): Path<(ProductId, ProductImageId)>,
) -> Result<Json<ProductImage>> {
    let image = ProductImageRepository::new(state.pool())
        .get(id, image_id)
        .await
        .map_err(image_not_found)?;

    Ok(Json(image))
}

/// `POST /products/{id}/images`
#[tracing::instrument(skip(state, input), fields(product_id = %id))]
pub async fn create_image(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<ProductId>,
    ApiJson(input): ApiJson<CreateImageInput>,
) -> Result<impl IntoResponse> {
    let input = input.validate()?;
    let image = ProductImageRepository::new(state.pool())
        .create(id, &input)
        .await
        .map_err(product_not_found)?;

    tracing::info!(image_id = %image.image_id, primary = image.is_primary, "image added");
    Ok((StatusCode::CREATED, Json(image)))
}

/// `PUT /products/{id}/images/{image_id}`
#[tracing::instrument(skip(state, input), fields(product_id = %id, image_id = %image_id))]
pub async fn update_image(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path((id, image_id)): Path<(ProductId, ProductImageId)>,
    ApiJson(input): ApiJson<UpdateImageInput>,
) -> Result<Json<ProductImage>> {
    input.validate()?;
    let image = ProductImageRepository::new(state.pool())
        .update(id, image_id, &input)
        .await
        .map_err(image_not_found)?;

    Ok(Json(image))
}

/// `PUT /products/{id}/images/{image_id}/set-primary`
#[tracing::instrument(skip(state), fields(product_id = %id, image_id = %image_id))]
pub async fn set_primary_image(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path((id, image_id)): Path<(ProductId, ProductImageId)>,
) -> Result<Json<ProductImage>> {
    let image = ProductImageRepository::new(state.pool())
        .set_primary(id, image_id)
        .await
        .map_err(image_not_found)?;

    Ok(Json(image))
}

/// `DELETE /products/{id}/images/{image_id}`
#[tracing::instrument(skip(state), fields(product_id = %id, image_id = %image_id))]
pub async fn delete_image(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path((id, image_id)): Path<(ProductId, ProductImageId)>,
) -> Result<StatusCode> {
    if !ProductImageRepository::new(state.pool())
        .delete(id, image_id)
        .await?
    {
        return Err(AppError::not_found("Image"));
    }

    Ok(StatusCode::NO_CONTENT)
}
