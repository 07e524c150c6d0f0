//! Product image repository.
//!
//! Every mutation runs in a transaction that first locks the owning product
//! row, so concurrent writers cannot both leave a primary image behind.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

use shopdesk_core::{ImageType, ProductId, ProductImageId};

use super::{RepositoryError, parse_column};
use crate::models::{CreateImageInput, ProductImage, UpdateImageInput};

#[derive(Debug, sqlx::FromRow)]
struct ProductImageRow {
    image_id: i32,
    product_id: i32,
    image_url: String,
    image_type: String,
    sort_order: i32,
    is_primary: bool,
    file_size: i64,
    file_type: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProductImageRow> for ProductImage {
    type Error = RepositoryError;

    fn try_from(row: ProductImageRow) -> Result<Self, Self::Error> {
        Ok(Self {
            image_id: ProductImageId::new(row.image_id),
            product_id: ProductId::new(row.product_id),
            image_url: row.image_url,
            image_type: parse_column::<ImageType>(&row.image_type, "image_type")?,
            sort_order: row.sort_order,
            is_primary: row.is_primary,
            file_size: row.file_size,
            file_type: row.file_type,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Lock the product row, failing with `NotFound` if it does not exist.
async fn lock_product(conn: &mut PgConnection, product_id: ProductId) -> Result<(), RepositoryError> {
    sqlx::query_scalar::<_, i32>("SELECT product_id FROM products WHERE product_id = $1 FOR UPDATE")
        .bind(product_id)
        .fetch_optional(conn)
        .await?
        .ok_or(RepositoryError::NotFound)?;
    Ok(())
}

async fn clear_primary(conn: &mut PgConnection, product_id: ProductId) -> Result<(), RepositoryError> {
    sqlx::query(
        "UPDATE product_images SET is_primary = FALSE, updated_at = NOW() WHERE product_id = $1 AND is_primary",
    )
    .bind(product_id)
    .execute(conn)
    .await?;
    Ok(())
}

async fn fetch_image(
    conn: &mut PgConnection,
    product_id: ProductId,
    image_id: ProductImageId,
) -> Result<ProductImage, RepositoryError> {
    sqlx::query_as::<_, ProductImageRow>(
        r"
        SELECT image_id, product_id, image_url, image_type, sort_order, is_primary,
               file_size, file_type, created_at, updated_at
        FROM product_images
        WHERE image_id = $1 AND product_id = $2
        ",
    )
    .bind(image_id)
    .bind(product_id)
    .fetch_optional(conn)
    .await?
    .ok_or(RepositoryError::NotFound)?
    .try_into()
}

/// Repository for product image metadata.
pub struct ProductImageRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductImageRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Images of a product in display order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_product(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<ProductImage>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductImageRow>(
            r"
            SELECT image_id, product_id, image_url, image_type, sort_order, is_primary,
                   file_size, file_type, created_at, updated_at
            FROM product_images
            WHERE product_id = $1
            ORDER BY sort_order, image_id
            ",
        )
        .bind(product_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(ProductImage::try_from).collect()
    }

    /// Get one image, scoped to its product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the image does not belong to the product.
    pub async fn get(
        &self,
        product_id: ProductId,
        image_id: ProductImageId,
    ) -> Result<ProductImage, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        fetch_image(&mut conn, product_id, image_id).await
    }

    /// Add an image record to a product.
    ///
    /// A `sort_order` of zero appends after the current last image.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    #[tracing::instrument(skip(self, input), fields(product_id = %product_id))]
    pub async fn create(
        &self,
        product_id: ProductId,
        input: &CreateImageInput,
    ) -> Result<ProductImage, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        lock_product(&mut tx, product_id).await?;

        if input.is_primary {
            clear_primary(&mut tx, product_id).await?;
        }

        let sort_order = if input.sort_order == 0 {
            sqlx::query_scalar::<_, i32>(
                "SELECT COALESCE(MAX(sort_order), 0) + 1 FROM product_images WHERE product_id = $1",
            )
            .bind(product_id)
            .fetch_one(&mut *tx)
            .await?
        } else {
            input.sort_order
        };

        let row = sqlx::query_as::<_, ProductImageRow>(
            r"
            INSERT INTO product_images
                (product_id, image_url, image_type, sort_order, is_primary, file_size, file_type)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING image_id, product_id, image_url, image_type, sort_order, is_primary,
                      file_size, file_type, created_at, updated_at
            ",
        )
        .bind(product_id)
        .bind(&input.image_url)
        .bind(input.image_type.as_str())
        .bind(sort_order)
        .bind(input.is_primary)
        .bind(input.file_size)
        .bind(&input.file_type)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        row.try_into()
    }

    /// Merge `input` over an image.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the image does not belong to the product.
    #[tracing::instrument(skip(self, input), fields(product_id = %product_id, image_id = %image_id))]
    pub async fn update(
        &self,
        product_id: ProductId,
        image_id: ProductImageId,
        input: &UpdateImageInput,
    ) -> Result<ProductImage, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        lock_product(&mut tx, product_id).await?;
        let current = fetch_image(&mut tx, product_id, image_id).await?;

        if input.is_primary == Some(true) {
            clear_primary(&mut tx, product_id).await?;
        }

        let row = sqlx::query_as::<_, ProductImageRow>(
            r"
            UPDATE product_images
            SET image_type = $2, sort_order = $3, is_primary = $4, updated_at = NOW()
            WHERE image_id = $1
            RETURNING image_id, product_id, image_url, image_type, sort_order, is_primary,
                      file_size, file_type, created_at, updated_at
            ",
        )
        .bind(image_id)
        .bind(input.image_type.unwrap_or(current.image_type).as_str())
        .bind(input.sort_order.unwrap_or(current.sort_order))
        .bind(input.is_primary.unwrap_or(current.is_primary))
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        row.try_into()
    }

    /// Make an image the product's only primary image.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the image does not belong to the product.
    #[tracing::instrument(skip(self), fields(product_id = %product_id, image_id = %image_id))]
    pub async fn set_primary(
        &self,
        product_id: ProductId,
        image_id: ProductImageId,
    ) -> Result<ProductImage, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        lock_product(&mut tx, product_id).await?;
        fetch_image(&mut tx, product_id, image_id).await?;
        clear_primary(&mut tx, product_id).await?;

        let row = sqlx::query_as::<_, ProductImageRow>(
            r"
            UPDATE product_images
            SET is_primary = TRUE, updated_at = NOW()
            WHERE image_id = $1
            RETURNING image_id, product_id, image_url, image_type, sort_order, is_primary,
                      file_size, file_type, created_at, updated_at
            ",
        )
        .bind(image_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        row.try_into()
    }

    /// Delete an image. If it was primary, the next image by sort order
    /// becomes primary. Returns `false` if there was nothing to delete.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    #[tracing::instrument(skip(self), fields(product_id = %product_id, image_id = %image_id))]
    pub async fn delete(
        &self,
        product_id: ProductId,
        image_id: ProductImageId,
    ) -> Result<bool, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        match lock_product(&mut tx, product_id).await {
            Err(RepositoryError::NotFound) => return Ok(false),
            other => other?,
        }

        let was_primary = sqlx::query_scalar::<_, bool>(
            "DELETE FROM product_images WHERE image_id = $1 AND product_id = $2 RETURNING is_primary",
        )
        .bind(image_id)
        .bind(product_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(was_primary) = was_primary else {
            return Ok(false);
        };

        if was_primary {
            sqlx::query(
                r"
                UPDATE product_images
                SET is_primary = TRUE, updated_at = NOW()
                WHERE image_id = (
                    SELECT image_id FROM product_images
                    WHERE product_id = $1
                    ORDER BY sort_order, image_id
                    LIMIT 1
                )
                ",
            )
            .bind(product_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(true)
    }
}
