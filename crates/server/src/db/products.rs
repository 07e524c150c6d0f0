//! Product repository.
//!
//! Stock is only ever changed here through plain edits; order placement and
//! cancellation adjust it inside [`super::OrderRepository`] transactions.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder};

use shopdesk_core::{Price, ProductId, Stock};

use super::{RepositoryError, map_constraint};
use crate::models::{CreateProductInput, Product, UpdateProductInput};

/// Products with fewer units than this (but more than zero) count as low stock.
pub const LOW_STOCK_THRESHOLD: i32 = 10;

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    product_id: i32,
    name: String,
    description: Option<String>,
    price: Decimal,
    stock_quantity: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let price = Price::new(row.price).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid price for product {}: {e}", row.product_id))
        })?;
        let stock_quantity = Stock::new(row.stock_quantity).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid stock for product {}: {e}", row.product_id))
        })?;

        Ok(Self {
            product_id: ProductId::new(row.product_id),
            name: row.name,
            description: row.description,
            price,
            stock_quantity,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct AdminProductRow {
    #[sqlx(flatten)]
    product: ProductRow,
    image_count: i64,
    primary_image_url: Option<String>,
}

// =============================================================================
// Admin listing
// =============================================================================

/// Stock filter on the admin product list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockStatus {
    /// At least one unit.
    InStock,
    /// Between one and `LOW_STOCK_THRESHOLD - 1` units.
    LowStock,
    OutOfStock,
}

impl StockStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InStock => "in_stock",
            Self::LowStock => "low_stock",
            Self::OutOfStock => "out_of_stock",
        }
    }

    /// Parse a form value; unknown or empty values mean "no filter".
    #[must_use]
    pub fn from_param(value: &str) -> Option<Self> {
        match value {
            "in_stock" => Some(Self::InStock),
            "low_stock" => Some(Self::LowStock),
            "out_of_stock" => Some(Self::OutOfStock),
            _ => None,
        }
    }
}

/// Sort column on the admin product list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProductSort {
    Id,
    Name,
    Price,
    Stock,
    #[default]
    CreatedAt,
}

impl ProductSort {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Name => "name",
            Self::Price => "price",
            Self::Stock => "stock",
            Self::CreatedAt => "created_at",
        }
    }

    /// Parse a form value; unknown or empty values fall back to `created_at`.
    #[must_use]
    pub fn from_param(value: &str) -> Self {
        match value {
            "id" => Self::Id,
            "name" => Self::Name,
            "price" => Self::Price,
            "stock" => Self::Stock,
            _ => Self::CreatedAt,
        }
    }

    const fn column(self) -> &'static str {
        match self {
            Self::Id => "p.product_id",
            Self::Name => "p.name",
            Self::Price => "p.price",
            Self::Stock => "p.stock_quantity",
            Self::CreatedAt => "p.created_at",
        }
    }
}

/// Filters, sort and page for the admin product list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminProductQuery {
    pub page: u32,
    pub per_page: u32,
    pub search: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub stock_status: Option<StockStatus>,
    pub sort: ProductSort,
    /// Flip the default descending order.
    pub reverse: bool,
}

impl AdminProductQuery {
    pub const DEFAULT_PER_PAGE: u32 = 10;
    pub const MAX_PER_PAGE: u32 = 100;

    #[must_use]
    pub fn offset(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)) * i64::from(self.per_page)
    }

    fn push_filters(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        qb.push(" WHERE TRUE");
        if let Some(search) = &self.search {
            let pattern = format!("%{}%", escape_like(search));
            qb.push(" AND (p.name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR p.description ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
        if let Some(min) = self.min_price {
            qb.push(" AND p.price >= ").push_bind(min);
        }
        if let Some(max) = self.max_price {
            qb.push(" AND p.price <= ").push_bind(max);
        }
        match self.stock_status {
            Some(StockStatus::InStock) => {
                qb.push(" AND p.stock_quantity > 0");
            }
            Some(StockStatus::LowStock) => {
                qb.push(" AND p.stock_quantity > 0 AND p.stock_quantity < ")
                    .push_bind(LOW_STOCK_THRESHOLD);
            }
            Some(StockStatus::OutOfStock) => {
                qb.push(" AND p.stock_quantity = 0");
            }
            None => {}
        }
    }
}

impl Default for AdminProductQuery {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: Self::DEFAULT_PER_PAGE,
            search: None,
            min_price: None,
            max_price: None,
            stock_status: None,
            sort: ProductSort::default(),
            reverse: false,
        }
    }
}

/// A product row on the admin list.
#[derive(Debug, Clone)]
pub struct AdminProductSummary {
    pub product: Product,
    pub image_count: i64,
    pub primary_image_url: Option<String>,
}

/// One page of the admin product list.
#[derive(Debug, Clone)]
pub struct ProductPage {
    pub products: Vec<AdminProductSummary>,
    pub total: i64,
    pub page: u32,
    pub per_page: u32,
}

impl ProductPage {
    #[must_use]
    pub fn total_pages(&self) -> i64 {
        let per_page = i64::from(self.per_page.max(1));
        (self.total + per_page - 1) / per_page
    }
}

/// Escape `%`, `_` and `\` so user input matches literally inside ILIKE.
fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a product and return the stored row.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    #[tracing::instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create(&self, input: &CreateProductInput) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            INSERT INTO products (name, description, price, stock_quantity)
            VALUES ($1, $2, $3, $4)
            RETURNING product_id, name, description, price, stock_quantity, created_at, updated_at
            ",
        )
        .bind(input.name.trim())
        .bind(input.description.as_deref())
        .bind(input.price.amount())
        .bind(input.stock_quantity.get())
        .fetch_one(self.pool)
        .await?;

        row.try_into()
    }

    /// Insert a product unless one with the same name exists.
    ///
    /// Returns `true` if a row was inserted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create_if_missing(&self, input: &CreateProductInput) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            INSERT INTO products (name, description, price, stock_quantity)
            SELECT $1, $2, $3, $4
            WHERE NOT EXISTS (SELECT 1 FROM products WHERE name = $1)
            ",
        )
        .bind(input.name.trim())
        .bind(input.description.as_deref())
        .bind(input.price.amount())
        .bind(input.stock_quantity.get())
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT product_id, name, description, price, stock_quantity, created_at, updated_at
            FROM products
            WHERE product_id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(Product::try_from).transpose()
    }

    /// All products, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT product_id, name, description, price, stock_quantity, created_at, updated_at
            FROM products
            ORDER BY created_at DESC, product_id DESC
            ",
        )
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Product::try_from).collect()
    }

    /// Merge `input` over the stored product.
    ///
    /// The row is locked while merging so a concurrent order cannot change the
    /// stock between the read and the write.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    /// Returns `RepositoryError::Database` for other database errors.
    #[tracing::instrument(skip(self, input), fields(product_id = %id))]
    pub async fn update(
        &self,
        id: ProductId,
        input: UpdateProductInput,
    ) -> Result<Product, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let current: Product = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT product_id, name, description, price, stock_quantity, created_at, updated_at
            FROM products
            WHERE product_id = $1
            FOR UPDATE
            ",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?
        .try_into()?;

        let merged = input.apply(current);

        let row = sqlx::query_as::<_, ProductRow>(
            r"
            UPDATE products
            SET name = $2, description = $3, price = $4, stock_quantity = $5, updated_at = NOW()
            WHERE product_id = $1
            RETURNING product_id, name, description, price, stock_quantity, created_at, updated_at
            ",
        )
        .bind(id)
        .bind(&merged.name)
        .bind(merged.description.as_deref())
        .bind(merged.price.amount())
        .bind(merged.stock_quantity.get())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        row.try_into()
    }

    /// Delete a product. Returns `false` if it did not exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if order items still reference it.
    /// Returns `RepositoryError::Database` for other database errors.
    #[tracing::instrument(skip(self), fields(product_id = %id))]
    pub async fn delete(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM products WHERE product_id = $1")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| map_constraint(e, "product is referenced by existing orders"))?;

        Ok(result.rows_affected() > 0)
    }

    /// One filtered, sorted page of products for the admin list.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    #[tracing::instrument(skip(self))]
    pub async fn list_admin(&self, query: &AdminProductQuery) -> Result<ProductPage, RepositoryError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM products p");
        query.push_filters(&mut count);
        let total: i64 = count.build_query_scalar().fetch_one(self.pool).await?;

        let mut select = QueryBuilder::<Postgres>::new(
            r"
            SELECT p.product_id, p.name, p.description, p.price, p.stock_quantity,
                   p.created_at, p.updated_at,
                   (SELECT COUNT(*) FROM product_images pi
                     WHERE pi.product_id = p.product_id) AS image_count,
                   (SELECT pi.image_url FROM product_images pi
                     WHERE pi.product_id = p.product_id AND pi.is_primary
                     LIMIT 1) AS primary_image_url
            FROM products p",
        );
        query.push_filters(&mut select);
        let direction = if query.reverse { "ASC" } else { "DESC" };
        select
            .push(" ORDER BY ")
            .push(query.sort.column())
            .push(" ")
            .push(direction)
            .push(", p.product_id ")
            .push(direction)
            .push(" LIMIT ")
            .push_bind(i64::from(query.per_page))
            .push(" OFFSET ")
            .push_bind(query.offset());

        let rows: Vec<AdminProductRow> = select.build_query_as().fetch_all(self.pool).await?;

        let products = rows
            .into_iter()
            .map(|row| {
                Ok(AdminProductSummary {
                    product: row.product.try_into()?,
                    image_count: row.image_count,
                    primary_image_url: row.primary_image_url,
                })
            })
            .collect::<Result<Vec<_>, RepositoryError>>()?;

        Ok(ProductPage {
            products,
            total,
            page: query.page,
            per_page: query.per_page,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset() {
        let query = AdminProductQuery {
            page: 3,
            per_page: 20,
            ..AdminProductQuery::default()
        };
        assert_eq!(query.offset(), 40);
        assert_eq!(AdminProductQuery::default().offset(), 0);
    }

    #[test]
    fn test_total_pages_rounds_up() {
        let page = |total| ProductPage {
            products: vec![],
            total,
            page: 1,
            per_page: 10,
        };
        assert_eq!(page(0).total_pages(), 0);
        assert_eq!(page(10).total_pages(), 1);
        assert_eq!(page(11).total_pages(), 2);
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("lamp"), "lamp");
    }

    #[test]
    fn test_filters_bind_user_input() {
        let query = AdminProductQuery {
            search: Some("lamp'; DROP TABLE products; --".to_owned()),
            stock_status: Some(StockStatus::LowStock),
            sort: ProductSort::Price,
            ..AdminProductQuery::default()
        };
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM products p");
        query.push_filters(&mut qb);
        let sql = qb.sql();

        assert!(!sql.contains("DROP TABLE"));
        assert!(sql.contains("p.name ILIKE $1"));
        assert!(sql.contains("p.stock_quantity < $3"));
    }

    #[test]
    fn test_sort_param_falls_back_to_created_at() {
        assert_eq!(ProductSort::from_param("price"), ProductSort::Price);
        assert_eq!(ProductSort::from_param("1; DROP"), ProductSort::CreatedAt);
        assert_eq!(StockStatus::from_param(""), None);
    }
}
