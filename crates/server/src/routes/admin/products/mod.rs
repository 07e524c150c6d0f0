//! Admin product pages: the filtered list here, add/edit forms in `form`.

pub mod form;

use std::str::FromStr;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::db::{AdminProductQuery, ProductPage, ProductRepository, ProductSort, StockStatus};
use crate::error::Result;
use crate::filters;
use crate::middleware::RequireAdminPage;
use crate::state::AppState;

/// Raw query string of the product list form.
///
/// Every field arrives as text so a half-filled form (empty price boxes,
/// an unknown sort) degrades to the default instead of a 400.
#[derive(Debug, Default, Deserialize)]
pub struct ProductListParams {
    pub page: Option<String>,
    pub per_page: Option<String>,
    pub search: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub stock_status: Option<String>,
    pub sort: Option<String>,
    pub reverse: Option<String>,
}

fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty())
}

impl ProductListParams {
    #[must_use]
    pub fn to_query(&self) -> AdminProductQuery {
        let page = non_empty(self.page.as_ref())
            .and_then(|p| p.parse::<u32>().ok())
            .filter(|p| *p >= 1)
            .unwrap_or(1);
        let per_page = non_empty(self.per_page.as_ref())
            .and_then(|p| p.parse::<u32>().ok())
            .map_or(AdminProductQuery::DEFAULT_PER_PAGE, |p| {
                p.clamp(1, AdminProductQuery::MAX_PER_PAGE)
            });
        let price = |v: Option<&String>| {
            non_empty(v)
                .and_then(|p| Decimal::from_str(p).ok())
                .filter(|d| !d.is_sign_negative())
        };

        AdminProductQuery {
            page,
            per_page,
            search: non_empty(self.search.as_ref()).map(str::to_owned),
            min_price: price(self.min_price.as_ref()),
            max_price: price(self.max_price.as_ref()),
            stock_status: non_empty(self.stock_status.as_ref()).and_then(StockStatus::from_param),
            sort: non_empty(self.sort.as_ref()).map_or_else(ProductSort::default, ProductSort::from_param),
            reverse: matches!(
                non_empty(self.reverse.as_ref()),
                Some("true" | "1" | "on" | "yes")
            ),
        }
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "admin/products.html")]
pub struct ProductsTemplate {
    pub username: String,
    pub page: ProductPage,
    pub search: String,
    pub min_price: String,
    pub max_price: String,
    pub stock_status: &'static str,
    pub sort: &'static str,
    pub reverse: bool,
}

impl ProductsTemplate {
    fn has_previous(&self) -> bool {
        self.page.page > 1
    }

    fn has_next(&self) -> bool {
        i64::from(self.page.page) < self.page.total_pages()
    }
}

/// `GET /admin/products`
#[tracing::instrument(skip(state, admin))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdminPage(admin): RequireAdminPage,
    Query(params): Query<ProductListParams>,
) -> Result<impl IntoResponse> {
    let query = params.to_query();
    let page = ProductRepository::new(state.pool()).list_admin(&query).await?;

    Ok(ProductsTemplate {
        username: admin.username,
        page,
        search: query.search.unwrap_or_default(),
        min_price: query.min_price.map(|d| d.to_string()).unwrap_or_default(),
        max_price: query.max_price.map(|d| d.to_string()).unwrap_or_default(),
        stock_status: query.stock_status.map_or("", StockStatus::as_str),
        sort: query.sort.as_str(),
        reverse: query.reverse,
    })
}
