//! Admin product add/edit forms.
//!
//! Fields arrive as text so each one can fail on its own: a rejected form is
//! re-rendered with the submitted values and a message under every bad field.

use std::str::FromStr;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
};
use rust_decimal::Decimal;
use serde::Deserialize;

use shopdesk_core::{MoneyError, Price, ProductId, Stock};

use crate::db::{ProductImageRepository, ProductRepository, RepositoryError};
use crate::error::{AppError, add_breadcrumb};
use crate::filters;
use crate::middleware::RequireAdminPage;
use crate::models::product::validate_name;
use crate::models::{CreateProductInput, Product, ProductImage, UpdateProductInput};
use crate::state::AppState;

/// Raw fields of the product form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProductForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub stock_quantity: String,
}

/// Per-field messages for a rejected form.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct FieldErrors {
    pub name: Option<String>,
    pub price: Option<String>,
    pub stock_quantity: Option<String>,
}

/// A form that passed every field rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidProduct {
    pub name: String,
    pub description: Option<String>,
    pub price: Price,
    pub stock_quantity: Stock,
}

impl From<&Product> for ProductForm {
    fn from(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            description: product.description.clone().unwrap_or_default(),
            price: product.price.to_string(),
            stock_quantity: product.stock_quantity.to_string(),
        }
    }
}

fn parse_price(raw: &str) -> Result<Price, String> {
    let amount = Decimal::from_str(raw.trim()).map_err(|_| "Price must be a number".to_owned())?;
    Price::new(amount).map_err(|e| match e {
        MoneyError::TooLarge => "Price is too large".to_owned(),
        MoneyError::NotPositive | MoneyError::Negative => {
            "Price must be greater than zero".to_owned()
        }
    })
}

fn parse_stock(raw: &str) -> Result<Stock, String> {
    let value = raw
        .trim()
        .parse::<i32>()
        .map_err(|_| "Stock quantity must be a whole number".to_owned())?;
    Stock::new(value).map_err(|_| "Stock quantity cannot be negative".to_owned())
}

impl ProductForm {
    /// Check every field, collecting all failures rather than the first.
    ///
    /// # Errors
    ///
    /// Returns the messages of each field that broke a rule.
    pub fn validate(&self) -> Result<ValidProduct, FieldErrors> {
        let name = validate_name(&self.name).map_err(|e| e.to_string());
        let price = parse_price(&self.price);
        let stock_quantity = parse_stock(&self.stock_quantity);

        match (name, price, stock_quantity) {
            (Ok(()), Ok(price), Ok(stock_quantity)) => {
                let description = self.description.trim();
                Ok(ValidProduct {
                    name: self.name.trim().to_owned(),
                    description: (!description.is_empty()).then(|| description.to_owned()),
                    price,
                    stock_quantity,
                })
            }
            (name, price, stock_quantity) => Err(FieldErrors {
                name: name.err(),
                price: price.err(),
                stock_quantity: stock_quantity.err(),
            }),
        }
    }
}

impl ValidProduct {
    fn into_create(self) -> CreateProductInput {
        CreateProductInput {
            name: self.name,
            description: self.description,
            price: self.price,
            stock_quantity: self.stock_quantity,
        }
    }

    fn into_update(self) -> UpdateProductInput {
        UpdateProductInput {
            name: Some(self.name),
            // An emptied textarea clears the description
            description: Some(self.description.unwrap_or_default()),
            price: Some(self.price),
            stock_quantity: Some(self.stock_quantity),
        }
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "admin/products/form.html")]
pub struct ProductFormTemplate {
    pub username: String,
    /// `None` on the add page.
    pub product: Option<Product>,
    pub images: Vec<ProductImage>,
    pub form: ProductForm,
    pub errors: FieldErrors,
    pub error: Option<String>,
    pub success: Option<String>,
}

impl ProductFormTemplate {
    fn blank(username: String) -> Self {
        Self {
            username,
            product: None,
            images: Vec::new(),
            form: ProductForm::default(),
            errors: FieldErrors::default(),
            error: None,
            success: None,
        }
    }

    fn for_product(username: String, product: Product, images: Vec<ProductImage>) -> Self {
        Self {
            form: ProductForm::from(&product),
            product: Some(product),
            images,
            ..Self::blank(username)
        }
    }

    fn rejected(mut self, form: ProductForm, errors: FieldErrors) -> Response {
        self.form = form;
        self.errors = errors;
        self.error = Some("Please fix the validation errors".to_owned());
        (StatusCode::UNPROCESSABLE_ENTITY, self).into_response()
    }
}

async fn load_product(
    state: &AppState,
    id: ProductId,
) -> Result<(Product, Vec<ProductImage>), AppError> {
    let product = ProductRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("Product"))?;
    let images = ProductImageRepository::new(state.pool())
        .list_for_product(id)
        .await?;
    Ok((product, images))
}

/// `GET /admin/products/add`
pub async fn add_page(RequireAdminPage(admin): RequireAdminPage) -> impl IntoResponse {
    ProductFormTemplate::blank(admin.username)
}

/// `GET /admin/products/edit/{id}`
pub async fn edit_page(
    State(state): State<AppState>,
    RequireAdminPage(admin): RequireAdminPage,
    Path(id): Path<ProductId>,
) -> Result<impl IntoResponse, AppError> {
    let (product, images) = load_product(&state, id).await?;
    Ok(ProductFormTemplate::for_product(admin.username, product, images))
}

/// `POST /admin/products`
#[tracing::instrument(skip(state, admin, form), fields(name = %form.name))]
pub async fn create(
    State(state): State<AppState>,
    RequireAdminPage(admin): RequireAdminPage,
    Form(form): Form<ProductForm>,
) -> Result<Response, AppError> {
    let valid = match form.validate() {
        Ok(valid) => valid,
        Err(errors) => return Ok(ProductFormTemplate::blank(admin.username).rejected(form, errors)),
    };

    let product = ProductRepository::new(state.pool())
        .create(&valid.into_create())
        .await?;

    tracing::info!(product_id = %product.product_id, "product created from admin form");
    add_breadcrumb(
        "products",
        "Product created",
        &[("product_id", product.product_id.to_string())],
    );

    let mut page = ProductFormTemplate::for_product(admin.username, product, Vec::new());
    page.success = Some("Product created successfully!".to_owned());
    Ok((StatusCode::CREATED, page).into_response())
}

/// `PUT /admin/products/{id}`, also accepted as `POST` from a plain form.
#[tracing::instrument(skip(state, admin, form), fields(product_id = %id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdminPage(admin): RequireAdminPage,
    Path(id): Path<ProductId>,
    Form(form): Form<ProductForm>,
) -> Result<Response, AppError> {
    let (product, images) = load_product(&state, id).await?;
    let page = ProductFormTemplate::for_product(admin.username, product, images);

    let valid = match form.validate() {
        Ok(valid) => valid,
        Err(errors) => return Ok(page.rejected(form, errors)),
    };

    let updated = ProductRepository::new(state.pool())
        .update(id, valid.into_update())
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AppError::not_found("Product"),
            other => other.into(),
        })?;

    add_breadcrumb("products", "Product updated", &[("product_id", id.to_string())]);

    let mut page = ProductFormTemplate::for_product(page.username, updated, page.images);
    page.success = Some("Product updated successfully!".to_owned());
    Ok(page.into_response())
}

/// `DELETE /admin/products/{id}` (htmx) or `POST /admin/products/{id}/delete`.
///
/// htmx requests get an `HX-Redirect` to the list; plain forms a 303. A
/// product that orders still reference is refused with a 409 on its edit page.
#[tracing::instrument(skip(state, admin, headers), fields(product_id = %id))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAdminPage(admin): RequireAdminPage,
    Path(id): Path<ProductId>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    match ProductRepository::new(state.pool()).delete(id).await {
        Ok(true) => {
            tracing::info!("product deleted from admin form");
            if headers.contains_key("hx-request") {
                Ok((StatusCode::OK, [("HX-Redirect", "/admin/products")]).into_response())
            } else {
                Ok(Redirect::to("/admin/products").into_response())
            }
        }
        Ok(false) => Err(AppError::not_found("Product")),
        Err(RepositoryError::Conflict(message)) => {
            let (product, images) = load_product(&state, id).await?;
            let mut page = ProductFormTemplate::for_product(admin.username, product, images);
            page.error = Some(format!("Cannot delete: {message}"));
            Ok((StatusCode::CONFLICT, page).into_response())
        }
        Err(e) => Err(e.into()),
    }
}
