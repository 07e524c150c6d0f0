//! Admin order pages.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};

use shopdesk_core::{OrderId, OrderStatus};

use crate::db::{OrderError, OrderRepository, UserRepository};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::middleware::RequireAdminPage;
use crate::models::{CustomerOrder, OrderDetail, UpdateOrderStatusInput};
use crate::state::AppState;

/// Most orders shown on the list page.
const ORDER_LIST_LIMIT: i64 = 200;

#[derive(Template, WebTemplate)]
#[template(path = "admin/orders.html")]
pub struct OrdersTemplate {
    pub username: String,
    pub orders: Vec<CustomerOrder>,
}

#[derive(Template, WebTemplate)]
#[template(path = "admin/order_detail.html")]
pub struct OrderDetailTemplate {
    pub username: String,
    pub detail: OrderDetail,
    pub customer: String,
    pub statuses: &'static [OrderStatus],
    pub error: Option<String>,
}

/// `GET /admin/orders`
pub async fn index(
    State(state): State<AppState>,
    RequireAdminPage(admin): RequireAdminPage,
) -> Result<impl IntoResponse> {
    let orders = OrderRepository::new(state.pool())
        .list_with_customers(ORDER_LIST_LIMIT)
        .await?;

    Ok(OrdersTemplate {
        username: admin.username,
        orders,
    })
}

async fn detail_page(
    state: &AppState,
    username: String,
    id: OrderId,
    error: Option<String>,
) -> Result<OrderDetailTemplate> {
    let detail = OrderRepository::new(state.pool())
        .get_with_items(id)
        .await?
        .ok_or_else(|| AppError::not_found("Order"))?;

    let customer = UserRepository::new(state.pool())
        .get_by_id(detail.order.user_id)
        .await?
        .map_or_else(|| detail.order.user_id.to_string(), |u| u.username);

    Ok(OrderDetailTemplate {
        username,
        detail,
        customer,
        statuses: OrderStatus::ALL,
        error,
    })
}

/// `GET /admin/orders/{id}`
pub async fn show(
    State(state): State<AppState>,
    RequireAdminPage(admin): RequireAdminPage,
    Path(id): Path<OrderId>,
) -> Result<impl IntoResponse> {
    detail_page(&state, admin.username, id, None).await
}

/// `POST /admin/orders/{id}/status`
///
/// Redirects back to the detail page on success. A refused transition
/// re-renders the page with the reason and a 409.
#[tracing::instrument(skip(state, admin), fields(order_id = %id))]
pub async fn update_status(
    State(state): State<AppState>,
    RequireAdminPage(admin): RequireAdminPage,
    Path(id): Path<OrderId>,
    Form(form): Form<UpdateOrderStatusInput>,
) -> Result<Response> {
    match OrderRepository::new(state.pool())
        .update_status(id, form.status)
        .await
    {
        Ok(_) => {
            add_breadcrumb(
                "orders",
                "Order status changed",
                &[
                    ("order_id", id.to_string()),
                    ("status", form.status.to_string()),
                    ("by", admin.username),
                ],
            );
            Ok(Redirect::to(&format!("/admin/orders/{id}")).into_response())
        }
        Err(OrderError::InvalidStatusTransition(e)) => {
            let page = detail_page(&state, admin.username, id, Some(e.to_string())).await?;
            Ok((StatusCode::CONFLICT, page).into_response())
        }
        Err(e) => Err(e.into()),
    }
}
