//! Order placement, lookup and status transitions.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use shopdesk_core::OrderId;

use crate::db::{OrderRepository, UserRepository};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::{CurrentUser, RequireAdmin};
use crate::models::{CreateOrderInput, Order, OrderDetail, UpdateOrderStatusInput};
use crate::state::AppState;

use super::ApiJson;

/// `POST /orders`: customers order for themselves, admins for anyone.
#[tracing::instrument(skip(state, principal, input), fields(user_id = %input.user_id))]
pub async fn create(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    ApiJson(input): ApiJson<CreateOrderInput>,
) -> Result<impl IntoResponse> {
    if !principal.can_act_for(input.user_id) {
        return Err(AppError::forbidden());
    }

    let request = input.into_request()?;

    UserRepository::new(state.pool())
        .get_by_id(request.user_id())
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;

    let detail = OrderRepository::new(state.pool())
        .create_order(&request)
        .await?;

    add_breadcrumb(
        "orders",
        "Order created",
        &[("order_id", detail.order.order_id.to_string())],
    );
    Ok((StatusCode::CREATED, Json(detail)))
}

/// `GET /orders`: every order, newest first.
pub async fn list(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
) -> Result<Json<Vec<Order>>> {
    Ok(Json(OrderRepository::new(state.pool()).list().await?))
}

/// `GET /orders/{id}`: the owner or an admin.
pub async fn show(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    Path(id): Path<OrderId>,
) -> Result<Json<OrderDetail>> {
    let detail = OrderRepository::new(state.pool())
        .get_with_items(id)
        .await?
        .ok_or_else(|| AppError::not_found("Order"))?;

    if !principal.can_act_for(detail.order.user_id) {
        return Err(AppError::forbidden());
    }

    Ok(Json(detail))
}

/// `PUT /orders/{id}`: status transition.
#[tracing::instrument(skip(state, admin), fields(order_id = %id))]
pub async fn update_status(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<OrderId>,
    ApiJson(input): ApiJson<UpdateOrderStatusInput>,
) -> Result<Json<OrderDetail>> {
    let detail = OrderRepository::new(state.pool())
        .update_status(id, input.status)
        .await?;

    add_breadcrumb(
        "orders",
        "Order status changed",
        &[
            ("order_id", id.to_string()),
            ("status", input.status.to_string()),
            ("by", admin.username),
        ],
    );
    Ok(Json(detail))
}
