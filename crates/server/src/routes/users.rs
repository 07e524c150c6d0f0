//! User accounts and login.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Serialize;

use shopdesk_core::UserId;

use super::{ApiJson, JsonOrForm};
use crate::db::{OrderRepository, UserRepository};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::{CurrentUser, RequireAdmin};
use crate::models::{CreateUserInput, LoginInput, Order, UpdateUserInput, UserResponse};
use crate::services::auth::{AuthService, hash_password};
use crate::state::AppState;

/// Body of a successful login.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
}

/// `POST /users/login` with a JSON or form body.
#[tracing::instrument(skip(state, input), fields(username = %input.username))]
pub async fn login(
    State(state): State<AppState>,
    JsonOrForm(input): JsonOrForm<LoginInput>,
) -> Result<Json<TokenResponse>> {
    let (_, access_token) = AuthService::new(state.pool(), state.jwt())
        .login(&input.username, &input.password)
        .await?;

    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer",
    }))
}

/// `POST /users`: open registration, always as a customer.
#[tracing::instrument(skip(state, input))]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<CreateUserInput>,
) -> Result<impl IntoResponse> {
    let (new_user, password) = input.validate()?;
    let password_hash = hash_password(&password)?;

    let user = UserRepository::new(state.pool())
        .create(&new_user, &password_hash)
        .await?;

    tracing::info!(user_id = %user.id, username = %user.username, "user registered");
    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

/// `GET /users`
pub async fn list(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
) -> Result<Json<Vec<UserResponse>>> {
    let users = UserRepository::new(state.pool()).list().await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// `GET /users/{id}`
pub async fn show(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    Path(id): Path<UserId>,
) -> Result<Json<UserResponse>> {
    if !principal.can_act_for(id) {
        return Err(AppError::forbidden());
    }

    let user = UserRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;

    Ok(Json(user.into()))
}

/// `PUT /users/{id}`: partial update. Only admins may change a role.
#[tracing::instrument(skip(state, principal, input), fields(user_id = %id))]
pub async fn update(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    Path(id): Path<UserId>,
    ApiJson(input): ApiJson<UpdateUserInput>,
) -> Result<Json<UserResponse>> {
    if !principal.can_act_for(id) {
        return Err(AppError::forbidden());
    }
    if input.role.is_some() && !principal.is_admin() {
        return Err(AppError::Forbidden("only admins can change roles".to_owned()));
    }

    let (changes, password) = input.validate()?;
    let password_hash = password.as_deref().map(hash_password).transpose()?;

    let user = UserRepository::new(state.pool())
        .update(id, &changes, password_hash.as_deref())
        .await?;

    add_breadcrumb("users", "User updated", &[("user_id", id.to_string())]);
    Ok(Json(user.into()))
}

/// `DELETE /users/{id}`
#[tracing::instrument(skip(state, principal), fields(user_id = %id))]
pub async fn delete(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    Path(id): Path<UserId>,
) -> Result<StatusCode> {
    if !principal.can_act_for(id) {
        return Err(AppError::forbidden());
    }

    if !UserRepository::new(state.pool()).delete(id).await? {
        return Err(AppError::not_found("User"));
    }

    tracing::info!("user deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /users/{id}/orders`: a user's order history, newest first.
pub async fn orders(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    Path(id): Path<UserId>,
) -> Result<Json<Vec<Order>>> {
    if !principal.can_act_for(id) {
        return Err(AppError::forbidden());
    }

    UserRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;

    let orders = OrderRepository::new(state.pool()).list_for_user(id).await?;
    Ok(Json(orders))
}
