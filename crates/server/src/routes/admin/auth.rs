//! Admin login and logout.
//!
//! The admin pages authenticate with the same JWT as the API, carried in an
//! `HttpOnly` cookie instead of a header.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Redirect, Response},
};

use crate::filters;
use crate::middleware::auth::{expired_session_cookie, session_cookie};
use crate::models::LoginInput;
use crate::services::auth::{AuthError, AuthService};
use crate::state::AppState;

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/login.html")]
pub struct LoginTemplate {
    pub error: Option<String>,
    pub username: String,
}

/// `GET /admin/login`
pub async fn login_page() -> impl IntoResponse {
    LoginTemplate {
        error: None,
        username: String::new(),
    }
}

/// `POST /admin/login`
#[tracing::instrument(skip(state, form), fields(username = %form.username))]
pub async fn login(State(state): State<AppState>, Form(form): Form<LoginInput>) -> Response {
    let rejected = |status: StatusCode, message: &str, username: String| {
        (
            status,
            LoginTemplate {
                error: Some(message.to_owned()),
                username,
            },
        )
            .into_response()
    };

    let result = AuthService::new(state.pool(), state.jwt())
        .login(&form.username, &form.password)
        .await;

    let (user, token) = match result {
        Ok(ok) => ok,
        Err(AuthError::InvalidCredentials) => {
            return rejected(
                StatusCode::UNAUTHORIZED,
                "Incorrect username or password",
                form.username,
            );
        }
        Err(e) => {
            let event_id = sentry::capture_error(&e);
            tracing::error!(error = %e, sentry_event_id = %event_id, "admin login failed");
            return rejected(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Login is unavailable right now",
                form.username,
            );
        }
    };

    if user.role != shopdesk_core::UserRole::Admin {
        tracing::warn!(user_id = %user.id, "non-admin attempted admin login");
        return rejected(StatusCode::FORBIDDEN, "Admin access required", form.username);
    }

    let cookie = session_cookie(
        token,
        state.jwt().ttl_seconds(),
        state.config().auth.secure_cookies,
    );

    (
        [(header::SET_COOKIE, cookie.to_string())],
        Redirect::to("/admin/dashboard"),
    )
        .into_response()
}

/// `POST /admin/logout`
pub async fn logout() -> impl IntoResponse {
    (
        [(header::SET_COOKIE, expired_session_cookie().to_string())],
        Redirect::to("/admin/login"),
    )
}
