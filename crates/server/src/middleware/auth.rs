//! Authentication extractors.
//!
//! The principal comes from `Authorization: Bearer <jwt>` or, for the admin
//! pages, from the `access_token` cookie. JSON routes reject with 401/403;
//! admin pages redirect to the login form instead.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, header, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use cookie::{Cookie, SameSite};

use crate::error::{AppError, set_sentry_user};
use crate::services::auth::{AuthError, Principal};
use crate::state::AppState;

/// Cookie holding the access token for the admin pages.
pub const ACCESS_TOKEN_COOKIE: &str = "access_token";

/// Pull the raw token out of the request, header first.
fn token_from_parts(parts: &Parts) -> Option<String> {
    if let Some(value) = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
    {
        let (scheme, token) = value.split_once(' ')?;
        if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() {
            return Some(token.trim().to_owned());
        }
        return None;
    }

    parts
        .headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|c| c.name() == ACCESS_TOKEN_COOKIE)
        .map(|c| c.value().to_owned())
}

fn authenticate(parts: &Parts, state: &AppState) -> Result<Principal, AuthError> {
    let token = token_from_parts(parts).ok_or(AuthError::MissingToken)?;
    let principal = state.jwt().verify(&token)?;
    set_sentry_user(&principal.user_id, &principal.username);
    Ok(principal)
}

/// Extractor that requires a valid access token.
///
/// ```rust,ignore
/// async fn handler(CurrentUser(principal): CurrentUser) -> String {
///     principal.username
/// }
/// ```
pub struct CurrentUser(pub Principal);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(Self(authenticate(parts, state)?))
    }
}

/// Extractor that requires an admin principal (401 without a token, 403 for
/// customers).
pub struct RequireAdmin(pub Principal);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let principal = authenticate(parts, state)?;
        if !principal.is_admin() {
            return Err(AppError::forbidden());
        }
        Ok(Self(principal))
    }
}

/// Extractor for the server-rendered admin pages.
pub struct RequireAdminPage(pub Principal);

/// Rejection for [`RequireAdminPage`].
pub enum AdminPageRejection {
    /// No or invalid token: send the browser to the login form.
    RedirectToLogin,
    /// Logged in, but not as an admin.
    Forbidden,
}

impl IntoResponse for AdminPageRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to("/admin/login").into_response(),
            Self::Forbidden => (
                StatusCode::FORBIDDEN,
                "Only admins can access this page",
            )
                .into_response(),
        }
    }
}

impl FromRequestParts<AppState> for RequireAdminPage {
    type Rejection = AdminPageRejection;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let principal = authenticate(parts, state).map_err(|e| {
            tracing::debug!(error = %e, path = %parts.uri.path(), "admin page without valid token");
            AdminPageRejection::RedirectToLogin
        })?;

        if !principal.is_admin() {
            return Err(AdminPageRejection::Forbidden);
        }
        Ok(Self(principal))
    }
}

/// Cookie carrying a freshly issued token.
#[must_use]
pub fn session_cookie(token: String, max_age_seconds: i64, secure: bool) -> Cookie<'static> {
    Cookie::build((ACCESS_TOKEN_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(cookie::time::Duration::seconds(max_age_seconds))
        .build()
}

/// Cookie that removes the access token on logout.
#[must_use]
pub fn expired_session_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::build((ACCESS_TOKEN_COOKIE, "")).path("/").build();
    cookie.make_removal();
    cookie
}
