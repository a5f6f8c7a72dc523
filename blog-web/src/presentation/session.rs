use std::convert::Infallible;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::{Redirect, Response},
};
use serde::Serialize;
use tower_cookies::cookie::{SameSite, time::Duration};
use tower_cookies::{Cookie, Cookies};
use tracing::debug;

use crate::presentation::AppState;
use crate::presentation::http::app_error::AppError;

pub(crate) const SESSION_COOKIE_NAME: &str = "blog_session";

#[derive(Debug, Clone, Serialize)]
pub(crate) struct AuthenticatedUser {
    pub(crate) user_id: i64,
    pub(crate) username: String,
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or(AppError::Unauthorized)
    }
}

/// The visitor, if signed in.
#[derive(Debug, Clone)]
pub(crate) struct CurrentUser(pub(crate) Option<AuthenticatedUser>);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(parts.extensions.get::<AuthenticatedUser>().cloned()))
    }
}

/// Page guard: anonymous visitors are sent to the login page and brought back
/// afterwards.
#[derive(Debug, Clone)]
pub(crate) struct LoginRequired(pub(crate) AuthenticatedUser);

impl<S> FromRequestParts<S> for LoginRequired
where
    S: Send + Sync,
{
    type Rejection = Redirect;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<AuthenticatedUser>() {
            Some(user) => Ok(Self(user.clone())),
            None => Err(Redirect::to(&login_url(parts.uri.path()))),
        }
    }
}

fn login_url(next: &str) -> String {
    format!("/login/?next={next}")
}

/// Resolves the caller from a `Bearer` header or the session cookie.
///
/// A bad bearer token is rejected outright. A bad cookie only drops the
/// session, so stale browsers fall back to anonymous browsing.
pub(crate) async fn session_middleware(
    State(state): State<AppState>,
    cookies: Cookies,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .map(|value| value.to_str().map_err(|_| AppError::Unauthorized))
        .transpose()?;

    let user = match auth_header {
        Some(value) => {
            let token = parse_bearer(value).ok_or(AppError::Unauthorized)?;
            let claims = state
                .jwt
                .verify_token(token)
                .map_err(|_| AppError::Unauthorized)?;
            Some(AuthenticatedUser {
                user_id: claims.user_id,
                username: claims.username,
            })
        }
        None => cookies
            .get(SESSION_COOKIE_NAME)
            .and_then(|cookie| match state.jwt.verify_token(cookie.value()) {
                Ok(claims) => Some(AuthenticatedUser {
                    user_id: claims.user_id,
                    username: claims.username,
                }),
                Err(err) => {
                    debug!(error = %err, "dropping invalid session cookie");
                    end_session(&cookies);
                    None
                }
            }),
    };

    if let Some(user) = user {
        request.extensions_mut().insert(user);
    }

    Ok(next.run(request).await)
}

fn parse_bearer(value: &str) -> Option<&str> {
    let mut parts = value.split_whitespace();
    let scheme = parts.next()?;
    let token = parts.next()?;
    if parts.next().is_some() || !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    Some(token)
}

pub(crate) fn start_session(cookies: &Cookies, token: String, secure: bool, ttl_seconds: i64) {
    let mut cookie = Cookie::new(SESSION_COOKIE_NAME, token);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_secure(secure);
    cookie.set_max_age(Duration::seconds(ttl_seconds));
    cookies.add(cookie);
}

pub(crate) fn end_session(cookies: &Cookies) {
    let mut cookie = Cookie::new(SESSION_COOKIE_NAME, "");
    cookie.set_path("/");
    cookies.remove(cookie);
}
