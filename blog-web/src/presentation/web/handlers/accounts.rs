use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use tera::Context;
use tower_cookies::Cookies;
use validator::Validate;

use crate::domain::error::DomainError;
use crate::domain::user::{LoginRequest, RegisterRequest};
use crate::presentation::AppState;
use crate::presentation::field_errors::FieldErrors;
use crate::presentation::session::{CurrentUser, LoginRequired, end_session, start_session};
use crate::presentation::web::error::{PageError, PageResult};
use crate::presentation::web::flash::{FlashLevel, push_flash};
use crate::presentation::web::forms::{LoginForm, NextQuery, RegisterForm, safe_next};
use crate::presentation::web::render::render;
use crate::presentation::web::views::{PostView, ProfileView};

const FIX_ERRORS: &str = "Please correct the errors below.";
const BAD_LOGIN: &str = "Please enter a correct username and password.";

fn render_register(
    state: &AppState,
    cookies: &Cookies,
    form: &RegisterForm,
    errors: &FieldErrors,
) -> PageResult<Response> {
    let mut context = Context::new();
    context.insert("form", form);
    context.insert("errors", errors);
    Ok(render(state, cookies, None, "register.html", context)?.into_response())
}

pub(crate) async fn register_form(
    State(state): State<AppState>,
    cookies: Cookies,
) -> PageResult<Response> {
    render_register(&state, &cookies, &RegisterForm::default(), &FieldErrors::default())
}

/// Creates the account, signs it in and returns to the post list.
pub(crate) async fn register(
    State(state): State<AppState>,
    cookies: Cookies,
    Form(form): Form<RegisterForm>,
) -> PageResult<Response> {
    if let Err(errors) = form.validate() {
        push_flash(&cookies, FlashLevel::Error, FIX_ERRORS);
        return render_register(&state, &cookies, &form, &FieldErrors::from(&errors));
    }

    let req = RegisterRequest {
        username: form.username.clone(),
        email: form.email.clone(),
        password: form.password1.clone(),
        password_confirmation: form.password2.clone(),
    };
    match state.auth_service.register(req).await {
        Ok(result) => {
            start_session(
                &cookies,
                result.access_token,
                state.config.session_cookie_secure,
                state.jwt.ttl_seconds(),
            );
            push_flash(
                &cookies,
                FlashLevel::Success,
                format!("Account created! Welcome, {}.", result.user.username),
            );
            Ok(Redirect::to("/").into_response())
        }
        Err(err) => {
            let errors = FieldErrors::from_domain(&err).ok_or(PageError::Domain(err))?;
            push_flash(&cookies, FlashLevel::Error, FIX_ERRORS);
            render_register(&state, &cookies, &form, &errors)
        }
    }
}

fn render_login(
    state: &AppState,
    cookies: &Cookies,
    form: &LoginForm,
    errors: &FieldErrors,
    error: Option<&str>,
) -> PageResult<Response> {
    let mut context = Context::new();
    context.insert("form", form);
    context.insert("errors", errors);
    context.insert("error", &error);
    Ok(render(state, cookies, None, "login.html", context)?.into_response())
}

pub(crate) async fn login_form(
    State(state): State<AppState>,
    cookies: Cookies,
    Query(query): Query<NextQuery>,
) -> PageResult<Response> {
    let form = LoginForm {
        next: query.next,
        ..LoginForm::default()
    };
    render_login(&state, &cookies, &form, &FieldErrors::default(), None)
}

pub(crate) async fn login(
    State(state): State<AppState>,
    cookies: Cookies,
    Form(form): Form<LoginForm>,
) -> PageResult<Response> {
    if let Err(errors) = form.validate() {
        return render_login(&state, &cookies, &form, &FieldErrors::from(&errors), None);
    }

    let req = LoginRequest {
        username: form.username.clone(),
        password: form.password.clone(),
    };
    match state.auth_service.login(req).await {
        Ok(result) => {
            start_session(
                &cookies,
                result.access_token,
                state.config.session_cookie_secure,
                state.jwt.ttl_seconds(),
            );
            Ok(Redirect::to(safe_next(form.next.as_deref())).into_response())
        }
        Err(DomainError::InvalidCredentials | DomainError::Validation { .. }) => {
            render_login(&state, &cookies, &form, &FieldErrors::default(), Some(BAD_LOGIN))
        }
        Err(err) => Err(err.into()),
    }
}

pub(crate) async fn logout(cookies: Cookies, CurrentUser(viewer): CurrentUser) -> Response {
    end_session(&cookies);
    if viewer.is_some() {
        push_flash(&cookies, FlashLevel::Info, "You have been logged out.");
    }
    Redirect::to("/").into_response()
}

pub(crate) async fn profile(
    State(state): State<AppState>,
    LoginRequired(user): LoginRequired,
    cookies: Cookies,
) -> PageResult<Response> {
    let account = state.auth_service.get_user(user.user_id).await?;
    let posts = state.blog_service.list_posts_by_author(user.user_id).await?;

    let mut context = Context::new();
    context.insert("profile", &ProfileView::from(account));
    context.insert("posts", &PostView::list(posts, Some(&user)));
    Ok(render(&state, &cookies, Some(&user), "profile.html", context)?.into_response())
}
