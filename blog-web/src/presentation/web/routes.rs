use axum::{
    Router,
    routing::{get, post},
};

use crate::presentation::AppState;
use crate::presentation::web::handlers::accounts::{
    login, login_form, logout, profile, register, register_form,
};
use crate::presentation::web::handlers::comments::{
    comment_create, comment_create_fallback, comment_delete, comment_delete_fallback,
};
use crate::presentation::web::handlers::posts::{
    post_create, post_delete, post_delete_confirm, post_detail, post_list, post_new_form,
    post_update, post_update_form,
};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(post_list))
        .route("/post/new/", get(post_new_form).post(post_create))
        .route("/post/{id}/", get(post_detail))
        .route("/post/{id}/update/", get(post_update_form).post(post_update))
        .route("/post/{id}/delete/", get(post_delete_confirm).post(post_delete))
        .route(
            "/post/{id}/comment/",
            get(comment_create_fallback).post(comment_create),
        )
        .route(
            "/comment/{id}/delete/",
            get(comment_delete_fallback).post(comment_delete),
        )
        .route("/register/", get(register_form).post(register))
        .route("/login/", get(login_form).post(login))
        .route("/logout/", post(logout))
        .route("/profile/", get(profile))
}
