use axum::{
    Router,
    routing::{get, post},
};

use crate::presentation::AppState;
use crate::presentation::http::handlers::auth::{login, register};
use crate::presentation::http::handlers::comments::{create_comment, list_comments};
use crate::presentation::http::handlers::health::healthz;
use crate::presentation::http::handlers::posts::{
    create_post, delete_post, get_post, list_posts, patch_post, update_post,
};

fn auth_router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

/// Write handlers take [`AuthenticatedUser`](crate::presentation::session::AuthenticatedUser),
/// which answers 401 for anonymous callers.
fn posts_router() -> Router<AppState> {
    Router::new()
        .route("/api/posts/", get(list_posts).post(create_post))
        .route(
            "/api/posts/{id}/",
            get(get_post)
                .put(update_post)
                .patch(patch_post)
                .delete(delete_post),
        )
        .route(
            "/api/posts/{id}/comments/",
            get(list_comments).post(create_comment),
        )
}

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/healthz", get(healthz))
        .nest("/api/auth", auth_router())
        .merge(posts_router())
}
