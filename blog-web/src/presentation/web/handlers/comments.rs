use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use tower_cookies::Cookies;
use tracing::debug;
use validator::Validate;

use crate::application::blog_service::CommentDeletion;
use crate::domain::comment::CreateCommentRequest;
use crate::domain::error::DomainError;
use crate::presentation::AppState;
use crate::presentation::session::LoginRequired;
use crate::presentation::web::error::PageResult;
use crate::presentation::web::flash::{FlashLevel, push_flash};
use crate::presentation::web::forms::CommentForm;
use crate::presentation::web::handlers::posts::detail_url;

const COMMENT_REJECTED: &str = "Could not add the comment.";

pub(crate) async fn comment_create(
    State(state): State<AppState>,
    LoginRequired(user): LoginRequired,
    cookies: Cookies,
    Path(post_id): Path<i64>,
    Form(form): Form<CommentForm>,
) -> PageResult<Response> {
    let post = state.blog_service.get_post(post_id).await?;

    if form.validate().is_err() {
        push_flash(&cookies, FlashLevel::Error, COMMENT_REJECTED);
        return Ok(Redirect::to(&detail_url(post.id)).into_response());
    }

    let req = CreateCommentRequest {
        content: form.content,
    };
    match state
        .blog_service
        .add_comment(user.user_id, post.id, req)
        .await
    {
        Ok(_) => push_flash(&cookies, FlashLevel::Success, "Comment added!"),
        Err(err @ DomainError::Validation { .. }) => {
            debug!(error = %err, post_id, "comment rejected");
            push_flash(&cookies, FlashLevel::Error, COMMENT_REJECTED);
        }
        Err(err) => return Err(err.into()),
    }

    Ok(Redirect::to(&detail_url(post.id)).into_response())
}

/// GET on the comment action, as reached after a login redirect. Sends the
/// user back to the post without changing anything.
pub(crate) async fn comment_create_fallback(
    State(state): State<AppState>,
    LoginRequired(_): LoginRequired,
    Path(post_id): Path<i64>,
) -> PageResult<Response> {
    let post = state.blog_service.get_post(post_id).await?;
    Ok(Redirect::to(&detail_url(post.id)).into_response())
}

pub(crate) async fn comment_delete_fallback(
    State(state): State<AppState>,
    LoginRequired(_): LoginRequired,
    Path(comment_id): Path<i64>,
) -> PageResult<Response> {
    let comment = state.blog_service.get_comment(comment_id).await?;
    Ok(Redirect::to(&detail_url(comment.post_id)).into_response())
}

pub(crate) async fn comment_delete(
    State(state): State<AppState>,
    LoginRequired(user): LoginRequired,
    cookies: Cookies,
    Path(comment_id): Path<i64>,
) -> PageResult<Response> {
    let outcome = state
        .blog_service
        .delete_comment(user.user_id, comment_id)
        .await?;

    match outcome {
        CommentDeletion::Deleted { .. } => {
            push_flash(&cookies, FlashLevel::Success, "Comment deleted!")
        }
        CommentDeletion::Denied { .. } => {
            push_flash(&cookies, FlashLevel::Error, "You cannot delete this comment.")
        }
    }

    Ok(Redirect::to(&detail_url(outcome.post_id())).into_response())
}
