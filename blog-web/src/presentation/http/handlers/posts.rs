use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::domain::post::{CreatePostRequest, PostDetails, UpdatePostRequest};
use crate::presentation::AppState;
use crate::presentation::http::app_error::{AppResult, ErrorBody};
use crate::presentation::http::handlers::auth::UserDto;
use crate::presentation::http::handlers::comments::CommentDto;
use crate::presentation::session::AuthenticatedUser;

/// Only `title` and `content` are read; anything else in the body, such as
/// `author`, is ignored.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub(crate) struct CreatePostDto {
    #[serde(default)]
    #[validate(length(min = 1, max = 200, message = "must be 1..200 chars"))]
    pub(crate) title: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "this field is required"))]
    pub(crate) content: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub(crate) struct UpdatePostDto {
    #[serde(default)]
    #[validate(length(min = 1, max = 200, message = "must be 1..200 chars"))]
    pub(crate) title: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "this field is required"))]
    pub(crate) content: String,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub(crate) struct PatchPostDto {
    #[serde(default)]
    #[validate(length(min = 1, max = 200, message = "must be 1..200 chars"))]
    pub(crate) title: Option<String>,
    #[serde(default)]
    #[validate(length(min = 1, message = "this field is required"))]
    pub(crate) content: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct PostDto {
    pub(crate) id: i64,
    pub(crate) title: String,
    pub(crate) content: String,
    pub(crate) author: UserDto,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
    pub(crate) comments: Vec<CommentDto>,
    pub(crate) comments_count: usize,
}

impl From<PostDetails> for PostDto {
    fn from(details: PostDetails) -> Self {
        let comments_count = details.comments_count();
        Self {
            id: details.post.id,
            title: details.post.title,
            content: details.post.content,
            author: details.author.into(),
            created_at: details.post.created_at,
            updated_at: details.post.updated_at,
            comments: details.comments.into_iter().map(CommentDto::from).collect(),
            comments_count,
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/posts/",
    tag = "posts",
    responses(
        (status = 200, description = "All posts, newest first", body = Vec<PostDto>),
        (status = 500, description = "Internal error", body = ErrorBody)
    )
)]
pub(crate) async fn list_posts(State(state): State<AppState>) -> AppResult<Json<Vec<PostDto>>> {
    let posts = state.blog_service.list_posts().await?;
    Ok(Json(posts.into_iter().map(PostDto::from).collect()))
}

#[utoipa::path(
    get,
    path = "/api/posts/{id}/",
    tag = "posts",
    params(
        ("id" = i64, Path, description = "Post id")
    ),
    responses(
        (status = 200, description = "Post found", body = PostDto),
        (status = 404, description = "Post not found", body = ErrorBody),
        (status = 500, description = "Internal error", body = ErrorBody)
    )
)]
pub(crate) async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<PostDto>> {
    let details = state.blog_service.get_post_details(id).await?;
    Ok(Json(PostDto::from(details)))
}

#[utoipa::path(
    post,
    path = "/api/posts/",
    tag = "posts",
    security(
        ("bearer_auth" = [])
    ),
    request_body = CreatePostDto,
    responses(
        (status = 201, description = "Post created", body = PostDto),
        (status = 400, description = "Validation error", body = ErrorBody),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 500, description = "Internal error", body = ErrorBody)
    )
)]
pub(crate) async fn create_post(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    payload: Result<Json<CreatePostDto>, JsonRejection>,
) -> AppResult<(StatusCode, Json<PostDto>)> {
    let Json(dto) = payload?;
    dto.validate()?;
    let req = CreatePostRequest {
        title: dto.title,
        content: dto.content,
    };

    let post = state.blog_service.create_post(auth.user_id, req).await?;
    let details = state.blog_service.get_post_details(post.id).await?;
    Ok((StatusCode::CREATED, Json(PostDto::from(details))))
}

#[utoipa::path(
    put,
    path = "/api/posts/{id}/",
    tag = "posts",
    security(
        ("bearer_auth" = [])
    ),
    params(
        ("id" = i64, Path, description = "Post id")
    ),
    request_body = UpdatePostDto,
    responses(
        (status = 200, description = "Post replaced", body = PostDto),
        (status = 400, description = "Validation error", body = ErrorBody),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 403, description = "Forbidden when ownership is enforced", body = ErrorBody),
        (status = 404, description = "Post not found", body = ErrorBody),
        (status = 500, description = "Internal error", body = ErrorBody)
    )
)]
pub(crate) async fn update_post(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(id): Path<i64>,
    payload: Result<Json<UpdatePostDto>, JsonRejection>,
) -> AppResult<Json<PostDto>> {
    ensure_editable(&state, &auth, id).await?;
    let Json(dto) = payload?;
    dto.validate()?;
    let req = UpdatePostRequest::replace(dto.title, dto.content);

    apply_update(&state, &auth, id, req).await
}

#[utoipa::path(
    patch,
    path = "/api/posts/{id}/",
    tag = "posts",
    security(
        ("bearer_auth" = [])
    ),
    params(
        ("id" = i64, Path, description = "Post id")
    ),
    request_body = PatchPostDto,
    responses(
        (status = 200, description = "Post updated", body = PostDto),
        (status = 400, description = "Validation error", body = ErrorBody),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 403, description = "Forbidden when ownership is enforced", body = ErrorBody),
        (status = 404, description = "Post not found", body = ErrorBody),
        (status = 500, description = "Internal error", body = ErrorBody)
    )
)]
pub(crate) async fn patch_post(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(id): Path<i64>,
    payload: Result<Json<PatchPostDto>, JsonRejection>,
) -> AppResult<Json<PostDto>> {
    ensure_editable(&state, &auth, id).await?;
    let Json(dto) = payload?;
    dto.validate()?;
    let req = UpdatePostRequest {
        title: dto.title,
        content: dto.content,
    };

    apply_update(&state, &auth, id, req).await
}

/// A missing post or a denied edit wins over a malformed body.
async fn ensure_editable(state: &AppState, auth: &AuthenticatedUser, id: i64) -> AppResult<()> {
    state
        .blog_service
        .editable_post(auth.user_id, id, state.config.api_edit_policy)
        .await?;
    Ok(())
}

async fn apply_update(
    state: &AppState,
    auth: &AuthenticatedUser,
    id: i64,
    req: UpdatePostRequest,
) -> AppResult<Json<PostDto>> {
    state
        .blog_service
        .update_post(auth.user_id, id, req, state.config.api_edit_policy)
        .await?;
    let details = state.blog_service.get_post_details(id).await?;
    Ok(Json(PostDto::from(details)))
}

#[utoipa::path(
    delete,
    path = "/api/posts/{id}/",
    tag = "posts",
    security(
        ("bearer_auth" = [])
    ),
    params(
        ("id" = i64, Path, description = "Post id")
    ),
    responses(
        (status = 204, description = "Post and its comments deleted"),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 403, description = "Forbidden when ownership is enforced", body = ErrorBody),
        (status = 404, description = "Post not found", body = ErrorBody),
        (status = 500, description = "Internal error", body = ErrorBody)
    )
)]
pub(crate) async fn delete_post(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    state
        .blog_service
        .delete_post(auth.user_id, id, state.config.api_edit_policy)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
