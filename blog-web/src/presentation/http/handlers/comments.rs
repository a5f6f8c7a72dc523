use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::domain::comment::{CommentDetails, CreateCommentRequest};
use crate::presentation::AppState;
use crate::presentation::http::app_error::{AppResult, ErrorBody};
use crate::presentation::http::handlers::auth::UserDto;
use crate::presentation::session::AuthenticatedUser;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub(crate) struct CreateCommentDto {
    #[serde(default)]
    #[validate(length(min = 1, message = "this field is required"))]
    pub(crate) content: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct CommentDto {
    pub(crate) id: i64,
    pub(crate) content: String,
    pub(crate) author: UserDto,
    pub(crate) created_at: DateTime<Utc>,
}

impl From<CommentDetails> for CommentDto {
    fn from(details: CommentDetails) -> Self {
        Self {
            id: details.comment.id,
            content: details.comment.content,
            author: details.author.into(),
            created_at: details.comment.created_at,
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/posts/{id}/comments/",
    tag = "comments",
    params(
        ("id" = i64, Path, description = "Post id")
    ),
    responses(
        (status = 200, description = "Comments, oldest first; empty for unknown posts", body = Vec<CommentDto>),
        (status = 500, description = "Internal error", body = ErrorBody)
    )
)]
pub(crate) async fn list_comments(
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
) -> AppResult<Json<Vec<CommentDto>>> {
    let comments = state.blog_service.list_comments(post_id).await?;
    Ok(Json(comments.into_iter().map(CommentDto::from).collect()))
}

#[utoipa::path(
    post,
    path = "/api/posts/{id}/comments/",
    tag = "comments",
    security(
        ("bearer_auth" = [])
    ),
    params(
        ("id" = i64, Path, description = "Post id")
    ),
    request_body = CreateCommentDto,
    responses(
        (status = 201, description = "Comment created", body = CommentDto),
        (status = 400, description = "Validation error", body = ErrorBody),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 404, description = "Post not found", body = ErrorBody),
        (status = 500, description = "Internal error", body = ErrorBody)
    )
)]
pub(crate) async fn create_comment(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(post_id): Path<i64>,
    payload: Result<Json<CreateCommentDto>, JsonRejection>,
) -> AppResult<(StatusCode, Json<CommentDto>)> {
    let Json(dto) = payload?;
    dto.validate()?;

    let comment = state
        .blog_service
        .add_comment(
            auth.user_id,
            post_id,
            CreateCommentRequest {
                content: dto.content,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(CommentDto::from(comment))))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::data::repositories::memory::MemoryStore;
    use crate::presentation::testing::{app, body_json, get, json_request, register, send};

    #[tokio::test]
    async fn comment_appears_nested_in_post() {
        let store = MemoryStore::new();
        let app = app(&store);
        let (_, alice) = register(&app, "alice").await;
        let (_, bob) = register(&app, "bob").await;

        let post = body_json(
            send(
                &app,
                json_request(
                    "POST",
                    "/api/posts/",
                    Some(&alice),
                    json!({"title": "Hello", "content": "World"}),
                ),
            )
            .await,
        )
        .await;
        let post_id = post["id"].as_i64().expect("post id");

        let created = send(
            &app,
            json_request(
                "POST",
                &format!("/api/posts/{post_id}/comments/"),
                Some(&bob),
                json!({"content": "Nice!"}),
            ),
        )
        .await;
        assert_eq!(created.status(), StatusCode::CREATED);
        let comment = body_json(created).await;
        assert_eq!(comment["author"]["username"], "bob");

        let detail = send(&app, get(&format!("/api/posts/{post_id}/"), None)).await;
        let detail = body_json(detail).await;
        assert_eq!(detail["comments_count"], 1);
        assert_eq!(detail["comments"][0]["content"], "Nice!");
        assert_eq!(detail["comments"][0]["author"]["username"], "bob");

        let listed =
            body_json(send(&app, get(&format!("/api/posts/{post_id}/comments/"), None)).await)
                .await;
        assert_eq!(listed.as_array().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn comments_of_unknown_post_are_empty() {
        let store = MemoryStore::new();
        let app = app(&store);

        let response = send(&app, get("/api/posts/999/comments/", None)).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!([]));
    }

    #[tokio::test]
    async fn commenting_on_unknown_post_is_not_found() {
        let store = MemoryStore::new();
        let app = app(&store);
        let (_, bob) = register(&app, "bob").await;

        let response = send(
            &app,
            json_request(
                "POST",
                "/api/posts/999/comments/",
                Some(&bob),
                json!({"content": "Nice!"}),
            ),
        )
        .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(store.comment_count(), 0);
    }

    #[tokio::test]
    async fn blank_comment_is_rejected() {
        let store = MemoryStore::new();
        let app = app(&store);
        let (_, alice) = register(&app, "alice").await;
        let post = store.insert_post_at(1, "Hello", chrono::Utc::now());

        let response = send(
            &app,
            json_request(
                "POST",
                &format!("/api/posts/{}/comments/", post.id),
                Some(&alice),
                json!({"content": "   "}),
            ),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["fields"]["content"].is_array());
    }
}
