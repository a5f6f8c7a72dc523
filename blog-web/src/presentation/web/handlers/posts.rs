use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use tera::Context;
use tower_cookies::Cookies;
use validator::Validate;

use crate::application::blog_service::{EditPolicy, PageNumber};
use crate::domain::error::DomainError;
use crate::domain::post::{CreatePostRequest, Post, UpdatePostRequest};
use crate::presentation::AppState;
use crate::presentation::field_errors::FieldErrors;
use crate::presentation::session::{AuthenticatedUser, CurrentUser, LoginRequired};
use crate::presentation::web::error::{PageError, PageResult};
use crate::presentation::web::flash::{FlashLevel, push_flash};
use crate::presentation::web::forms::{CommentForm, PageQuery, PostForm};
use crate::presentation::web::render::render;
use crate::presentation::web::views::{PageView, PostView};

pub(crate) fn detail_url(post_id: i64) -> String {
    format!("/post/{post_id}/")
}

fn parse_page(raw: Option<&str>) -> Result<PageNumber, DomainError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(PageNumber::Number(1)),
        Some("last") => Ok(PageNumber::Last),
        Some(raw) => raw
            .parse()
            .map(PageNumber::Number)
            .map_err(|_| DomainError::NotFound(format!("page {raw}"))),
    }
}

pub(crate) async fn post_list(
    State(state): State<AppState>,
    CurrentUser(viewer): CurrentUser,
    cookies: Cookies,
    Query(query): Query<PageQuery>,
) -> PageResult<Response> {
    let page = parse_page(query.page.as_deref())?;
    let page = state
        .blog_service
        .list_posts_page(page, state.config.posts_per_page)
        .await?;

    let mut context = Context::new();
    context.insert("page", &PageView::from(&page));
    context.insert("posts", &PostView::list(page.posts, viewer.as_ref()));

    Ok(render(&state, &cookies, viewer.as_ref(), "post_list.html", context)?.into_response())
}

pub(crate) async fn post_detail(
    State(state): State<AppState>,
    CurrentUser(viewer): CurrentUser,
    cookies: Cookies,
    Path(id): Path<i64>,
) -> PageResult<Response> {
    let details = state.blog_service.get_post_details(id).await?;

    let mut context = Context::new();
    context.insert("post", &PostView::new(details, viewer.as_ref()));
    context.insert("comment_form", &CommentForm::default());

    Ok(render(&state, &cookies, viewer.as_ref(), "post_detail.html", context)?.into_response())
}

fn render_post_form(
    state: &AppState,
    cookies: &Cookies,
    viewer: &AuthenticatedUser,
    form: &PostForm,
    errors: &FieldErrors,
    post_id: Option<i64>,
) -> PageResult<Response> {
    let mut context = Context::new();
    context.insert("form", form);
    context.insert("errors", errors);
    context.insert("post_id", &post_id);
    Ok(render(state, cookies, Some(viewer), "post_form.html", context)?.into_response())
}

fn form_errors(err: DomainError) -> PageResult<FieldErrors> {
    FieldErrors::from_domain(&err).ok_or(PageError::Domain(err))
}

pub(crate) async fn post_new_form(
    State(state): State<AppState>,
    LoginRequired(user): LoginRequired,
    cookies: Cookies,
) -> PageResult<Response> {
    render_post_form(
        &state,
        &cookies,
        &user,
        &PostForm::default(),
        &FieldErrors::default(),
        None,
    )
}

pub(crate) async fn post_create(
    State(state): State<AppState>,
    LoginRequired(user): LoginRequired,
    cookies: Cookies,
    Form(form): Form<PostForm>,
) -> PageResult<Response> {
    if let Err(errors) = form.validate() {
        return render_post_form(&state, &cookies, &user, &form, &FieldErrors::from(&errors), None);
    }

    let req = CreatePostRequest {
        title: form.title.clone(),
        content: form.content.clone(),
    };
    match state.blog_service.create_post(user.user_id, req).await {
        Ok(post) => {
            push_flash(&cookies, FlashLevel::Success, "Post created!");
            Ok(Redirect::to(&detail_url(post.id)).into_response())
        }
        Err(err) => {
            let errors = form_errors(err)?;
            render_post_form(&state, &cookies, &user, &form, &errors, None)
        }
    }
}

/// Loads the post and bounces non-authors back to it with a notice.
async fn owned_post(
    state: &AppState,
    cookies: &Cookies,
    user: &AuthenticatedUser,
    post_id: i64,
    denial: &'static str,
) -> PageResult<Result<Post, Response>> {
    let post = state.blog_service.get_post(post_id).await?;
    if post.is_authored_by(user.user_id) {
        return Ok(Ok(post));
    }
    push_flash(cookies, FlashLevel::Error, denial);
    Ok(Err(Redirect::to(&detail_url(post_id)).into_response()))
}

const EDIT_DENIED: &str = "You can only edit your own posts.";
const DELETE_DENIED: &str = "You can only delete your own posts.";

pub(crate) async fn post_update_form(
    State(state): State<AppState>,
    LoginRequired(user): LoginRequired,
    cookies: Cookies,
    Path(id): Path<i64>,
) -> PageResult<Response> {
    let post = match owned_post(&state, &cookies, &user, id, EDIT_DENIED).await? {
        Ok(post) => post,
        Err(redirect) => return Ok(redirect),
    };

    let form = PostForm {
        title: post.title,
        content: post.content,
    };
    render_post_form(&state, &cookies, &user, &form, &FieldErrors::default(), Some(id))
}

pub(crate) async fn post_update(
    State(state): State<AppState>,
    LoginRequired(user): LoginRequired,
    cookies: Cookies,
    Path(id): Path<i64>,
    Form(form): Form<PostForm>,
) -> PageResult<Response> {
    if let Err(redirect) = owned_post(&state, &cookies, &user, id, EDIT_DENIED).await? {
        return Ok(redirect);
    }
    if let Err(errors) = form.validate() {
        let errors = FieldErrors::from(&errors);
        return render_post_form(&state, &cookies, &user, &form, &errors, Some(id));
    }

    let req = UpdatePostRequest::replace(form.title.clone(), form.content.clone());
    match state
        .blog_service
        .update_post(user.user_id, id, req, EditPolicy::AuthorOnly)
        .await
    {
        Ok(post) => {
            push_flash(&cookies, FlashLevel::Success, "Post updated!");
            Ok(Redirect::to(&detail_url(post.id)).into_response())
        }
        Err(DomainError::Forbidden) => {
            push_flash(&cookies, FlashLevel::Error, EDIT_DENIED);
            Ok(Redirect::to(&detail_url(id)).into_response())
        }
        Err(err) => {
            let errors = form_errors(err)?;
            render_post_form(&state, &cookies, &user, &form, &errors, Some(id))
        }
    }
}

pub(crate) async fn post_delete_confirm(
    State(state): State<AppState>,
    LoginRequired(user): LoginRequired,
    cookies: Cookies,
    Path(id): Path<i64>,
) -> PageResult<Response> {
    if let Err(redirect) = owned_post(&state, &cookies, &user, id, DELETE_DENIED).await? {
        return Ok(redirect);
    }
    let details = state.blog_service.get_post_details(id).await?;

    let mut context = Context::new();
    context.insert("post", &PostView::new(details, Some(&user)));
    Ok(render(&state, &cookies, Some(&user), "post_confirm_delete.html", context)?.into_response())
}

pub(crate) async fn post_delete(
    State(state): State<AppState>,
    LoginRequired(user): LoginRequired,
    cookies: Cookies,
    Path(id): Path<i64>,
) -> PageResult<Response> {
    match state
        .blog_service
        .delete_post(user.user_id, id, EditPolicy::AuthorOnly)
        .await
    {
        Ok(()) => {
            push_flash(&cookies, FlashLevel::Success, "Post deleted!");
            Ok(Redirect::to("/").into_response())
        }
        Err(DomainError::Forbidden) => {
            push_flash(&cookies, FlashLevel::Error, DELETE_DENIED);
            Ok(Redirect::to(&detail_url(id)).into_response())
        }
        Err(err) => Err(err.into()),
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use chrono::{Duration, Utc};
    use serde_json::json;

    use super::parse_page;
    use crate::application::blog_service::PageNumber;
    use crate::data::repositories::memory::MemoryStore;
    use crate::presentation::testing::{
        app, body_json, body_string, form_post, get, json_request, location, register, send,
        set_cookies,
    };

    #[test]
    fn parse_page_defaults_to_first_page() {
        assert_eq!(parse_page(None).expect("valid"), PageNumber::Number(1));
        assert_eq!(parse_page(Some("3")).expect("valid"), PageNumber::Number(3));
        assert_eq!(parse_page(Some("last")).expect("valid"), PageNumber::Last);
        assert!(parse_page(Some("abc")).is_err());
        assert!(parse_page(Some("-1")).is_err());
    }

    #[tokio::test]
    async fn list_is_paginated_newest_first() {
        let store = MemoryStore::new();
        let app = app(&store);
        let (alice_id, _) = register(&app, "alice").await;
        let start = Utc::now() - Duration::hours(1);
        for i in 0..7 {
            store.insert_post_at(alice_id, &format!("Post {i}"), start + Duration::minutes(i));
        }

        let first = body_string(send(&app, get("/", None)).await).await;
        assert!(first.contains("Post 6"));
        assert!(first.contains("Post 2"));
        assert!(!first.contains("Post 1"));
        assert!(!first.contains("Post 0"));
        let newest = first.find("Post 6").expect("newest listed");
        assert!(newest < first.find("Post 5").expect("listed"));

        let second = send(&app, get("/?page=2", None)).await;
        assert_eq!(second.status(), StatusCode::OK);
        let second = body_string(second).await;
        assert!(second.contains("Post 1"));
        assert!(second.contains("Post 0"));

        let last = send(&app, get("/?page=last", None)).await;
        assert_eq!(last.status(), StatusCode::OK);
        let last = body_string(last).await;
        assert!(last.contains("Post 0"));
        assert!(!last.contains("Post 6"));

        assert_eq!(send(&app, get("/?page=3", None)).await.status(), StatusCode::NOT_FOUND);
        assert_eq!(send(&app, get("/?page=abc", None)).await.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn empty_list_renders_first_page() {
        let store = MemoryStore::new();
        let app = app(&store);

        let response = send(&app, get("/", None)).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn missing_post_is_not_found() {
        let store = MemoryStore::new();
        let app = app(&store);

        let response = send(&app, get("/post/42/", None)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn anonymous_create_redirects_to_login() {
        let store = MemoryStore::new();
        let app = app(&store);

        let response = send(&app, get("/post/new/", None)).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/login/?next=/post/new/");

        let response = send(&app, form_post("/post/new/", None, "title=a&content=b")).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(store.post_count(), 0);
    }

    #[tokio::test]
    async fn create_redirects_to_detail_with_notice() {
        let store = MemoryStore::new();
        let app = app(&store);
        let (_, alice) = register(&app, "alice").await;

        let response = send(
            &app,
            form_post("/post/new/", Some(&alice), "title=Hello&content=World"),
        )
        .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert!(location(&response).starts_with("/post/"));
        assert!(set_cookies(&response).contains("Post created!"));

        let detail = body_string(send(&app, get(location(&response), Some(&alice))).await).await;
        assert!(detail.contains("Hello"));
        assert!(detail.contains("World"));
    }

    #[tokio::test]
    async fn invalid_create_rerenders_form_with_errors() {
        let store = MemoryStore::new();
        let app = app(&store);
        let (_, alice) = register(&app, "alice").await;

        let response = send(
            &app,
            form_post("/post/new/", Some(&alice), "title=&content=Body+kept"),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_string(response).await;
        assert!(body.contains("200 characters or fewer"));
        assert!(body.contains("Body kept"));
        assert_eq!(store.post_count(), 0);
    }

    #[tokio::test]
    async fn non_author_update_is_bounced_and_post_unchanged() {
        let store = MemoryStore::new();
        let app = app(&store);
        let (alice_id, _) = register(&app, "alice").await;
        let (_, bob) = register(&app, "bob").await;
        let post = store.insert_post_at(alice_id, "Hello", Utc::now());
        let uri = format!("/post/{}/update/", post.id);

        let form = send(&app, get(&uri, Some(&bob))).await;
        assert_eq!(form.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&form), format!("/post/{}/", post.id));

        let response = send(
            &app,
            form_post(&uri, Some(&bob), "title=Hijacked&content=Nope"),
        )
        .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), format!("/post/{}/", post.id));
        assert!(set_cookies(&response).contains("You can only edit your own posts."));

        let api = body_json(send(&app, get(&format!("/api/posts/{}/", post.id), None)).await).await;
        assert_eq!(api["title"], "Hello");
        assert_eq!(api["content"], "Hello body");
    }

    #[tokio::test]
    async fn author_update_changes_post() {
        let store = MemoryStore::new();
        let app = app(&store);
        let (_, alice) = register(&app, "alice").await;
        let created = body_json(
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
        let id = created["id"].as_i64().expect("post id");

        let form = send(&app, get(&format!("/post/{id}/update/"), Some(&alice))).await;
        assert_eq!(form.status(), StatusCode::OK);
        assert!(body_string(form).await.contains("World"));

        let response = send(
            &app,
            form_post(
                &format!("/post/{id}/update/"),
                Some(&alice),
                "title=Hello+again&content=Updated",
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert!(set_cookies(&response).contains("Post updated!"));

        let api = body_json(send(&app, get(&format!("/api/posts/{id}/"), None)).await).await;
        assert_eq!(api["title"], "Hello again");
        assert_eq!(api["content"], "Updated");
    }

    #[tokio::test]
    async fn delete_requires_confirmation_and_ownership() {
        let store = MemoryStore::new();
        let app = app(&store);
        let (alice_id, alice) = register(&app, "alice").await;
        let (bob_id, bob) = register(&app, "bob").await;
        let post = store.insert_post_at(alice_id, "Hello", Utc::now());
        store.insert_comment_at(post.id, bob_id, "Nice!", Utc::now());
        let uri = format!("/post/{}/delete/", post.id);

        let confirm = send(&app, get(&uri, Some(&alice))).await;
        assert_eq!(confirm.status(), StatusCode::OK);
        assert!(body_string(confirm).await.contains("Hello"));

        let denied = send(&app, form_post(&uri, Some(&bob), "")).await;
        assert_eq!(denied.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&denied), format!("/post/{}/", post.id));
        assert!(set_cookies(&denied).contains("You can only delete your own posts."));
        assert_eq!(store.post_count(), 1);

        let deleted = send(&app, form_post(&uri, Some(&alice), "")).await;
        assert_eq!(deleted.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&deleted), "/");
        assert!(set_cookies(&deleted).contains("Post deleted!"));
        assert_eq!(store.post_count(), 0);
        assert_eq!(store.comment_count(), 0);
    }
}
