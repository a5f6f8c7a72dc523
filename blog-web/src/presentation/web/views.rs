use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::application::blog_service::PostPage;
use crate::domain::comment::CommentDetails;
use crate::domain::post::PostDetails;
use crate::domain::user::User;
use crate::presentation::session::AuthenticatedUser;

const DATE_FORMAT: &str = "%B %-d, %Y %H:%M";

fn display_date(value: DateTime<Utc>) -> String {
    value.format(DATE_FORMAT).to_string()
}

#[derive(Debug, Serialize)]
pub(crate) struct CommentView {
    id: i64,
    content: String,
    author: String,
    created_at: String,
    can_delete: bool,
}

impl CommentView {
    fn new(
        details: CommentDetails,
        post_author_id: i64,
        viewer: Option<&AuthenticatedUser>,
    ) -> Self {
        let can_delete = viewer.is_some_and(|viewer| {
            details
                .comment
                .can_be_deleted_by(viewer.user_id, post_author_id)
        });
        Self {
            id: details.comment.id,
            content: details.comment.content,
            author: details.author.username,
            created_at: display_date(details.comment.created_at),
            can_delete,
        }
    }
}

/// A post as the templates see it, with permission flags for the viewer.
#[derive(Debug, Serialize)]
pub(crate) struct PostView {
    id: i64,
    title: String,
    content: String,
    author: String,
    created_at: String,
    updated_at: String,
    comments_count: usize,
    comments: Vec<CommentView>,
    can_edit: bool,
}

impl PostView {
    pub(crate) fn new(details: PostDetails, viewer: Option<&AuthenticatedUser>) -> Self {
        let comments_count = details.comments_count();
        let post_author_id = details.post.author_id;
        Self {
            id: details.post.id,
            can_edit: viewer.is_some_and(|viewer| details.post.is_authored_by(viewer.user_id)),
            title: details.post.title,
            content: details.post.content,
            author: details.author.username,
            created_at: display_date(details.post.created_at),
            updated_at: display_date(details.post.updated_at),
            comments_count,
            comments: details
                .comments
                .into_iter()
                .map(|comment| CommentView::new(comment, post_author_id, viewer))
                .collect(),
        }
    }

    pub(crate) fn list(posts: Vec<PostDetails>, viewer: Option<&AuthenticatedUser>) -> Vec<Self> {
        posts
            .into_iter()
            .map(|details| Self::new(details, viewer))
            .collect()
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct PageView {
    number: u32,
    num_pages: u32,
    total: i64,
    has_previous: bool,
    has_next: bool,
    previous: u32,
    next: u32,
}

impl From<&PostPage> for PageView {
    fn from(page: &PostPage) -> Self {
        Self {
            number: page.page,
            num_pages: page.num_pages,
            total: page.total,
            has_previous: page.has_previous(),
            has_next: page.has_next(),
            previous: page.page.saturating_sub(1),
            next: page.page.saturating_add(1),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ProfileView {
    username: String,
    email: String,
    date_joined: String,
}

impl From<User> for ProfileView {
    fn from(user: User) -> Self {
        Self {
            username: user.username,
            email: user.email,
            date_joined: display_date(user.created_at),
        }
    }
}
