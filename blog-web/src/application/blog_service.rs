use std::collections::HashMap;

use tracing::{info, warn};

use crate::data::comment_repository::{CommentRepository, NewComment};
use crate::data::post_repository::{NewPost, Pagination, PostPatch, PostRepository};
use crate::data::user_repository::UserRepository;
use crate::domain::comment::{Comment, CommentDetails, CreateCommentRequest};
use crate::domain::error::DomainError;
use crate::domain::post::{CreatePostRequest, Post, PostDetails, UpdatePostRequest};
use crate::domain::user::User;

/// Who may change or delete a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EditPolicy {
    AuthorOnly,
    AnyAuthenticated,
}

#[derive(Debug, Clone)]
pub(crate) struct PostPage {
    pub(crate) posts: Vec<PostDetails>,
    pub(crate) page: u32,
    pub(crate) total: i64,
    pub(crate) num_pages: u32,
}

impl PostPage {
    pub(crate) fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub(crate) fn has_next(&self) -> bool {
        self.page < self.num_pages
    }
}

/// A requested listing page: a 1-based number, or whichever page is last.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PageNumber {
    Number(u32),
    Last,
}

/// Outcome of a comment deletion attempt. Both variants carry the post id so
/// callers can return to the post either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CommentDeletion {
    Deleted { post_id: i64 },
    Denied { post_id: i64 },
}

impl CommentDeletion {
    pub(crate) fn post_id(&self) -> i64 {
        match self {
            Self::Deleted { post_id } | Self::Denied { post_id } => *post_id,
        }
    }
}

pub(crate) struct BlogService<P, C, U>
where
    P: PostRepository,
    C: CommentRepository,
    U: UserRepository,
{
    posts: P,
    comments: C,
    users: U,
}

impl<P, C, U> BlogService<P, C, U>
where
    P: PostRepository,
    C: CommentRepository,
    U: UserRepository,
{
    pub(crate) fn new(posts: P, comments: C, users: U) -> Self {
        Self {
            posts,
            comments,
            users,
        }
    }

    pub(crate) async fn create_post(
        &self,
        author_id: i64,
        req: CreatePostRequest,
    ) -> Result<Post, DomainError> {
        let req = req.validate()?;

        let post = self
            .posts
            .create_post(NewPost {
                title: req.title,
                content: req.content,
                author_id,
            })
            .await?;

        info!(post_id = post.id, author_id, "post created");
        Ok(post)
    }

    pub(crate) async fn get_post(&self, id: i64) -> Result<Post, DomainError> {
        self.posts
            .get_post(id)
            .await?
            .ok_or_else(|| DomainError::post_not_found(id))
    }

    pub(crate) async fn get_post_details(&self, id: i64) -> Result<PostDetails, DomainError> {
        let post = self.get_post(id).await?;
        let mut details = self.attach_details(vec![post]).await?;
        details
            .pop()
            .ok_or_else(|| DomainError::Unexpected(format!("details missing for post {id}")))
    }

    /// Loads a post the actor is allowed to change under `policy`.
    pub(crate) async fn editable_post(
        &self,
        actor_user_id: i64,
        post_id: i64,
        policy: EditPolicy,
    ) -> Result<Post, DomainError> {
        let post = self.get_post(post_id).await?;
        Self::ensure_can_edit(&post, actor_user_id, policy)?;
        Ok(post)
    }

    /// Ownership is checked before the input is validated.
    pub(crate) async fn update_post(
        &self,
        actor_user_id: i64,
        post_id: i64,
        req: UpdatePostRequest,
        policy: EditPolicy,
    ) -> Result<Post, DomainError> {
        let current = self.editable_post(actor_user_id, post_id, policy).await?;

        let req = req.validate()?;
        let patch = PostPatch {
            title: req.title.unwrap_or(current.title),
            content: req.content.unwrap_or(current.content),
        };

        let post = self
            .posts
            .update_post(post_id, patch)
            .await?
            .ok_or_else(|| DomainError::post_not_found(post_id))?;

        info!(post_id, actor_user_id, "post updated");
        Ok(post)
    }

    pub(crate) async fn delete_post(
        &self,
        actor_user_id: i64,
        post_id: i64,
        policy: EditPolicy,
    ) -> Result<(), DomainError> {
        self.editable_post(actor_user_id, post_id, policy).await?;

        if !self.posts.delete_post(post_id).await? {
            return Err(DomainError::post_not_found(post_id));
        }

        info!(post_id, actor_user_id, "post deleted");
        Ok(())
    }

    /// Page numbers start at 1. A page past the end is not found, except
    /// that the first page of an empty listing exists.
    pub(crate) async fn list_posts_page(
        &self,
        page: PageNumber,
        page_size: u32,
    ) -> Result<PostPage, DomainError> {
        let page_size = page_size.max(1);
        let total = self.posts.total_posts().await?;
        let num_pages = u32::try_from((total.max(0) as u64).div_ceil(u64::from(page_size)))
            .unwrap_or(u32::MAX)
            .max(1);

        let page = match page {
            PageNumber::Number(number) => number,
            PageNumber::Last => num_pages,
        };
        if page == 0 || page > num_pages {
            return Err(DomainError::NotFound(format!("page {page}")));
        }

        let posts = self.posts.list_posts(Pagination { page, page_size }).await?;
        let posts = self.attach_details(posts).await?;

        Ok(PostPage {
            posts,
            page,
            total,
            num_pages,
        })
    }

    pub(crate) async fn list_posts(&self) -> Result<Vec<PostDetails>, DomainError> {
        let posts = self.posts.list_all_posts().await?;
        self.attach_details(posts).await
    }

    pub(crate) async fn list_posts_by_author(
        &self,
        author_id: i64,
    ) -> Result<Vec<PostDetails>, DomainError> {
        let posts = self.posts.list_posts_by_author(author_id).await?;
        self.attach_details(posts).await
    }

    pub(crate) async fn add_comment(
        &self,
        author_id: i64,
        post_id: i64,
        req: CreateCommentRequest,
    ) -> Result<CommentDetails, DomainError> {
        self.get_post(post_id).await?;
        let req = req.validate()?;

        let comment = self
            .comments
            .create_comment(NewComment {
                post_id,
                author_id,
                content: req.content,
            })
            .await?;

        info!(comment_id = comment.id, post_id, author_id, "comment added");
        let mut details = self.attach_comment_authors(vec![comment]).await?;
        details
            .pop()
            .ok_or_else(|| DomainError::Unexpected("comment author missing".to_string()))
    }

    /// The comment author or the post author may delete a comment. Anyone
    /// else gets [`CommentDeletion::Denied`] and the comment stays.
    pub(crate) async fn get_comment(&self, id: i64) -> Result<Comment, DomainError> {
        self.comments
            .get_comment(id)
            .await?
            .ok_or_else(|| DomainError::comment_not_found(id))
    }

    pub(crate) async fn delete_comment(
        &self,
        actor_user_id: i64,
        comment_id: i64,
    ) -> Result<CommentDeletion, DomainError> {
        let comment = self.get_comment(comment_id).await?;
        let post = self.get_post(comment.post_id).await?;

        if !comment.can_be_deleted_by(actor_user_id, post.author_id) {
            warn!(comment_id, actor_user_id, "comment delete denied");
            return Ok(CommentDeletion::Denied { post_id: post.id });
        }

        if !self.comments.delete_comment(comment_id).await? {
            return Err(DomainError::comment_not_found(comment_id));
        }

        info!(comment_id, actor_user_id, "comment deleted");
        Ok(CommentDeletion::Deleted { post_id: post.id })
    }

    /// Comments of a post, oldest first. Unknown posts yield an empty list.
    pub(crate) async fn list_comments(
        &self,
        post_id: i64,
    ) -> Result<Vec<CommentDetails>, DomainError> {
        let comments = self.comments.list_for_post(post_id).await?;
        self.attach_comment_authors(comments).await
    }

    fn ensure_can_edit(
        post: &Post,
        actor_user_id: i64,
        policy: EditPolicy,
    ) -> Result<(), DomainError> {
        if policy == EditPolicy::AuthorOnly && !post.is_authored_by(actor_user_id) {
            warn!(post_id = post.id, actor_user_id, "post edit denied");
            return Err(DomainError::Forbidden);
        }
        Ok(())
    }

    async fn attach_details(&self, posts: Vec<Post>) -> Result<Vec<PostDetails>, DomainError> {
        if posts.is_empty() {
            return Ok(Vec::new());
        }

        let post_ids: Vec<i64> = posts.iter().map(|post| post.id).collect();
        let comments = self.comments.list_for_posts(&post_ids).await?;

        let user_ids = posts
            .iter()
            .map(|post| post.author_id)
            .chain(comments.iter().map(|comment| comment.author_id));
        let users = self.load_users(user_ids).await?;

        let mut comments_by_post: HashMap<i64, Vec<CommentDetails>> = HashMap::new();
        for comment in comments {
            let author = lookup_user(&users, comment.author_id)?;
            comments_by_post
                .entry(comment.post_id)
                .or_default()
                .push(CommentDetails { comment, author });
        }

        posts
            .into_iter()
            .map(|post| {
                let author = lookup_user(&users, post.author_id)?;
                let comments = comments_by_post.remove(&post.id).unwrap_or_default();
                Ok(PostDetails {
                    post,
                    author,
                    comments,
                })
            })
            .collect()
    }

    async fn attach_comment_authors(
        &self,
        comments: Vec<Comment>,
    ) -> Result<Vec<CommentDetails>, DomainError> {
        let users = self
            .load_users(comments.iter().map(|comment| comment.author_id))
            .await?;

        comments
            .into_iter()
            .map(|comment| {
                let author = lookup_user(&users, comment.author_id)?;
                Ok(CommentDetails { comment, author })
            })
            .collect()
    }

    async fn load_users(
        &self,
        ids: impl Iterator<Item = i64>,
    ) -> Result<HashMap<i64, User>, DomainError> {
        let mut ids: Vec<i64> = ids.collect();
        ids.sort_unstable();
        ids.dedup();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        Ok(self
            .users
            .find_by_ids(&ids)
            .await?
            .into_iter()
            .map(|user| (user.id, user))
            .collect())
    }
}

fn lookup_user(users: &HashMap<i64, User>, id: i64) -> Result<User, DomainError> {
    users
        .get(&id)
        .cloned()
        .ok_or_else(|| DomainError::Unexpected(format!("user {id} referenced but missing")))
}
